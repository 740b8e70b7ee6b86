// ==========================================
// 设备维修工单系统 - 应用层
// ==========================================
// 职责: 组合根 (连接 → 仓储 → 引擎 → API)
// ==========================================

pub mod state;

pub use state::AppState;
