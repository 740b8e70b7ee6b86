// ==========================================
// 设备维修工单系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: 工单状态写入与库存写入要么一起提交, 要么一起回滚
// ==========================================

pub mod ledger;
pub mod lifecycle;
pub mod resolution;

// 重导出核心引擎
pub use ledger::{InventoryLedger, LedgerError};
pub use lifecycle::{LifecycleEngine, LifecycleError, LifecycleResult};
pub use resolution::{
    compute_resolution_minutes, format_resolution_minutes, ResolutionTimeError,
};
