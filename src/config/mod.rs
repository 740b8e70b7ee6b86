// ==========================================
// 设备维修工单系统 - 配置层
// ==========================================
// 职责: 系统配置读写 (config_kv 表)
// ==========================================

pub mod config_manager;

pub use config_manager::{
    ConfigManager, KEY_TICKET_CODE_PAD_WIDTH, KEY_TICKET_CODE_PREFIX,
};
