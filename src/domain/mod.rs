// ==========================================
// 设备维修工单系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod part;
pub mod ticket;
pub mod types;

// 重导出核心类型
pub use part::{Part, PartDraft};
pub use ticket::{LineItem, Ticket, TicketDraft};
pub use types::{Category, Priority, TicketStatus};
