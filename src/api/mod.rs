// ==========================================
// 设备维修工单系统 - API 层
// ==========================================
// 职责: 对外业务接口 (供 HTTP/CRUD 外层消费)
// ==========================================

pub mod error;
pub mod part_api;
pub mod ticket_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult, FieldError};
pub use part_api::PartApi;
pub use ticket_api::{TicketApi, TicketDetail};
