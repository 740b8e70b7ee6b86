// ==========================================
// 设备维修工单系统 - 主入口
// ==========================================
// 职责: 初始化日志与数据库, 打印启动信息
// 说明: 对外的 HTTP/CRUD 层由外部集成, 本入口仅做本地自检
// ==========================================

use maintenance_ticket::app::AppState;
use maintenance_ticket::db::get_default_db_path;

fn main() {
    maintenance_ticket::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", maintenance_ticket::APP_NAME);
    tracing::info!("系统版本: {}", maintenance_ticket::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    match AppState::new(&db_path) {
        Ok(state) => {
            let open_count = state
                .ticket_api
                .list_tickets_by_status(maintenance_ticket::TicketStatus::Open)
                .map(|v| v.len())
                .unwrap_or(0);
            tracing::info!("初始化完成, 当前 OPEN 工单数: {}", open_count);
        }
        Err(e) => {
            tracing::error!("初始化失败: {:#}", e);
            std::process::exit(1);
        }
    }
}
