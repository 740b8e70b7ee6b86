// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

use maintenance_ticket::app::AppState;
use maintenance_ticket::db::{init_schema, open_sqlite_connection};
use maintenance_ticket::domain::part::{Part, PartDraft};
use maintenance_ticket::domain::ticket::TicketDraft;
use maintenance_ticket::domain::types::Category;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建测试环境 (临时库 + 应用状态)
pub fn setup_app() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(&db_path).unwrap();
    (temp_file, state)
}

/// 创建测试备件并返回
pub fn create_test_part(state: &AppState, code: &str, stock: i64) -> Part {
    state
        .part_api
        .create_part(PartDraft {
            code: code.to_string(),
            name: format!("测试备件-{}", code),
            description: None,
            initial_stock: stock,
        })
        .unwrap()
}

/// 创建测试工单输入
pub fn ticket_draft(subject: &str) -> TicketDraft {
    TicketDraft {
        subject: subject.to_string(),
        description: Some("测试用故障描述".to_string()),
        equipment_code: "EQ-01".to_string(),
        area_code: Some("A1".to_string()),
        reporter: Some("张工".to_string()),
        assignee: None,
        priority: None,
        category: Category::Mechanical,
    }
}

/// 查询备件当前库存
pub fn stock_of(state: &AppState, part_id: &str) -> i64 {
    state.part_api.get_part(part_id).unwrap().stock_quantity
}
