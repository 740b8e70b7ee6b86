// ==========================================
// 设备维修工单系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一建表入口，测试与生产走同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 表结构:
/// - parts: 备件库存 (stock_quantity 带 CHECK >= 0 兜底, 业务层仍不依赖该兜底)
/// - tickets: 工单 (revision 列用于乐观锁)
/// - ticket_parts: 备件行项 ((ticket_id, part_id) 联合主键)
/// - config_kv: 配置键值
/// - schema_version: schema 版本标记
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS parts (
            id             TEXT PRIMARY KEY,
            code           TEXT NOT NULL UNIQUE,
            name           TEXT NOT NULL,
            description    TEXT,
            stock_quantity INTEGER NOT NULL DEFAULT 0 CHECK (stock_quantity >= 0),
            updated_at     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tickets (
            id                 TEXT PRIMARY KEY,
            code               TEXT NOT NULL UNIQUE,
            subject            TEXT NOT NULL,
            description        TEXT,
            equipment_code     TEXT NOT NULL,
            area_code          TEXT,
            reporter           TEXT,
            assignee           TEXT,
            action_taken       TEXT,
            priority           TEXT NOT NULL,
            category           TEXT NOT NULL,
            status             TEXT NOT NULL,
            report_date        TEXT NOT NULL,
            updated_at         TEXT NOT NULL,
            close_time         TEXT,
            resolution_minutes INTEGER,
            revision           INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);

        CREATE TABLE IF NOT EXISTS ticket_parts (
            ticket_id TEXT NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
            part_id   TEXT NOT NULL REFERENCES parts(id),
            quantity  INTEGER NOT NULL CHECK (quantity > 0),
            PRIMARY KEY (ticket_id, part_id)
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })?;
    Ok(v)
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 MAINTENANCE_TICKET_DB_PATH 优先（便于调试/测试/CI）
/// - 其次: 用户数据目录/maintenance-ticket/maintenance_ticket.db
/// - 兜底: ./maintenance_ticket.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("MAINTENANCE_TICKET_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./maintenance_ticket.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("maintenance-ticket");
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("maintenance_ticket.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(1));
    }

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }
}
