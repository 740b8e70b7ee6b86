// ==========================================
// 设备维修工单系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键与默认值
// ==========================================

/// 工单编号前缀 (如 CMP000001)
pub const KEY_TICKET_CODE_PREFIX: &str = "ticket/code_prefix";
pub const DEFAULT_TICKET_CODE_PREFIX: &str = "CMP";

/// 工单编号序号位数
pub const KEY_TICKET_CODE_PAD_WIDTH: &str = "ticket/code_pad_width";
pub const DEFAULT_TICKET_CODE_PAD_WIDTH: i64 = 6;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值（INSERT OR REPLACE）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;

        Ok(())
    }

    /// 工单编号前缀
    pub fn ticket_code_prefix(&self) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(KEY_TICKET_CODE_PREFIX)?
            .unwrap_or_else(|| DEFAULT_TICKET_CODE_PREFIX.to_string()))
    }

    /// 工单编号序号位数
    pub fn ticket_code_pad_width(&self) -> Result<i64, Box<dyn Error>> {
        match self.get_config_value(KEY_TICKET_CODE_PAD_WIDTH)? {
            Some(v) => Ok(v.trim().parse::<i64>()?),
            None => Ok(DEFAULT_TICKET_CODE_PAD_WIDTH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = setup();
        assert_eq!(cfg.ticket_code_prefix().unwrap(), "CMP");
        assert_eq!(cfg.ticket_code_pad_width().unwrap(), 6);
    }

    #[test]
    fn test_set_then_get() {
        let cfg = setup();
        cfg.set_config_value(KEY_TICKET_CODE_PREFIX, "WR").unwrap();
        cfg.set_config_value(KEY_TICKET_CODE_PAD_WIDTH, "4").unwrap();
        assert_eq!(cfg.ticket_code_prefix().unwrap(), "WR");
        assert_eq!(cfg.ticket_code_pad_width().unwrap(), 4);
        // 覆写
        cfg.set_config_value(KEY_TICKET_CODE_PREFIX, "CMP").unwrap();
        assert_eq!(cfg.ticket_code_prefix().unwrap(), "CMP");
    }
}
