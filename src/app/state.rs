// ==========================================
// 设备维修工单系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有仓储/引擎共享同一个连接, 保证工单与台账
//       写入在同一事务内提交
// ==========================================

use std::sync::{Arc, Mutex};

use anyhow::Context;

use crate::api::{PartApi, TicketApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::LifecycleEngine;
use crate::repository::{PartRepository, TicketRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 工单API
    pub ticket_api: Arc<TicketApi>,

    /// 备件API
    pub part_api: Arc<PartApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 初始化应用状态
    ///
    /// # 参数
    /// - db_path: 数据库文件路径 (不存在时自动建库建表)
    pub fn new(db_path: &str) -> anyhow::Result<Self> {
        let conn = open_sqlite_connection(db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        init_schema(&conn).context("数据库建表失败")?;

        let conn = Arc::new(Mutex::new(conn));

        let ticket_repo = Arc::new(TicketRepository::new(conn.clone()));
        let part_repo = Arc::new(PartRepository::new(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| anyhow::anyhow!("配置管理器初始化失败: {}", e))?,
        );

        let lifecycle = Arc::new(LifecycleEngine::new(conn.clone(), config_manager.clone()));

        let ticket_api = Arc::new(TicketApi::new(ticket_repo, lifecycle));
        let part_api = Arc::new(PartApi::new(part_repo));

        Ok(Self {
            db_path: db_path.to_string(),
            ticket_api,
            part_api,
            config_manager,
        })
    }
}
