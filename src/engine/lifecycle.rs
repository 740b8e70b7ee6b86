// ==========================================
// 设备维修工单系统 - 工单生命周期引擎
// ==========================================
// 职责: 状态机校验、关单扣减、重开回补、行项维护
// 约束: 每个触碰工单+台账的操作是一个原子单元,
//       失败时工单状态与库存都保持调用前原值
// ==========================================

use crate::config::ConfigManager;
use crate::domain::ticket::{LineItem, Ticket, TicketDraft};
use crate::domain::types::TicketStatus;
use crate::engine::ledger::{InventoryLedger, LedgerError};
use crate::engine::resolution::{compute_resolution_minutes, ResolutionTimeError};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::part_repo::PartRepository;
use crate::repository::ticket_repo::TicketRepository;
use chrono::{NaiveDateTime, Timelike, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

// ==========================================
// 生命周期错误
// ==========================================

/// 生命周期引擎错误
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("工单不存在: {id}")]
    TicketNotFound { id: String },

    #[error("备件不存在: {id}")]
    PartNotFound { id: String },

    #[error("行项不存在: ticket_id={ticket_id}, part_id={part_id}")]
    LineItemNotFound { ticket_id: String, part_id: String },

    /// 同一备件重复挂到同一工单 (应改为调整已有行项数量)
    #[error("行项已存在: ticket_id={ticket_id}, part_id={part_id}")]
    DuplicateLineItem { ticket_id: String, part_id: String },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    /// 操作要求的前置状态不满足 (如对非 CLOSED 工单 Reopen)
    #[error("无效的工单状态: {message} (当前状态={status})")]
    InvalidState {
        status: TicketStatus,
        message: String,
    },

    #[error("库存不足: part_id={part_id}, requested={requested}, available={available}")]
    InsufficientStock {
        part_id: String,
        requested: i64,
        available: i64,
    },

    #[error("数据验证失败: {0}")]
    Validation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<LedgerError> for LifecycleError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientStock {
                part_id,
                requested,
                available,
            } => LifecycleError::InsufficientStock {
                part_id,
                requested,
                available,
            },
            LedgerError::PartNotFound { part_id } => {
                LifecycleError::PartNotFound { id: part_id }
            }
            LedgerError::Repository(e) => LifecycleError::Repository(e),
        }
    }
}

impl From<ResolutionTimeError> for LifecycleError {
    fn from(err: ResolutionTimeError) -> Self {
        LifecycleError::Validation(err.to_string())
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

// ==========================================
// LifecycleEngine - 生命周期引擎
// ==========================================

/// 工单生命周期引擎
///
/// 持有共享连接并自行开启事务: 工单写入与台账写入
/// 要么一起提交, 要么一起回滚
pub struct LifecycleEngine {
    conn: Arc<Mutex<Connection>>,
    config: Arc<ConfigManager>,
}

impl LifecycleEngine {
    /// 创建新的生命周期引擎实例
    pub fn new(conn: Arc<Mutex<Connection>>, config: Arc<ConfigManager>) -> Self {
        Self { conn, config }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 当前时间 (秒精度, 与数据库存储格式一致)
    fn now() -> NaiveDateTime {
        let now = Utc::now().naive_utc();
        now.with_nanosecond(0).unwrap_or(now)
    }

    // ==========================================
    // Create - 创建工单
    // ==========================================

    /// 创建工单 (状态 OPEN, 关单字段置空), 可附带初始行项
    ///
    /// 编号在创建事务内从数据库序列分配
    pub fn create_ticket(
        &self,
        draft: TicketDraft,
        line_items: &[(String, i64)],
    ) -> LifecycleResult<Ticket> {
        let prefix = self
            .config
            .ticket_code_prefix()
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;
        let pad_width = self
            .config
            .ticket_code_pad_width()
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(RepositoryError::from_transaction)?;

        let now = Self::now();
        let code = TicketRepository::next_code_in_tx(&tx, &prefix, pad_width)?;

        let ticket = Ticket {
            id: Uuid::new_v4().to_string(),
            code,
            subject: draft.subject,
            description: draft.description,
            equipment_code: draft.equipment_code,
            area_code: draft.area_code,
            reporter: draft.reporter,
            assignee: draft.assignee,
            action_taken: None,
            priority: draft.priority.unwrap_or_default(),
            category: draft.category,
            status: TicketStatus::Open,
            report_date: now,
            updated_at: now,
            close_time: None,
            resolution_minutes: None,
            revision: 0,
        };

        TicketRepository::insert_in_tx(&tx, &ticket)?;

        for (part_id, quantity) in line_items {
            if *quantity <= 0 {
                return Err(LifecycleError::Validation(format!(
                    "行项数量必须大于 0: part_id={}, quantity={}",
                    part_id, quantity
                )));
            }
            Self::insert_line_item_checked(&tx, &ticket.id, part_id, *quantity)?;
        }

        tx.commit()
            .map_err(RepositoryError::from_transaction)?;

        info!(ticket_id = %ticket.id, code = %ticket.code, subject = %ticket.subject, "工单已创建");
        Ok(ticket)
    }

    // ==========================================
    // SetStatus - 状态更新 (含关单)
    // ==========================================

    /// 更新工单状态
    ///
    /// - 进入 CLOSED: 台账扣减全部行项 + 计算解决耗时 + 写关单字段, 同一事务提交
    /// - CLOSED → CLOSED: 幂等无操作, 返回当前工单, 不重复扣减
    /// - 离开 CLOSED: 拒绝 (InvalidTransition), 只能走 Reopen
    /// - 其余转换: 仅更新状态, 不触碰台账
    ///
    /// 任何失败 (如库存不足) 回滚整个事务: 工单与库存都保持原值
    pub fn set_status(
        &self,
        ticket_id: &str,
        new_status: TicketStatus,
    ) -> LifecycleResult<Ticket> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(RepositoryError::from_transaction)?;

        let mut ticket = TicketRepository::find_by_id_in_tx(&tx, ticket_id)?.ok_or_else(|| {
            LifecycleError::TicketNotFound {
                id: ticket_id.to_string(),
            }
        })?;
        let old_status = ticket.status;

        if !old_status.can_transition_to(new_status) {
            return Err(LifecycleError::InvalidTransition {
                from: old_status,
                to: new_status,
            });
        }

        // 幂等: 已关闭的工单再次关闭是无操作, 绝不重复扣减
        if new_status == TicketStatus::Closed && old_status == TicketStatus::Closed {
            info!(ticket_id = %ticket.id, "工单已处于 CLOSED, 关单请求视为无操作");
            return Ok(ticket);
        }

        let now = Self::now();

        if new_status == TicketStatus::Closed {
            let items = TicketRepository::line_items_in_tx(&tx, ticket_id)?;
            InventoryLedger::deduct_all(&tx, &items, now)?;

            ticket.close_time = Some(now);
            ticket.resolution_minutes =
                Some(compute_resolution_minutes(ticket.report_date, now)?);
            ticket.status = TicketStatus::Closed;
            ticket.updated_at = now;

            TicketRepository::update_in_tx(&tx, &ticket)?;
            tx.commit()
                .map_err(RepositoryError::from_transaction)?;

            ticket.revision += 1;
            info!(
                ticket_id = %ticket.id,
                line_items = items.len(),
                resolution_minutes = ticket.resolution_minutes,
                "工单关闭, 行项已从库存扣减"
            );
            return Ok(ticket);
        }

        // OPEN / IN_PROGRESS / PENDING 之间的普通转换, 不触碰台账
        ticket.status = new_status;
        ticket.updated_at = now;
        TicketRepository::update_in_tx(&tx, &ticket)?;
        tx.commit()
            .map_err(RepositoryError::from_transaction)?;

        ticket.revision += 1;
        info!(ticket_id = %ticket.id, from = %old_status, to = %new_status, "工单状态已更新");
        Ok(ticket)
    }

    // ==========================================
    // Reopen - 重开已关闭工单
    // ==========================================

    /// 重开 CLOSED 工单: 台账回补全部行项, 状态回到 IN_PROGRESS,
    /// 关单字段置空, 与回补同一事务提交
    ///
    /// # 错误
    /// - `InvalidState`: 工单不处于 CLOSED
    pub fn reopen(&self, ticket_id: &str) -> LifecycleResult<Ticket> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(RepositoryError::from_transaction)?;

        let mut ticket = TicketRepository::find_by_id_in_tx(&tx, ticket_id)?.ok_or_else(|| {
            LifecycleError::TicketNotFound {
                id: ticket_id.to_string(),
            }
        })?;

        if ticket.status != TicketStatus::Closed {
            return Err(LifecycleError::InvalidState {
                status: ticket.status,
                message: "只有 CLOSED 工单可以重开".to_string(),
            });
        }

        let now = Self::now();
        let items = TicketRepository::line_items_in_tx(&tx, ticket_id)?;
        InventoryLedger::restock_all(&tx, &items, now)?;

        ticket.status = TicketStatus::InProgress;
        ticket.close_time = None;
        ticket.resolution_minutes = None;
        ticket.updated_at = now;

        TicketRepository::update_in_tx(&tx, &ticket)?;
        tx.commit()
            .map_err(RepositoryError::from_transaction)?;

        ticket.revision += 1;
        warn!(
            ticket_id = %ticket.id,
            line_items = items.len(),
            "已关闭工单被重开, 行项已回补库存"
        );
        Ok(ticket)
    }

    // ==========================================
    // 行项维护 (不触碰库存, 扣减延迟到关单)
    // ==========================================

    /// 向工单追加备件行项
    ///
    /// # 错误
    /// - `DuplicateLineItem`: (ticket_id, part_id) 已存在 (应调整已有行项数量)
    /// - `PartNotFound` / `TicketNotFound`
    /// - `InvalidState`: 工单已关闭, 行项锁定
    pub fn add_line_item(
        &self,
        ticket_id: &str,
        part_id: &str,
        quantity: i64,
    ) -> LifecycleResult<()> {
        if quantity <= 0 {
            return Err(LifecycleError::Validation(format!(
                "行项数量必须大于 0: quantity={}",
                quantity
            )));
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(RepositoryError::from_transaction)?;

        let mut ticket = TicketRepository::find_by_id_in_tx(&tx, ticket_id)?.ok_or_else(|| {
            LifecycleError::TicketNotFound {
                id: ticket_id.to_string(),
            }
        })?;

        if ticket.is_closed() {
            return Err(LifecycleError::InvalidState {
                status: ticket.status,
                message: "已关闭工单的行项不可编辑, 需先重开".to_string(),
            });
        }

        Self::insert_line_item_checked(&tx, ticket_id, part_id, quantity)?;

        // 行项变化也推动工单的 updated_at / revision
        ticket.updated_at = Self::now();
        TicketRepository::update_in_tx(&tx, &ticket)?;
        tx.commit()
            .map_err(RepositoryError::from_transaction)?;

        info!(ticket_id = %ticket_id, part_id = %part_id, quantity, "行项已追加");
        Ok(())
    }

    /// 从工单移除备件行项 (与追加对称, 不触碰库存)
    pub fn remove_line_item(&self, ticket_id: &str, part_id: &str) -> LifecycleResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(RepositoryError::from_transaction)?;

        let mut ticket = TicketRepository::find_by_id_in_tx(&tx, ticket_id)?.ok_or_else(|| {
            LifecycleError::TicketNotFound {
                id: ticket_id.to_string(),
            }
        })?;

        if ticket.is_closed() {
            return Err(LifecycleError::InvalidState {
                status: ticket.status,
                message: "已关闭工单的行项不可编辑, 需先重开".to_string(),
            });
        }

        let removed = TicketRepository::delete_line_item_in_tx(&tx, ticket_id, part_id)?;
        if !removed {
            return Err(LifecycleError::LineItemNotFound {
                ticket_id: ticket_id.to_string(),
                part_id: part_id.to_string(),
            });
        }

        ticket.updated_at = Self::now();
        TicketRepository::update_in_tx(&tx, &ticket)?;
        tx.commit()
            .map_err(RepositoryError::from_transaction)?;

        info!(ticket_id = %ticket_id, part_id = %part_id, "行项已移除");
        Ok(())
    }

    // ==========================================
    // 其他字段更新
    // ==========================================

    /// 更新处理人 (对任意状态的工单允许)
    pub fn update_assignee(
        &self,
        ticket_id: &str,
        assignee: Option<String>,
    ) -> LifecycleResult<Ticket> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(RepositoryError::from_transaction)?;

        let mut ticket = TicketRepository::find_by_id_in_tx(&tx, ticket_id)?.ok_or_else(|| {
            LifecycleError::TicketNotFound {
                id: ticket_id.to_string(),
            }
        })?;

        ticket.assignee = assignee;
        ticket.updated_at = Self::now();
        TicketRepository::update_in_tx(&tx, &ticket)?;
        tx.commit()
            .map_err(RepositoryError::from_transaction)?;

        ticket.revision += 1;
        Ok(ticket)
    }

    /// 删除工单 (行项级联删除)
    ///
    /// 删除 CLOSED 工单不回补库存: 备件确实被维修消耗,
    /// 删除记录不等于撤销消耗
    pub fn delete_ticket(&self, ticket_id: &str) -> LifecycleResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(RepositoryError::from_transaction)?;

        let deleted = TicketRepository::delete_in_tx(&tx, ticket_id)?;
        if !deleted {
            return Err(LifecycleError::TicketNotFound {
                id: ticket_id.to_string(),
            });
        }

        tx.commit()
            .map_err(RepositoryError::from_transaction)?;

        info!(ticket_id = %ticket_id, "工单已删除");
        Ok(())
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 校验备件存在后插入行项, 唯一约束冲突映射为 DuplicateLineItem
    fn insert_line_item_checked(
        conn: &Connection,
        ticket_id: &str,
        part_id: &str,
        quantity: i64,
    ) -> LifecycleResult<()> {
        if PartRepository::find_by_id_in_tx(conn, part_id)?.is_none() {
            return Err(LifecycleError::PartNotFound {
                id: part_id.to_string(),
            });
        }

        let item = LineItem {
            ticket_id: ticket_id.to_string(),
            part_id: part_id.to_string(),
            quantity,
        };

        match TicketRepository::insert_line_item_in_tx(conn, &item) {
            Ok(()) => Ok(()),
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                Err(LifecycleError::DuplicateLineItem {
                    ticket_id: ticket_id.to_string(),
                    part_id: part_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
