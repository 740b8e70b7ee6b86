// ==========================================
// 设备维修工单系统 - 工单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 并发控制: tickets.revision 乐观锁, 提交时校验
// ==========================================

use crate::domain::ticket::{LineItem, Ticket};
use crate::domain::types::{Category, Priority, TicketStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::part_repo::{format_dt, parse_dt};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// TicketRepository - 工单仓储
// ==========================================

/// 工单仓储
/// 职责: 管理 tickets / ticket_parts 表的 CRUD 操作与编号序列
pub struct TicketRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TicketRepository {
    /// 从共享连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    const SELECT_COLS: &'static str = "id, code, subject, description, equipment_code, \
         area_code, reporter, assignee, action_taken, priority, category, status, \
         report_date, updated_at, close_time, resolution_minutes, revision";

    fn map_row(row: &Row) -> rusqlite::Result<Ticket> {
        let priority_raw: String = row.get(9)?;
        let priority = Priority::from_db_str(&priority_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                9,
                rusqlite::types::Type::Text,
                format!("无效优先级: {}", priority_raw).into(),
            )
        })?;

        let category_raw: String = row.get(10)?;
        let category = Category::from_db_str(&category_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                10,
                rusqlite::types::Type::Text,
                format!("无效类别: {}", category_raw).into(),
            )
        })?;

        let status_raw: String = row.get(11)?;
        let status = TicketStatus::from_db_str(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                11,
                rusqlite::types::Type::Text,
                format!("无效状态: {}", status_raw).into(),
            )
        })?;

        let close_time = match row.get::<_, Option<String>>(14)? {
            Some(raw) => Some(parse_dt(14, &raw)?),
            None => None,
        };

        Ok(Ticket {
            id: row.get(0)?,
            code: row.get(1)?,
            subject: row.get(2)?,
            description: row.get(3)?,
            equipment_code: row.get(4)?,
            area_code: row.get(5)?,
            reporter: row.get(6)?,
            assignee: row.get(7)?,
            action_taken: row.get(8)?,
            priority,
            category,
            status,
            report_date: parse_dt(12, &row.get::<_, String>(12)?)?,
            updated_at: parse_dt(13, &row.get::<_, String>(13)?)?,
            close_time,
            resolution_minutes: row.get(15)?,
            revision: row.get(16)?,
        })
    }

    // ==========================================
    // 只读查询
    // ==========================================

    /// 按 id 查询工单
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Ticket>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in_tx(&conn, id)
    }

    /// 按编号查询工单
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Ticket>> {
        let conn = self.get_conn()?;

        let ticket = conn
            .query_row(
                &format!("SELECT {} FROM tickets WHERE code = ?1", Self::SELECT_COLS),
                params![code],
                Self::map_row,
            )
            .optional()?;

        Ok(ticket)
    }

    /// 查询全部工单 (报修时间倒序)
    pub fn find_all(&self) -> RepositoryResult<Vec<Ticket>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tickets ORDER BY report_date DESC, code DESC",
            Self::SELECT_COLS
        ))?;

        let tickets = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<Ticket>>>()?;

        Ok(tickets)
    }

    /// 按状态查询工单
    pub fn find_by_status(&self, status: TicketStatus) -> RepositoryResult<Vec<Ticket>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tickets WHERE status = ?1 ORDER BY report_date DESC, code DESC",
            Self::SELECT_COLS
        ))?;

        let tickets = stmt
            .query_map(params![status.to_db_str()], Self::map_row)?
            .collect::<SqliteResult<Vec<Ticket>>>()?;

        Ok(tickets)
    }

    /// 关键字检索 (subject / description / code 模糊匹配, 分页)
    pub fn search(
        &self,
        keyword: &str,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Ticket>> {
        let conn = self.get_conn()?;
        let pattern = format!("%{}%", keyword);

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM tickets
               WHERE subject LIKE ?1 OR description LIKE ?1 OR code LIKE ?1
               ORDER BY report_date DESC, code DESC
               LIMIT ?2 OFFSET ?3"#,
            Self::SELECT_COLS
        ))?;

        let tickets = stmt
            .query_map(params![pattern, limit, offset], Self::map_row)?
            .collect::<SqliteResult<Vec<Ticket>>>()?;

        Ok(tickets)
    }

    /// 查询工单的备件行项 (按 part_id 排序, 与台账处理顺序一致)
    pub fn line_items(&self, ticket_id: &str) -> RepositoryResult<Vec<LineItem>> {
        let conn = self.get_conn()?;
        Self::line_items_in_tx(&conn, ticket_id)
    }

    // ==========================================
    // 事务内操作 (供生命周期引擎在同一事务内组合)
    // ==========================================

    /// 事务内按 id 查询工单
    pub fn find_by_id_in_tx(conn: &Connection, id: &str) -> RepositoryResult<Option<Ticket>> {
        let ticket = conn
            .query_row(
                &format!("SELECT {} FROM tickets WHERE id = ?1", Self::SELECT_COLS),
                params![id],
                Self::map_row,
            )
            .optional()?;

        Ok(ticket)
    }

    /// 事务内插入工单
    pub fn insert_in_tx(conn: &Connection, ticket: &Ticket) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO tickets (
                id, code, subject, description, equipment_code,
                area_code, reporter, assignee, action_taken, priority,
                category, status, report_date, updated_at, close_time,
                resolution_minutes, revision
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                ticket.id,
                ticket.code,
                ticket.subject,
                ticket.description,
                ticket.equipment_code,
                ticket.area_code,
                ticket.reporter,
                ticket.assignee,
                ticket.action_taken,
                ticket.priority.to_db_str(),
                ticket.category.to_db_str(),
                ticket.status.to_db_str(),
                format_dt(ticket.report_date),
                format_dt(ticket.updated_at),
                ticket.close_time.map(format_dt),
                ticket.resolution_minutes,
                ticket.revision,
            ],
        )?;

        Ok(())
    }

    /// 事务内更新工单 (带乐观锁检查)
    ///
    /// 提交时校验 revision 并自增; ticket.revision 应为加载时读到的值
    ///
    /// # 错误
    /// - `OptimisticLockFailure`: revision 不匹配 (其他调用方已提交)
    /// - `NotFound`: id 不存在
    pub fn update_in_tx(conn: &Connection, ticket: &Ticket) -> RepositoryResult<()> {
        let affected = conn.execute(
            r#"
            UPDATE tickets
            SET subject = ?1, description = ?2, equipment_code = ?3, area_code = ?4,
                reporter = ?5, assignee = ?6, action_taken = ?7, priority = ?8,
                category = ?9, status = ?10, updated_at = ?11, close_time = ?12,
                resolution_minutes = ?13, revision = revision + 1
            WHERE id = ?14 AND revision = ?15
            "#,
            params![
                ticket.subject,
                ticket.description,
                ticket.equipment_code,
                ticket.area_code,
                ticket.reporter,
                ticket.assignee,
                ticket.action_taken,
                ticket.priority.to_db_str(),
                ticket.category.to_db_str(),
                ticket.status.to_db_str(),
                format_dt(ticket.updated_at),
                ticket.close_time.map(format_dt),
                ticket.resolution_minutes,
                ticket.id,
                ticket.revision,
            ],
        )?;

        if affected == 1 {
            return Ok(());
        }

        // 区分"不存在"与"版本冲突"
        let actual: Option<i64> = conn
            .query_row(
                "SELECT revision FROM tickets WHERE id = ?1",
                params![ticket.id],
                |row| row.get(0),
            )
            .optional()?;

        match actual {
            None => Err(RepositoryError::NotFound {
                entity: "Ticket".to_string(),
                id: ticket.id.clone(),
            }),
            Some(actual) => Err(RepositoryError::OptimisticLockFailure {
                ticket_id: ticket.id.clone(),
                expected: ticket.revision,
                actual,
            }),
        }
    }

    /// 事务内删除工单 (行项经外键级联删除)
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): id 不存在
    pub fn delete_in_tx(conn: &Connection, id: &str) -> RepositoryResult<bool> {
        let affected = conn.execute("DELETE FROM tickets WHERE id = ?1", params![id])?;
        Ok(affected == 1)
    }

    /// 事务内查询备件行项 (按 part_id 排序)
    pub fn line_items_in_tx(conn: &Connection, ticket_id: &str) -> RepositoryResult<Vec<LineItem>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT ticket_id, part_id, quantity
            FROM ticket_parts
            WHERE ticket_id = ?1
            ORDER BY part_id
            "#,
        )?;

        let items = stmt
            .query_map(params![ticket_id], |row| {
                Ok(LineItem {
                    ticket_id: row.get(0)?,
                    part_id: row.get(1)?,
                    quantity: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<LineItem>>>()?;

        Ok(items)
    }

    /// 事务内插入备件行项
    ///
    /// # 错误
    /// - `UniqueConstraintViolation`: (ticket_id, part_id) 已存在
    pub fn insert_line_item_in_tx(conn: &Connection, item: &LineItem) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO ticket_parts (ticket_id, part_id, quantity)
            VALUES (?1, ?2, ?3)
            "#,
            params![item.ticket_id, item.part_id, item.quantity],
        )?;

        Ok(())
    }

    /// 事务内删除备件行项
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 行项不存在
    pub fn delete_line_item_in_tx(
        conn: &Connection,
        ticket_id: &str,
        part_id: &str,
    ) -> RepositoryResult<bool> {
        let affected = conn.execute(
            "DELETE FROM ticket_parts WHERE ticket_id = ?1 AND part_id = ?2",
            params![ticket_id, part_id],
        )?;

        Ok(affected == 1)
    }

    /// 事务内生成下一个工单编号
    ///
    /// 说明:
    /// - 在创建事务内查询 MAX(code) 并格式化, 与插入同事务保证编号分配原子性
    /// - 取代进程内静态计数器: 多实例/重启场景下编号仍然单调且不重复
    pub fn next_code_in_tx(
        conn: &Connection,
        prefix: &str,
        pad_width: i64,
    ) -> RepositoryResult<String> {
        let pattern = format!("{}%", prefix);

        let max_code: Option<String> = conn.query_row(
            "SELECT MAX(code) FROM tickets WHERE code LIKE ?1",
            params![pattern],
            |row| row.get(0),
        )?;

        let next_number = match max_code {
            Some(code) => code
                .get(prefix.len()..)
                .and_then(|suffix| suffix.parse::<i64>().ok())
                .unwrap_or(0)
                + 1,
            None => 1,
        };

        let width = pad_width.max(1) as usize;
        Ok(format!("{}{:0width$}", prefix, next_number, width = width))
    }
}
