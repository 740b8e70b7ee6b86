// ==========================================
// 设备维修工单系统 - 备件数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: stock_quantity 的写入只暴露给台账 (engine::ledger)
// ==========================================

use crate::domain::part::Part;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 时间戳存储格式 (秒精度, 与数据库一致)
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_dt(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

pub(crate) fn parse_dt(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

// ==========================================
// 库存扣减结果
// ==========================================

/// 单个备件的条件扣减结果 (事务内使用)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeductOutcome {
    /// 扣减成功
    Deducted,
    /// 备件不存在
    PartNotFound,
    /// 库存不足 (available 为当前库存)
    Insufficient { available: i64 },
}

// ==========================================
// PartRepository - 备件仓储
// ==========================================

/// 备件仓储
/// 职责: 管理 parts 表的 CRUD 操作; 库存列的事务内条件更新
pub struct PartRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PartRepository {
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

    fn map_row(row: &Row) -> rusqlite::Result<Part> {
        Ok(Part {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            stock_quantity: row.get(4)?,
            updated_at: parse_dt(5, &row.get::<_, String>(5)?)?,
        })
    }

    const SELECT_COLS: &'static str =
        "id, code, name, description, stock_quantity, updated_at";

    /// 插入备件
    ///
    /// # 错误
    /// - `UniqueConstraintViolation`: code 已存在
    pub fn insert(&self, part: &Part) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO parts (id, code, name, description, stock_quantity, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                part.id,
                part.code,
                part.name,
                part.description,
                part.stock_quantity,
                format_dt(part.updated_at),
            ],
        )?;

        Ok(())
    }

    /// 按 id 查询备件
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Part>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in_tx(&conn, id)
    }

    /// 按 code 查询备件
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Part>> {
        let conn = self.get_conn()?;

        let part = conn
            .query_row(
                &format!("SELECT {} FROM parts WHERE code = ?1", Self::SELECT_COLS),
                params![code],
                Self::map_row,
            )
            .optional()?;

        Ok(part)
    }

    /// 查询全部备件 (按 code 排序)
    pub fn find_all(&self) -> RepositoryResult<Vec<Part>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM parts ORDER BY code",
            Self::SELECT_COLS
        ))?;

        let parts = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<Part>>>()?;

        Ok(parts)
    }

    /// 更新备件描述性字段 (name / description)
    ///
    /// 说明: 不触碰 stock_quantity, 库存变动一律经过台账
    pub fn update_details(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            UPDATE parts
            SET name = ?1, description = ?2, updated_at = ?3
            WHERE id = ?4
            "#,
            params![name, description, format_dt(updated_at), id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Part".to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }

    // ==========================================
    // 事务内操作 (供生命周期引擎/台账在同一事务内组合)
    // ==========================================

    /// 事务内按 id 查询备件
    pub fn find_by_id_in_tx(conn: &Connection, id: &str) -> RepositoryResult<Option<Part>> {
        let part = conn
            .query_row(
                &format!("SELECT {} FROM parts WHERE id = ?1", Self::SELECT_COLS),
                params![id],
                Self::map_row,
            )
            .optional()?;

        Ok(part)
    }

    /// 事务内条件扣减库存
    ///
    /// UPDATE 带 stock_quantity >= quantity 守卫: 任何其他并发读者
    /// 都不可能观测到负库存, 即使是瞬时状态
    ///
    /// # 返回
    /// - `DeductOutcome::Deducted`: 扣减成功
    /// - `DeductOutcome::PartNotFound`: 备件不存在
    /// - `DeductOutcome::Insufficient`: 库存不足, 未做任何修改
    pub fn deduct_stock_in_tx(
        conn: &Connection,
        part_id: &str,
        quantity: i64,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<DeductOutcome> {
        let affected = conn.execute(
            r#"
            UPDATE parts
            SET stock_quantity = stock_quantity - ?1, updated_at = ?2
            WHERE id = ?3 AND stock_quantity >= ?1
            "#,
            params![quantity, format_dt(updated_at), part_id],
        )?;

        if affected == 1 {
            return Ok(DeductOutcome::Deducted);
        }

        // 区分"不存在"与"库存不足"
        let available: Option<i64> = conn
            .query_row(
                "SELECT stock_quantity FROM parts WHERE id = ?1",
                params![part_id],
                |row| row.get(0),
            )
            .optional()?;

        match available {
            None => Ok(DeductOutcome::PartNotFound),
            Some(available) => Ok(DeductOutcome::Insufficient { available }),
        }
    }

    /// 事务内回补库存 (上不封顶)
    ///
    /// # 返回
    /// - Ok(true): 回补成功
    /// - Ok(false): 备件不存在
    pub fn restock_in_tx(
        conn: &Connection,
        part_id: &str,
        quantity: i64,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let affected = conn.execute(
            r#"
            UPDATE parts
            SET stock_quantity = stock_quantity + ?1, updated_at = ?2
            WHERE id = ?3
            "#,
            params![quantity, format_dt(updated_at), part_id],
        )?;

        Ok(affected == 1)
    }
}
