// ==========================================
// 设备维修工单系统 - 备件库存台账
// ==========================================
// 职责: Part.stock_quantity 的唯一合法写入方
// 约束: 扣减/回补必须在调用方持有的同一事务内执行,
//       任一行项失败 → 调用方回滚, 整批不留任何痕迹
// ==========================================

use crate::domain::ticket::LineItem;
use crate::repository::error::RepositoryError;
use crate::repository::part_repo::{DeductOutcome, PartRepository};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use thiserror::Error;
use tracing::debug;

/// 台账操作错误
#[derive(Error, Debug)]
pub enum LedgerError {
    /// 库存不足 (指明备件与缺口, 整批未做任何修改)
    #[error("库存不足: part_id={part_id}, requested={requested}, available={available}")]
    InsufficientStock {
        part_id: String,
        requested: i64,
        available: i64,
    },

    /// 行项引用的备件已不存在
    #[error("备件不存在: part_id={part_id}")]
    PartNotFound { part_id: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// ==========================================
// InventoryLedger - 库存台账
// ==========================================

/// 库存台账
///
/// 无状态: 所有操作作用于调用方传入的事务连接,
/// 由生命周期引擎保证与工单状态写入在同一原子单元内提交
pub struct InventoryLedger;

impl InventoryLedger {
    /// 原子扣减一张关单工单的全部行项
    ///
    /// 备件按 part_id 固定顺序处理 (跨调用顺序一致, 避免死锁),
    /// 条件 UPDATE 保证任何并发读者都观测不到负库存;
    /// 任一行项不足 → 返回错误, 调用方回滚, 所有备件库存保持原值
    ///
    /// # 错误
    /// - `InsufficientStock`: 某备件库存不足 (指明缺口)
    /// - `PartNotFound`: 某行项引用的备件不存在
    pub fn deduct_all(
        conn: &Connection,
        line_items: &[LineItem],
        now: NaiveDateTime,
    ) -> Result<(), LedgerError> {
        let mut items: Vec<&LineItem> = line_items.iter().collect();
        items.sort_by(|a, b| a.part_id.cmp(&b.part_id));

        for item in items {
            match PartRepository::deduct_stock_in_tx(conn, &item.part_id, item.quantity, now)? {
                DeductOutcome::Deducted => {
                    debug!(
                        part_id = %item.part_id,
                        quantity = item.quantity,
                        "库存扣减"
                    );
                }
                DeductOutcome::PartNotFound => {
                    return Err(LedgerError::PartNotFound {
                        part_id: item.part_id.clone(),
                    });
                }
                DeductOutcome::Insufficient { available } => {
                    return Err(LedgerError::InsufficientStock {
                        part_id: item.part_id.clone(),
                        requested: item.quantity,
                        available,
                    });
                }
            }
        }

        Ok(())
    }

    /// 原子回补一张重开工单的全部行项
    ///
    /// 回补上不封顶, 唯一失败模式是备件已不存在
    pub fn restock_all(
        conn: &Connection,
        line_items: &[LineItem],
        now: NaiveDateTime,
    ) -> Result<(), LedgerError> {
        let mut items: Vec<&LineItem> = line_items.iter().collect();
        items.sort_by(|a, b| a.part_id.cmp(&b.part_id));

        for item in items {
            let found =
                PartRepository::restock_in_tx(conn, &item.part_id, item.quantity, now)?;
            if !found {
                return Err(LedgerError::PartNotFound {
                    part_id: item.part_id.clone(),
                });
            }
            debug!(
                part_id = %item.part_id,
                quantity = item.quantity,
                "库存回补"
            );
        }

        Ok(())
    }
}
