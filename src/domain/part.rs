// ==========================================
// 设备维修工单系统 - 备件实体
// ==========================================
// 职责: 定义备件库存记录
// 红线: stock_quantity 只允许台账 (InventoryLedger) 写入
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Part - 备件
// ==========================================

/// 备件库存记录
///
/// 不变式: stock_quantity >= 0 (由台账强制, 任何时刻不可违反)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// 主键 (UUID)
    pub id: String,
    /// 备件代码 (唯一)
    pub code: String,
    /// 名称
    pub name: String,
    /// 说明
    pub description: Option<String>,
    /// 库存数量
    pub stock_quantity: i64,
    /// 最近更新时间
    pub updated_at: NaiveDateTime,
}

// ==========================================
// PartDraft - 备件创建输入
// ==========================================

/// 新建备件的输入数据
///
/// initial_stock 只在创建时生效; 之后的库存变动一律经过台账
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartDraft {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub initial_stock: i64,
}
