// ==========================================
// 设备维修工单系统 - 工单实体
// ==========================================
// 职责: 定义工单与备件行项实体
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

use crate::domain::types::{Category, Priority, TicketStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Ticket - 工单 (报修单 / 作业报告)
// ==========================================

/// 工单实体
///
/// 不变式: close_time 与 resolution_minutes 非空 当且仅当 status == CLOSED
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// 主键 (UUID, 创建时分配, 不可变)
    pub id: String,
    /// 人读编号 (如 CMP000001, 数据库序列生成)
    pub code: String,
    /// 标题
    pub subject: String,
    /// 故障描述
    pub description: Option<String>,
    /// 设备代码 (外键引用, 显式代码而非对象图)
    pub equipment_code: String,
    /// 区域代码
    pub area_code: Option<String>,
    /// 报修人
    pub reporter: Option<String>,
    /// 处理人
    pub assignee: Option<String>,
    /// 处理措施记录
    pub action_taken: Option<String>,
    /// 优先级
    pub priority: Priority,
    /// 故障类别
    pub category: Category,
    /// 当前状态
    pub status: TicketStatus,
    /// 报修时间 (创建时设置, 不可变)
    pub report_date: NaiveDateTime,
    /// 最近更新时间
    pub updated_at: NaiveDateTime,
    /// 关单时间 (仅 CLOSED 时非空)
    pub close_time: Option<NaiveDateTime>,
    /// 解决耗时 (整分钟, 仅 CLOSED 时非空, 派生字段不可独立设置)
    pub resolution_minutes: Option<i64>,
    /// 乐观锁版本号
    pub revision: i64,
}

impl Ticket {
    pub fn is_closed(&self) -> bool {
        self.status == TicketStatus::Closed
    }

    /// 行项是否可编辑 (关单后锁定, Reopen 后恢复可编辑)
    pub fn line_items_editable(&self) -> bool {
        !self.is_closed()
    }

    /// 校验关单字段一致性不变式
    pub fn close_fields_consistent(&self) -> bool {
        if self.is_closed() {
            self.close_time.is_some() && self.resolution_minutes.is_some()
        } else {
            self.close_time.is_none() && self.resolution_minutes.is_none()
        }
    }
}

// ==========================================
// LineItem - 备件行项
// ==========================================

/// 工单备件行项
///
/// 不变式: 每个 (ticket_id, part_id) 至多一条; quantity > 0
/// 生命周期: 库存扣减/回补只发生在关单/重开边界,行项增删本身不触碰库存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub ticket_id: String,
    pub part_id: String,
    pub quantity: i64,
}

// ==========================================
// TicketDraft - 工单创建输入
// ==========================================

/// 新建工单的输入数据 (校验后交给生命周期引擎)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDraft {
    pub subject: String,
    pub description: Option<String>,
    pub equipment_code: String,
    pub area_code: Option<String>,
    pub reporter: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<Priority>,
    pub category: Category,
}
