// ==========================================
// 设备维修工单系统 - 工单 API
// ==========================================
// 职责: 对外的工单操作契约 (创建/状态/重开/行项/查询)
// 约束: 校验在引擎之前执行; 状态与台账的副作用全部委托生命周期引擎
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{ensure_valid, validate_line_items, validate_ticket_draft};
use crate::domain::ticket::{LineItem, Ticket, TicketDraft};
use crate::domain::types::TicketStatus;
use crate::engine::lifecycle::LifecycleEngine;
use crate::engine::resolution::format_resolution_minutes;
use crate::repository::ticket_repo::TicketRepository;

// ==========================================
// TicketDetail - 工单 + 行项组合视图
// ==========================================

/// 工单完整信息 (工单 + 行项 + 耗时渲染)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetail {
    pub ticket: Ticket,
    pub line_items: Vec<LineItem>,
    /// 人读耗时, 如 "2h 30m"; 未关单时为 "-"
    pub resolution_display: String,
}

impl TicketDetail {
    fn assemble(ticket: Ticket, line_items: Vec<LineItem>) -> Self {
        let resolution_display = match ticket.resolution_minutes {
            Some(minutes) => format_resolution_minutes(minutes),
            None => "-".to_string(),
        };
        Self {
            ticket,
            line_items,
            resolution_display,
        }
    }
}

// ==========================================
// TicketApi - 工单 API
// ==========================================

/// 工单API
///
/// 职责:
/// 1. 工单创建 (字段校验 + 编号分配)
/// 2. 状态流转 (关单扣减 / 重开回补经由生命周期引擎)
/// 3. 行项维护
/// 4. 查询 (单条 / 列表 / 状态过滤 / 关键字分页)
pub struct TicketApi {
    ticket_repo: Arc<TicketRepository>,
    lifecycle: Arc<LifecycleEngine>,
}

impl TicketApi {
    /// 创建新的TicketApi实例
    pub fn new(ticket_repo: Arc<TicketRepository>, lifecycle: Arc<LifecycleEngine>) -> Self {
        Self {
            ticket_repo,
            lifecycle,
        }
    }

    // ==========================================
    // 写接口
    // ==========================================

    /// 创建工单 (状态 OPEN), 可附带初始行项
    pub fn create_ticket(
        &self,
        draft: TicketDraft,
        line_items: Vec<(String, i64)>,
    ) -> ApiResult<Ticket> {
        let mut violations = validate_ticket_draft(&draft);
        violations.extend(validate_line_items(&line_items));
        ensure_valid(violations)?;

        let ticket = self.lifecycle.create_ticket(draft, &line_items)?;
        Ok(ticket)
    }

    /// 更新工单状态 (进入 CLOSED 时扣减库存并计算解决耗时)
    pub fn set_ticket_status(
        &self,
        ticket_id: &str,
        status: TicketStatus,
    ) -> ApiResult<Ticket> {
        let ticket = self.lifecycle.set_status(ticket_id, status)?;
        Ok(ticket)
    }

    /// 重开已关闭工单 (回补库存)
    pub fn reopen_ticket(&self, ticket_id: &str) -> ApiResult<Ticket> {
        let ticket = self.lifecycle.reopen(ticket_id)?;
        Ok(ticket)
    }

    /// 向工单追加备件行项 (不触碰库存)
    pub fn add_line_item(&self, ticket_id: &str, part_id: &str, quantity: i64) -> ApiResult<()> {
        ensure_valid(validate_line_items(&[(part_id.to_string(), quantity)]))?;
        self.lifecycle.add_line_item(ticket_id, part_id, quantity)?;
        Ok(())
    }

    /// 从工单移除备件行项 (不触碰库存)
    pub fn remove_line_item(&self, ticket_id: &str, part_id: &str) -> ApiResult<()> {
        self.lifecycle.remove_line_item(ticket_id, part_id)?;
        Ok(())
    }

    /// 更新处理人
    pub fn update_assignee(
        &self,
        ticket_id: &str,
        assignee: Option<String>,
    ) -> ApiResult<Ticket> {
        let ticket = self.lifecycle.update_assignee(ticket_id, assignee)?;
        Ok(ticket)
    }

    /// 删除工单 (行项级联删除, 不回补库存)
    pub fn delete_ticket(&self, ticket_id: &str) -> ApiResult<()> {
        self.lifecycle.delete_ticket(ticket_id)?;
        Ok(())
    }

    // ==========================================
    // 读接口
    // ==========================================

    /// 按 id 查询工单
    pub fn get_ticket(&self, ticket_id: &str) -> ApiResult<Ticket> {
        self.ticket_repo
            .find_by_id(ticket_id)?
            .ok_or_else(|| ApiError::NotFound(format!("工单(id={})不存在", ticket_id)))
    }

    /// 按 id 查询工单完整信息 (含行项与耗时渲染)
    pub fn get_ticket_detail(&self, ticket_id: &str) -> ApiResult<TicketDetail> {
        let ticket = self.get_ticket(ticket_id)?;
        let line_items = self.ticket_repo.line_items(ticket_id)?;
        Ok(TicketDetail::assemble(ticket, line_items))
    }

    /// 查询全部工单
    pub fn list_tickets(&self) -> ApiResult<Vec<Ticket>> {
        Ok(self.ticket_repo.find_all()?)
    }

    /// 按状态查询工单
    pub fn list_tickets_by_status(&self, status: TicketStatus) -> ApiResult<Vec<Ticket>> {
        Ok(self.ticket_repo.find_by_status(status)?)
    }

    /// 关键字检索 (subject / description / code, 分页)
    pub fn search_tickets(
        &self,
        keyword: &str,
        limit: i64,
        offset: i64,
    ) -> ApiResult<Vec<Ticket>> {
        if limit <= 0 {
            return Err(ApiError::validation(format!(
                "分页大小必须大于 0: limit={}",
                limit
            )));
        }
        if offset < 0 {
            return Err(ApiError::validation(format!(
                "分页偏移不能为负: offset={}",
                offset
            )));
        }

        debug!(keyword = %keyword, limit, offset, "工单关键字检索");
        Ok(self.ticket_repo.search(keyword, limit, offset)?)
    }
}
