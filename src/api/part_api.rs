// ==========================================
// 设备维修工单系统 - 备件 API
// ==========================================
// 职责: 备件主数据维护与查询
// 红线: 只在创建时写入初始库存; 之后的库存变动
//       一律经过台账 (关单扣减 / 重开回补)
// ==========================================

use std::sync::Arc;

use chrono::{Timelike, Utc};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{ensure_valid, validate_part_draft};
use crate::domain::part::{Part, PartDraft};
use crate::repository::error::RepositoryError;
use crate::repository::part_repo::PartRepository;
use uuid::Uuid;

// ==========================================
// PartApi - 备件 API
// ==========================================

/// 备件API
pub struct PartApi {
    part_repo: Arc<PartRepository>,
}

impl PartApi {
    /// 创建新的PartApi实例
    pub fn new(part_repo: Arc<PartRepository>) -> Self {
        Self { part_repo }
    }

    /// 创建备件
    ///
    /// # 错误
    /// - `Conflict`: code 已存在
    /// - `ValidationError`: 字段违规
    pub fn create_part(&self, draft: PartDraft) -> ApiResult<Part> {
        ensure_valid(validate_part_draft(&draft))?;

        let now = Utc::now().naive_utc();
        let part = Part {
            id: Uuid::new_v4().to_string(),
            code: draft.code.trim().to_string(),
            name: draft.name.trim().to_string(),
            description: draft.description,
            stock_quantity: draft.initial_stock,
            updated_at: now.with_nanosecond(0).unwrap_or(now),
        };

        match self.part_repo.insert(&part) {
            Ok(()) => {
                info!(part_id = %part.id, code = %part.code, stock = part.stock_quantity, "备件已创建");
                Ok(part)
            }
            Err(RepositoryError::UniqueConstraintViolation(_)) => Err(ApiError::Conflict(
                format!("备件代码已存在: {}", part.code),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// 按 id 查询备件
    pub fn get_part(&self, part_id: &str) -> ApiResult<Part> {
        self.part_repo
            .find_by_id(part_id)?
            .ok_or_else(|| ApiError::NotFound(format!("备件(id={})不存在", part_id)))
    }

    /// 按 code 查询备件
    pub fn get_part_by_code(&self, code: &str) -> ApiResult<Part> {
        self.part_repo
            .find_by_code(code)?
            .ok_or_else(|| ApiError::NotFound(format!("备件(code={})不存在", code)))
    }

    /// 查询全部备件
    pub fn list_parts(&self) -> ApiResult<Vec<Part>> {
        Ok(self.part_repo.find_all()?)
    }

    /// 更新备件描述性字段 (不触碰库存)
    pub fn update_part_details(
        &self,
        part_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> ApiResult<Part> {
        if name.trim().is_empty() {
            return Err(ApiError::validation("备件名称不能为空"));
        }

        let now = Utc::now().naive_utc();
        self.part_repo.update_details(
            part_id,
            name.trim(),
            description,
            now.with_nanosecond(0).unwrap_or(now),
        )?;

        self.get_part(part_id)
    }
}
