// ==========================================
// 设备维修工单系统 - 输入校验
// ==========================================
// 职责: 在进入生命周期引擎之前做显式字段校验,
//       输出结构化的字段级违规列表
// ==========================================

use crate::api::error::{ApiError, ApiResult, FieldError};
use crate::domain::part::PartDraft;
use crate::domain::ticket::TicketDraft;

/// subject 最大长度
pub const MAX_SUBJECT_LEN: usize = 200;

/// 校验工单创建输入
///
/// # 返回
/// - 空列表: 校验通过
/// - 非空列表: 全部字段违规 (一次性返回, 不在首个违规处停止)
pub fn validate_ticket_draft(draft: &TicketDraft) -> Vec<FieldError> {
    let mut violations = Vec::new();

    if draft.subject.trim().is_empty() {
        violations.push(FieldError::new("subject", "标题不能为空"));
    } else if draft.subject.chars().count() > MAX_SUBJECT_LEN {
        violations.push(FieldError::new(
            "subject",
            format!("标题长度不能超过 {} 字符", MAX_SUBJECT_LEN),
        ));
    }

    if draft.equipment_code.trim().is_empty() {
        violations.push(FieldError::new("equipment_code", "设备代码不能为空"));
    }

    violations
}

/// 校验行项输入 (part_id 与数量)
pub fn validate_line_items(line_items: &[(String, i64)]) -> Vec<FieldError> {
    let mut violations = Vec::new();

    for (idx, (part_id, quantity)) in line_items.iter().enumerate() {
        if part_id.trim().is_empty() {
            violations.push(FieldError::new(
                format!("line_items[{}].part_id", idx),
                "备件 id 不能为空",
            ));
        }
        if *quantity <= 0 {
            violations.push(FieldError::new(
                format!("line_items[{}].quantity", idx),
                format!("数量必须大于 0, 实际为 {}", quantity),
            ));
        }
    }

    violations
}

/// 校验备件创建输入
pub fn validate_part_draft(draft: &PartDraft) -> Vec<FieldError> {
    let mut violations = Vec::new();

    if draft.code.trim().is_empty() {
        violations.push(FieldError::new("code", "备件代码不能为空"));
    }
    if draft.name.trim().is_empty() {
        violations.push(FieldError::new("name", "备件名称不能为空"));
    }
    if draft.initial_stock < 0 {
        violations.push(FieldError::new(
            "initial_stock",
            format!("初始库存不能为负, 实际为 {}", draft.initial_stock),
        ));
    }

    violations
}

/// 将非空违规列表转换为 ApiResult
pub fn ensure_valid(violations: Vec<FieldError>) -> ApiResult<()> {
    if violations.is_empty() {
        return Ok(());
    }

    let message = violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ");

    Err(ApiError::ValidationError {
        message,
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Category;

    fn draft(subject: &str, equipment: &str) -> TicketDraft {
        TicketDraft {
            subject: subject.to_string(),
            description: None,
            equipment_code: equipment.to_string(),
            area_code: None,
            reporter: None,
            assignee: None,
            priority: None,
            category: Category::Mechanical,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate_ticket_draft(&draft("辊道卡滞", "EQ-01")).is_empty());
    }

    #[test]
    fn test_collects_all_violations() {
        let violations = validate_ticket_draft(&draft("  ", ""));
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field, "subject");
        assert_eq!(violations[1].field, "equipment_code");
    }

    #[test]
    fn test_line_item_violations() {
        let items = vec![
            ("p-1".to_string(), 2),
            ("".to_string(), 0),
        ];
        let violations = validate_line_items(&items);
        assert_eq!(violations.len(), 2);
        assert!(violations[0].field.contains("[1].part_id"));
        assert!(violations[1].field.contains("[1].quantity"));
    }

    #[test]
    fn test_ensure_valid_maps_to_api_error() {
        let err = ensure_valid(vec![FieldError::new("subject", "标题不能为空")]).unwrap_err();
        match err {
            ApiError::ValidationError { violations, .. } => {
                assert_eq!(violations.len(), 1);
            }
            other => panic!("期望 ValidationError, 实际 {:?}", other),
        }
    }
}
