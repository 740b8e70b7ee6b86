// ==========================================
// API 层集成测试
// ==========================================
// 职责: 验证工单/备件 API 的校验、查询与组合视图行为
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod ticket_api_test {
    use maintenance_ticket::api::ApiError;
    use maintenance_ticket::config::{KEY_TICKET_CODE_PAD_WIDTH, KEY_TICKET_CODE_PREFIX};
    use maintenance_ticket::domain::part::PartDraft;
    use maintenance_ticket::domain::types::TicketStatus;

    use crate::test_helpers::{create_test_part, setup_app, ticket_draft};

    // ==========================================
    // 测试1: 创建校验 - 一次性返回全部字段违规
    // ==========================================

    #[test]
    fn test_create_ticket_collects_all_violations() {
        let (_tmp, state) = setup_app();

        let mut draft = ticket_draft("  ");
        draft.equipment_code = "".to_string();

        let err = state
            .ticket_api
            .create_ticket(draft, vec![("".to_string(), 0)])
            .unwrap_err();
        match err {
            ApiError::ValidationError { violations, .. } => {
                let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
                assert!(fields.contains(&"subject"));
                assert!(fields.contains(&"equipment_code"));
                assert!(fields.contains(&"line_items[0].part_id"));
                assert!(fields.contains(&"line_items[0].quantity"));
            }
            other => panic!("期望 ValidationError, 实际 {:?}", other),
        }

        // 校验失败不产生任何工单
        assert!(state.ticket_api.list_tickets().unwrap().is_empty());
    }

    // ==========================================
    // 测试2: 状态过滤与列表排序
    // ==========================================

    #[test]
    fn test_list_by_status() {
        let (_tmp, state) = setup_app();

        let t1 = state
            .ticket_api
            .create_ticket(ticket_draft("辊道卡滞"), vec![])
            .unwrap();
        let t2 = state
            .ticket_api
            .create_ticket(ticket_draft("液压站漏油"), vec![])
            .unwrap();
        state
            .ticket_api
            .set_ticket_status(&t2.id, TicketStatus::InProgress)
            .unwrap();

        let open = state
            .ticket_api
            .list_tickets_by_status(TicketStatus::Open)
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, t1.id);

        let in_progress = state
            .ticket_api
            .list_tickets_by_status(TicketStatus::InProgress)
            .unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, t2.id);

        assert!(state
            .ticket_api
            .list_tickets_by_status(TicketStatus::Closed)
            .unwrap()
            .is_empty());
    }

    // ==========================================
    // 测试3: 关键字检索与分页
    // ==========================================

    #[test]
    fn test_search_and_pagination() {
        let (_tmp, state) = setup_app();

        for subject in ["1号液压泵异响", "2号液压泵漏油", "主电机过热"] {
            state
                .ticket_api
                .create_ticket(ticket_draft(subject), vec![])
                .unwrap();
        }

        // 命中 subject
        let hits = state.ticket_api.search_tickets("液压泵", 10, 0).unwrap();
        assert_eq!(hits.len(), 2);

        // 命中 code
        let by_code = state.ticket_api.search_tickets("CMP0000", 10, 0).unwrap();
        assert_eq!(by_code.len(), 3);

        // 分页: 每页 2 条
        let page1 = state.ticket_api.search_tickets("", 2, 0).unwrap();
        let page2 = state.ticket_api.search_tickets("", 2, 2).unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 1);
        assert!(page1.iter().all(|t| t.id != page2[0].id));

        // 非法分页参数
        assert!(matches!(
            state.ticket_api.search_tickets("", 0, 0).unwrap_err(),
            ApiError::ValidationError { .. }
        ));
        assert!(matches!(
            state.ticket_api.search_tickets("", 10, -1).unwrap_err(),
            ApiError::ValidationError { .. }
        ));
    }

    // ==========================================
    // 测试4: 工单完整信息 - 行项与耗时渲染
    // ==========================================

    #[test]
    fn test_ticket_detail_resolution_display() {
        let (_tmp, state) = setup_app();
        let part = create_test_part(&state, "P-010", 5);

        let ticket = state
            .ticket_api
            .create_ticket(ticket_draft("风机振动"), vec![(part.id.clone(), 2)])
            .unwrap();

        let detail = state.ticket_api.get_ticket_detail(&ticket.id).unwrap();
        assert_eq!(detail.line_items.len(), 1);
        assert_eq!(detail.line_items[0].part_id, part.id);
        assert_eq!(detail.line_items[0].quantity, 2);
        // 未关单: 无耗时可显示
        assert_eq!(detail.resolution_display, "-");

        state
            .ticket_api
            .set_ticket_status(&ticket.id, TicketStatus::Closed)
            .unwrap();
        let closed = state.ticket_api.get_ticket_detail(&ticket.id).unwrap();
        // 关单即刻完成, 耗时向下取整到 0 分钟
        assert_eq!(closed.resolution_display, "0m");
        assert_eq!(closed.ticket.resolution_minutes, Some(0));
    }

    // ==========================================
    // 测试5: 工单编号前缀可配置
    // ==========================================

    #[test]
    fn test_code_prefix_from_config() {
        let (_tmp, state) = setup_app();

        state
            .config_manager
            .set_config_value(KEY_TICKET_CODE_PREFIX, "WX")
            .unwrap();
        state
            .config_manager
            .set_config_value(KEY_TICKET_CODE_PAD_WIDTH, "4")
            .unwrap();

        let ticket = state
            .ticket_api
            .create_ticket(ticket_draft("导卫更换"), vec![])
            .unwrap();
        assert_eq!(ticket.code, "WX0001");

        let next = state
            .ticket_api
            .create_ticket(ticket_draft("剪刃崩口"), vec![])
            .unwrap();
        assert_eq!(next.code, "WX0002");
    }

    // ==========================================
    // 测试6: 备件 - 重复代码冲突
    // ==========================================

    #[test]
    fn test_duplicate_part_code_conflict() {
        let (_tmp, state) = setup_app();
        create_test_part(&state, "P-DUP", 3);

        let err = state
            .part_api
            .create_part(PartDraft {
                code: "P-DUP".to_string(),
                name: "另一个备件".to_string(),
                description: None,
                initial_stock: 1,
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    // ==========================================
    // 测试7: 备件 - 负初始库存拒绝
    // ==========================================

    #[test]
    fn test_negative_initial_stock_rejected() {
        let (_tmp, state) = setup_app();

        let err = state
            .part_api
            .create_part(PartDraft {
                code: "P-NEG".to_string(),
                name: "负库存备件".to_string(),
                description: None,
                initial_stock: -1,
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { .. }));
    }

    // ==========================================
    // 测试8: 备件 - 描述性字段更新不触碰库存
    // ==========================================

    #[test]
    fn test_update_part_details_keeps_stock() {
        let (_tmp, state) = setup_app();
        let part = create_test_part(&state, "P-011", 7);

        let updated = state
            .part_api
            .update_part_details(&part.id, "新名称", Some("新描述"))
            .unwrap();
        assert_eq!(updated.name, "新名称");
        assert_eq!(updated.description.as_deref(), Some("新描述"));
        assert_eq!(updated.stock_quantity, 7);

        // 按 code 查询同样可达
        let by_code = state.part_api.get_part_by_code("P-011").unwrap();
        assert_eq!(by_code.id, part.id);
    }
}
