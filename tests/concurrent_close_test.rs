// ==========================================
// 并发关单测试
// ==========================================
// 职责: 验证并发关单只扣减一次库存
// 说明: 同进程内两条路径 - 共享连接 (互斥锁串行化) 与
//       双连接 (revision 冲突检测 + busy_timeout)
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod concurrent_close_test {
    use std::sync::Arc;
    use std::thread;

    use maintenance_ticket::api::ApiError;
    use maintenance_ticket::app::AppState;
    use maintenance_ticket::domain::types::TicketStatus;

    use crate::test_helpers::{create_test_part, setup_app, stock_of, ticket_draft};

    // ==========================================
    // 测试1: 共享连接 - 两线程同时关同一工单, 恰好扣减一次
    // ==========================================

    #[test]
    fn test_concurrent_close_deducts_exactly_once() {
        let (_tmp, state) = setup_app();
        let part = create_test_part(&state, "P-RACE", 2);

        let ticket = state
            .ticket_api
            .create_ticket(ticket_draft("卷取机抱闸失灵"), vec![(part.id.clone(), 2)])
            .unwrap();

        let api_a = state.ticket_api.clone();
        let api_b = state.ticket_api.clone();
        let id_a = ticket.id.clone();
        let id_b = ticket.id.clone();

        let h_a = thread::spawn(move || api_a.set_ticket_status(&id_a, TicketStatus::Closed));
        let h_b = thread::spawn(move || api_b.set_ticket_status(&id_b, TicketStatus::Closed));

        let r_a = h_a.join().unwrap();
        let r_b = h_b.join().unwrap();

        // 两次调用都应成功: 先到者执行关单, 后到者观察到 CLOSED 幂等返回
        let t_a = r_a.unwrap();
        let t_b = r_b.unwrap();
        assert_eq!(t_a.status, TicketStatus::Closed);
        assert_eq!(t_b.status, TicketStatus::Closed);
        assert_eq!(t_a.close_time, t_b.close_time);

        // 库存恰好扣减一次: 2 - 2 = 0, 不为 -2
        assert_eq!(stock_of(&state, &part.id), 0);
    }

    // ==========================================
    // 测试2: 双连接 - revision 冲突方收到可重试错误, 不重复扣减
    // ==========================================

    #[test]
    fn test_concurrent_close_across_connections() {
        let (_tmp, state) = setup_app();
        let part = create_test_part(&state, "P-RACE2", 2);

        let ticket = state
            .ticket_api
            .create_ticket(ticket_draft("除鳞泵压力波动"), vec![(part.id.clone(), 2)])
            .unwrap();

        // 第二个独立连接指向同一数据库文件
        let state_b = Arc::new(AppState::new(&state.db_path).unwrap());

        let api_a = state.ticket_api.clone();
        let api_b = state_b.ticket_api.clone();
        let id_a = ticket.id.clone();
        let id_b = ticket.id.clone();

        let h_a = thread::spawn(move || api_a.set_ticket_status(&id_a, TicketStatus::Closed));
        let h_b = thread::spawn(move || api_b.set_ticket_status(&id_b, TicketStatus::Closed));

        let results = [h_a.join().unwrap(), h_b.join().unwrap()];

        // 每个结果要么成功 (关单或观察到已关), 要么是瞬态可重试错误
        let mut ok_count = 0;
        for result in results {
            match result {
                Ok(t) => {
                    assert_eq!(t.status, TicketStatus::Closed);
                    ok_count += 1;
                }
                Err(e) => {
                    assert!(e.is_retryable(), "非瞬态错误: {:?}", e);
                }
            }
        }
        assert!(ok_count >= 1, "至少一方应成功关单");

        // 无论竞争结果如何, 库存只扣减一次
        let closed = state.ticket_api.get_ticket(&ticket.id).unwrap();
        assert_eq!(closed.status, TicketStatus::Closed);
        assert_eq!(stock_of(&state, &part.id), 0);
    }

    // ==========================================
    // 测试3: 两张工单争抢最后一件备件, 恰好一张关单成功
    // ==========================================

    #[test]
    fn test_two_tickets_race_for_last_unit() {
        let (_tmp, state) = setup_app();
        let part = create_test_part(&state, "P-LAST", 1);

        let t1 = state
            .ticket_api
            .create_ticket(ticket_draft("活套辊轴承损坏"), vec![(part.id.clone(), 1)])
            .unwrap();
        let t2 = state
            .ticket_api
            .create_ticket(ticket_draft("侧导板衬板更换"), vec![(part.id.clone(), 1)])
            .unwrap();

        let api_a = state.ticket_api.clone();
        let api_b = state.ticket_api.clone();
        let id_1 = t1.id.clone();
        let id_2 = t2.id.clone();

        let h_a = thread::spawn(move || api_a.set_ticket_status(&id_1, TicketStatus::Closed));
        let h_b = thread::spawn(move || api_b.set_ticket_status(&id_2, TicketStatus::Closed));

        let r_1 = h_a.join().unwrap();
        let r_2 = h_b.join().unwrap();

        // 恰好一方拿到最后一件, 另一方收到库存不足
        let successes = [r_1.is_ok(), r_2.is_ok()].iter().filter(|&&b| b).count();
        assert_eq!(successes, 1, "恰好一张工单应关单成功");

        for result in [r_1, r_2] {
            if let Err(e) = result {
                assert!(
                    matches!(e, ApiError::InsufficientStock { available: 0, .. }),
                    "失败方应为库存不足: {:?}",
                    e
                );
            }
        }
        assert_eq!(stock_of(&state, &part.id), 0);
    }
}
