// ==========================================
// 派工状态机端到端测试
// ==========================================
// 职责: 验证 PENDING -> ASSIGNED -> COMPLETED 状态机
//       与技师负载记账的原子性/不变式
// ==========================================


use auto_repair_dispatch::api::ApiError;
use auto_repair_dispatch::domain::types::Priority;
use std::sync::{Arc, Barrier};
use std::thread;
use test_helpers::{add_mechanic, create_request, create_test_state};

#[test]
fn test_assign_transitions_request_and_increments_load() {
    let (_db, state) = create_test_state();
    let mechanic_id = add_mechanic(&state, "Bennet", "Engine", 4);
    let request_id = create_request(&state, "Harish", Priority::High, (2023, 6, 15));

    let summary = state
        .dispatch_api
        .assign(&request_id, &mechanic_id, Some("admin"))
        .unwrap();

    assert_eq!(summary.status, "ASSIGNED");
    assert_eq!(summary.assigned_mechanic_id.as_deref(), Some(mechanic_id.as_str()));

    let mechanic = state.mechanic_api.get(&mechanic_id).unwrap();
    assert_eq!(mechanic.current_load, 1);
    assert_eq!(mechanic.status, "AVAILABLE");
}

#[test]
fn test_assign_unknown_ids_fails_not_found() {
    let (_db, state) = create_test_state();
    let mechanic_id = add_mechanic(&state, "Bennet", "Engine", 4);
    let request_id = create_request(&state, "Harish", Priority::High, (2023, 6, 15));

    let err = state
        .dispatch_api
        .assign("no-such-request", &mechanic_id, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = state
        .dispatch_api
        .assign(&request_id, "no-such-mechanic", None)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // 失败不得产生副作用
    let mechanic = state.mechanic_api.get(&mechanic_id).unwrap();
    assert_eq!(mechanic.current_load, 0);
    let detail = state.request_api.get_detail(&request_id).unwrap();
    assert_eq!(detail.status, "PENDING");
}

#[test]
fn test_assign_non_pending_fails_and_leaves_load_unchanged() {
    let (_db, state) = create_test_state();
    let m1 = add_mechanic(&state, "Bennet", "Engine", 4);
    let m2 = add_mechanic(&state, "Priya", "Brakes", 3);
    let request_id = create_request(&state, "Harish", Priority::High, (2023, 6, 15));

    state.dispatch_api.assign(&request_id, &m1, None).unwrap();

    // 已派工的请求不能再次派工 (并发竞争中后到者收到同样的错误)
    let err = state.dispatch_api.assign(&request_id, &m2, None).unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));

    assert_eq!(state.mechanic_api.get(&m1).unwrap().current_load, 1);
    assert_eq!(state.mechanic_api.get(&m2).unwrap().current_load, 0);
}

#[test]
fn test_capacity_exceeded_is_atomic_failure() {
    let (_db, state) = create_test_state();
    // maxLoad=1 的技师
    let mechanic_id = add_mechanic(&state, "Karthik", "General Maintenance", 1);
    let request_a = create_request(&state, "Sarah", Priority::High, (2023, 6, 15));
    let request_b = create_request(&state, "Emma", Priority::Medium, (2023, 6, 16));

    // 派工 A: 负载 0 -> 1
    state.dispatch_api.assign(&request_a, &mechanic_id, None).unwrap();
    let mechanic = state.mechanic_api.get(&mechanic_id).unwrap();
    assert_eq!(mechanic.current_load, 1);
    assert_eq!(mechanic.status, "BUSY");

    // 派工 B 到同一技师: 产能违反,B 保持 PENDING,负载保持 1
    let err = state
        .dispatch_api
        .assign(&request_b, &mechanic_id, None)
        .unwrap_err();
    match err {
        ApiError::CapacityExceeded {
            current_load,
            max_load,
            ..
        } => {
            assert_eq!(current_load, 1);
            assert_eq!(max_load, 1);
        }
        other => panic!("Expected CapacityExceeded, got {:?}", other),
    }
    assert_eq!(state.request_api.get_detail(&request_b).unwrap().status, "PENDING");
    assert_eq!(state.mechanic_api.get(&mechanic_id).unwrap().current_load, 1);

    // 完工 A: 负载 1 -> 0
    let completed = state
        .dispatch_api
        .complete(&request_a, Some(320.0), Some(4.8), None)
        .unwrap();
    assert_eq!(completed.status, "COMPLETED");
    assert_eq!(state.mechanic_api.get(&mechanic_id).unwrap().current_load, 0);

    // 产能释放后 B 可派工
    state.dispatch_api.assign(&request_b, &mechanic_id, None).unwrap();
    assert_eq!(state.mechanic_api.get(&mechanic_id).unwrap().current_load, 1);
}

#[test]
fn test_complete_requires_assigned_state() {
    let (_db, state) = create_test_state();
    let mechanic_id = add_mechanic(&state, "Bennet", "Engine", 4);
    let request_id = create_request(&state, "Harish", Priority::Low, (2023, 6, 15));

    // PENDING 不能完工
    let err = state.dispatch_api.complete(&request_id, None, None, None).unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));

    state.dispatch_api.assign(&request_id, &mechanic_id, None).unwrap();
    state.dispatch_api.complete(&request_id, None, None, None).unwrap();

    // COMPLETED 为终态: 不能再次完工,也不能再派工
    let err = state.dispatch_api.complete(&request_id, None, None, None).unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
    let err = state.dispatch_api.assign(&request_id, &mechanic_id, None).unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));

    // 负载已释放且不会被失败操作再次扣减
    assert_eq!(state.mechanic_api.get(&mechanic_id).unwrap().current_load, 0);
}

#[test]
fn test_completion_data_recorded() {
    let (_db, state) = create_test_state();
    let mechanic_id = add_mechanic(&state, "Arjun", "Diagnostics", 5);
    let request_id = create_request(&state, "Michael", Priority::High, (2023, 6, 17));

    state.dispatch_api.assign(&request_id, &mechanic_id, Some("admin")).unwrap();
    state
        .dispatch_api
        .complete(&request_id, Some(450.0), Some(5.0), Some("Arjun"))
        .unwrap();

    let detail = state.request_api.get_detail(&request_id).unwrap();
    assert_eq!(detail.status, "COMPLETED");
    assert!(detail.completed_at.is_some());
    assert_eq!(detail.actual_cost, Some(450.0));
    assert_eq!(detail.service_rating, Some(5.0));
    // 派工数据保留,保全历史
    assert_eq!(detail.assigned_mechanic_id.as_deref(), Some(mechanic_id.as_str()));
    assert!(detail.assigned_at.is_some());
}

#[test]
fn test_audit_trail_matches_operations_in_commit_order() {
    let (_db, state) = create_test_state();
    let mechanic_id = add_mechanic(&state, "Bennet", "Engine", 4);
    let request_id = create_request(&state, "Harish", Priority::High, (2023, 6, 15));

    state.dispatch_api.assign(&request_id, &mechanic_id, Some("admin")).unwrap();
    state.dispatch_api.complete(&request_id, None, None, Some("Bennet")).unwrap();

    let trail = state.request_api.audit_trail(&request_id).unwrap();
    // 每个改变状态的操作恰好一条日志,按提交顺序
    assert_eq!(trail.len(), 3);
    assert_eq!(trail[0].action, "Order Created");
    assert_eq!(trail[1].action, "Order Assigned");
    assert_eq!(trail[2].action, "Work Completed");
    assert_eq!(trail[1].actor, "admin");
    assert_eq!(trail[2].actor, "Bennet");
    // 时间戳与插入顺序一致
    assert!(trail[0].entry_ts <= trail[1].entry_ts);
    assert!(trail[1].entry_ts <= trail[2].entry_ts);
}

#[test]
fn test_racing_assigns_have_exactly_one_winner() {
    let (_db, state) = create_test_state();
    let m1 = add_mechanic(&state, "Bennet", "Engine", 50);
    let m2 = add_mechanic(&state, "Priya", "Brakes", 50);

    // 同一请求被两个线程同时派给不同技师: 恰好一个提交成功
    for round in 0..16 {
        let request_id = create_request(&state, "Racer", Priority::High, (2023, 6, 15));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [m1.clone(), m2.clone()]
            .into_iter()
            .map(|mechanic_id| {
                let api = state.dispatch_api.clone();
                let rid = request_id.clone();
                let gate = barrier.clone();
                thread::spawn(move || {
                    gate.wait();
                    api.assign(&rid, &mechanic_id, None)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "round {}: 并发派工必须恰好一个成功", round);
        for result in &results {
            if let Err(e) = result {
                assert!(matches!(e, ApiError::InvalidStateTransition { .. }));
            }
        }

        // 日志: 恰好一条派工记录,不多不少
        let trail = state.request_api.audit_trail(&request_id).unwrap();
        let assigned = trail.iter().filter(|e| e.action == "Order Assigned").count();
        assert_eq!(assigned, 1, "round {}: 派工日志必须恰好一条", round);
    }

    // 负载总和 == 成功派工数,没有产能泄漏
    let total_load: i32 = state
        .mechanic_api
        .list()
        .unwrap()
        .iter()
        .map(|m| m.current_load)
        .sum();
    assert_eq!(total_load, 16);
}

#[test]
fn test_load_bounds_hold_across_mixed_operations() {
    let (_db, state) = create_test_state();
    let mechanic_id = add_mechanic(&state, "Harshan", "Transmission", 2);

    let r1 = create_request(&state, "A", Priority::High, (2023, 6, 15));
    let r2 = create_request(&state, "B", Priority::Medium, (2023, 6, 16));
    let r3 = create_request(&state, "C", Priority::Low, (2023, 6, 17));

    state.dispatch_api.assign(&r1, &mechanic_id, None).unwrap();
    state.dispatch_api.assign(&r2, &mechanic_id, None).unwrap();
    // 满载
    assert!(state.dispatch_api.assign(&r3, &mechanic_id, None).is_err());

    let m = state.mechanic_api.get(&mechanic_id).unwrap();
    assert!(m.current_load >= 0 && m.current_load <= m.max_load);
    assert_eq!(m.current_load, 2);

    state.dispatch_api.complete(&r1, None, None, None).unwrap();
    state.dispatch_api.assign(&r3, &mechanic_id, None).unwrap();

    let m = state.mechanic_api.get(&mechanic_id).unwrap();
    assert_eq!(m.current_load, 2);
    state.dispatch_api.complete(&r2, None, None, None).unwrap();
    state.dispatch_api.complete(&r3, None, None, None).unwrap();

    let m = state.mechanic_api.get(&mechanic_id).unwrap();
    assert_eq!(m.current_load, 0);
}
