// ==========================================
// 配件追踪端到端测试
// ==========================================
// 职责: 验证配件履约链单调性与子账/日志联动
// ==========================================


use auto_repair_dispatch::api::{ApiError, NewPart};
use auto_repair_dispatch::domain::types::{PartState, Priority};
use test_helpers::{add_mechanic, create_request, create_test_state, default_new_part};

#[test]
fn test_add_part_defaults_to_ordered() {
    let (_db, state) = create_test_state();
    let request_id = create_request(&state, "Harish", Priority::High, (2023, 6, 15));

    let part = state
        .parts_api
        .add_part(&request_id, default_new_part("Brake Pads"), Some("Bennet"))
        .unwrap();

    assert_eq!(part.part_index, 0);
    assert_eq!(part.fulfill_state, "ORDERED");
    assert_eq!(part.progress_percent, 25);
}

#[test]
fn test_add_part_in_stock_is_terminal() {
    let (_db, state) = create_test_state();
    let request_id = create_request(&state, "Harish", Priority::High, (2023, 6, 15));

    let part = state
        .parts_api
        .add_part(
            &request_id,
            NewPart {
                in_stock: true,
                ..default_new_part("Oil Filter")
            },
            None,
        )
        .unwrap();

    assert_eq!(part.fulfill_state, "IN_STOCK");
    assert_eq!(part.progress_percent, 100);

    // IN_STOCK 为终态,不参与履约链
    let err = state
        .parts_api
        .advance_part(&request_id, part.part_index, PartState::Shipped, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidPartTransition { .. }));
}

#[test]
fn test_advance_along_fulfillment_chain() {
    let (_db, state) = create_test_state();
    let request_id = create_request(&state, "Sarah", Priority::Medium, (2023, 6, 16));
    let part = state
        .parts_api
        .add_part(&request_id, default_new_part("Water Pump"), None)
        .unwrap();

    let p = state
        .parts_api
        .advance_part(&request_id, part.part_index, PartState::Shipped, None)
        .unwrap();
    assert_eq!(p.fulfill_state, "SHIPPED");
    assert_eq!(p.progress_percent, 50);

    let p = state
        .parts_api
        .advance_part(&request_id, part.part_index, PartState::Delivered, None)
        .unwrap();
    assert_eq!(p.progress_percent, 75);

    let p = state
        .parts_api
        .advance_part(&request_id, part.part_index, PartState::Installed, None)
        .unwrap();
    assert_eq!(p.progress_percent, 100);
}

#[test]
fn test_advance_never_regresses() {
    let (_db, state) = create_test_state();
    let request_id = create_request(&state, "Emma", Priority::Low, (2023, 6, 17));
    let part = state
        .parts_api
        .add_part(&request_id, default_new_part("Radiator Hose"), None)
        .unwrap();

    state
        .parts_api
        .advance_part(&request_id, part.part_index, PartState::Delivered, None)
        .unwrap();

    // 回退
    let err = state
        .parts_api
        .advance_part(&request_id, part.part_index, PartState::Shipped, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidPartTransition { .. }));

    // 原地踏步
    let err = state
        .parts_api
        .advance_part(&request_id, part.part_index, PartState::Delivered, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidPartTransition { .. }));

    // 失败不改变状态
    let parts = state.parts_api.list_parts(&request_id).unwrap();
    assert_eq!(parts[0].fulfill_state, "DELIVERED");
}

#[test]
fn test_advance_may_skip_forward() {
    let (_db, state) = create_test_state();
    let request_id = create_request(&state, "Raj", Priority::Low, (2023, 6, 18));
    let part = state
        .parts_api
        .add_part(&request_id, default_new_part("Spark Plugs"), None)
        .unwrap();

    // 现场上报滞后时允许跨步: ORDERED -> INSTALLED
    let p = state
        .parts_api
        .advance_part(&request_id, part.part_index, PartState::Installed, None)
        .unwrap();
    assert_eq!(p.fulfill_state, "INSTALLED");
}

#[test]
fn test_part_validation_and_not_found() {
    let (_db, state) = create_test_state();
    let request_id = create_request(&state, "Harish", Priority::High, (2023, 6, 15));

    // 名称为空
    let err = state
        .parts_api
        .add_part(
            &request_id,
            NewPart {
                part_name: "  ".to_string(),
                ..default_new_part("x")
            },
            None,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    // 数量非法
    let err = state
        .parts_api
        .add_part(
            &request_id,
            NewPart {
                quantity: 0,
                ..default_new_part("Brake Pads")
            },
            None,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    // 未知请求
    let err = state
        .parts_api
        .add_part("no-such-request", default_new_part("Brake Pads"), None)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // 未知配件序号
    let err = state
        .parts_api
        .advance_part(&request_id, 7, PartState::Shipped, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_parts_keep_insertion_order_and_log_lifecycle() {
    let (_db, state) = create_test_state();
    let mechanic_id = add_mechanic(&state, "Bennet", "Engine", 4);
    let request_id = create_request(&state, "Harish", Priority::High, (2023, 6, 15));

    state
        .parts_api
        .add_part(&request_id, default_new_part("Brake Pads"), Some("Bennet"))
        .unwrap();
    state
        .parts_api
        .add_part(
            &request_id,
            NewPart {
                in_stock: true,
                ..default_new_part("Oil Filter")
            },
            Some("Bennet"),
        )
        .unwrap();

    let parts = state.parts_api.list_parts(&request_id).unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].part_index, 0);
    assert_eq!(parts[0].part_name, "Brake Pads");
    assert_eq!(parts[1].part_index, 1);
    assert_eq!(parts[1].part_name, "Oil Filter");

    // 完工后仍可推进配件履约 (独立于工单生命周期)
    state.dispatch_api.assign(&request_id, &mechanic_id, None).unwrap();
    state.dispatch_api.complete(&request_id, None, None, None).unwrap();
    state
        .parts_api
        .advance_part(&request_id, 0, PartState::Shipped, Some("Bennet"))
        .unwrap();

    // 审计: 创建 + 配件x2 + 派工 + 完工 + 推进 = 6 条
    let trail = state.request_api.audit_trail(&request_id).unwrap();
    assert_eq!(trail.len(), 6);
    assert_eq!(trail[0].action, "Order Created");
    assert_eq!(trail[1].action, "Parts Ordered");
    assert_eq!(trail[2].action, "Parts In Stock");
    assert_eq!(trail[3].action, "Order Assigned");
    assert_eq!(trail[4].action, "Work Completed");
    assert_eq!(trail[5].action, "Parts Shipped");
}
