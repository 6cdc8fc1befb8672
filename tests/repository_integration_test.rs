// ==========================================
// 仓储层集成测试
// ==========================================
// 职责: 验证 SQL 查询语义 (排序/计数/序号分配/日志保序)
// ==========================================

use auto_repair_dispatch::db;
use auto_repair_dispatch::domain::audit::{ActionType, AuditEntry};
use auto_repair_dispatch::domain::mechanic::Mechanic;
use auto_repair_dispatch::domain::part::PartUsage;
use auto_repair_dispatch::domain::request::ServiceRequest;
use auto_repair_dispatch::domain::types::{PartState, Priority, RequestState};
use auto_repair_dispatch::repository::{
    AuditLogRepository, MechanicRepository, PartUsageRepository, ServiceRequestRepository,
};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_conn() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    db::configure_sqlite_connection(&conn).unwrap();
    db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn make_mechanic(id: &str, rating: f64, current_load: i32, max_load: i32) -> Mechanic {
    let now = Utc::now().naive_utc();
    Mechanic {
        mechanic_id: id.to_string(),
        name: format!("技师-{}", id),
        specialization: "Engine".to_string(),
        experience_years: 5,
        rating,
        current_load,
        max_load,
        created_at: now,
        updated_at: now,
    }
}

fn make_request(id: &str, status: RequestState) -> ServiceRequest {
    ServiceRequest {
        request_id: id.to_string(),
        customer_name: "Harish".to_string(),
        customer_contact: None,
        vehicle_info: "Toyota Camry 2018".to_string(),
        issue: "Engine overheating".to_string(),
        priority: Priority::High,
        created_date: NaiveDate::from_ymd_opt(2023, 6, 15).unwrap(),
        status,
        assigned_mechanic_id: None,
        assigned_at: None,
        completed_at: None,
        actual_cost: None,
        service_rating: None,
    }
}

fn seed_request(conn: &Arc<Mutex<Connection>>, id: &str) {
    let repo = ServiceRequestRepository::from_connection(conn.clone());
    let request = make_request(id, RequestState::Pending);
    let entry = AuditEntry::new(id, ActionType::OrderCreated, None, "tester");
    repo.insert_with_log(&request, &entry).unwrap();
}

#[test]
fn test_find_available_orders_by_load_then_rating() {
    let conn = setup_conn();
    let repo = MechanicRepository::from_connection(conn);

    // 负载 1 但评分最高 / 负载 0 评分居中 / 负载 0 评分最低 / 满载
    repo.insert(&make_mechanic("M1", 4.9, 1, 3)).unwrap();
    repo.insert(&make_mechanic("M2", 4.2, 0, 3)).unwrap();
    repo.insert(&make_mechanic("M3", 3.5, 0, 3)).unwrap();
    repo.insert(&make_mechanic("M4", 5.0, 2, 2)).unwrap();

    let available = repo.find_available().unwrap();
    let ids: Vec<&str> = available.iter().map(|m| m.mechanic_id.as_str()).collect();
    // 先按负载升序,同负载按评分降序;满载的 M4 被排除
    assert_eq!(ids, vec!["M2", "M3", "M1"]);
}

#[test]
fn test_find_by_status_and_counts() {
    let conn = setup_conn();
    let repo = ServiceRequestRepository::from_connection(conn.clone());

    seed_request(&conn, "SR001");
    seed_request(&conn, "SR002");
    let entry = AuditEntry::new("SR003", ActionType::OrderCreated, None, "tester");
    repo.insert_with_log(&make_request("SR003", RequestState::Completed), &entry)
        .unwrap();

    let pending = repo.find_by_status(RequestState::Pending).unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|r| r.status == RequestState::Pending));

    assert_eq!(repo.count_by_status(RequestState::Pending).unwrap(), 2);
    assert_eq!(repo.count_by_status(RequestState::Assigned).unwrap(), 0);
    assert_eq!(repo.count_by_status(RequestState::Completed).unwrap(), 1);
}

#[test]
fn test_part_index_allocated_per_request() {
    let conn = setup_conn();
    seed_request(&conn, "SR001");
    seed_request(&conn, "SR002");
    let repo = PartUsageRepository::from_connection(conn);

    let part = |request_id: &str, name: &str| PartUsage {
        request_id: request_id.to_string(),
        part_index: 0, // 由仓储在事务内分配
        part_name: name.to_string(),
        part_number: None,
        quantity: 1,
        unit_cost: None,
        supplier: None,
        fulfill_state: PartState::Ordered,
        estimated_delivery: None,
    };
    let entry = |request_id: &str| {
        AuditEntry::new(request_id, ActionType::PartsOrdered, None, "tester")
    };

    // 同一请求内序号递增,不同请求互不干扰
    assert_eq!(repo.insert_with_log(&part("SR001", "A"), &entry("SR001")).unwrap(), 0);
    assert_eq!(repo.insert_with_log(&part("SR001", "B"), &entry("SR001")).unwrap(), 1);
    assert_eq!(repo.insert_with_log(&part("SR002", "C"), &entry("SR002")).unwrap(), 0);
    assert_eq!(repo.insert_with_log(&part("SR001", "D"), &entry("SR001")).unwrap(), 2);

    let parts = repo.find_by_request("SR001").unwrap();
    let names: Vec<&str> = parts.iter().map(|p| p.part_name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "D"]);
}

#[test]
fn test_update_state_unknown_part_is_not_found() {
    let conn = setup_conn();
    seed_request(&conn, "SR001");
    let repo = PartUsageRepository::from_connection(conn);

    let entry = AuditEntry::new("SR001", ActionType::PartsShipped, None, "tester");
    let err = repo
        .update_state_with_log("SR001", 0, PartState::Ordered, PartState::Shipped, &entry)
        .unwrap_err();
    assert!(matches!(
        err,
        auto_repair_dispatch::repository::RepositoryError::NotFound { .. }
    ));
}

#[test]
fn test_update_state_guard_rejects_stale_expectation() {
    let conn = setup_conn();
    seed_request(&conn, "SR001");
    let repo = PartUsageRepository::from_connection(conn);

    let part = PartUsage {
        request_id: "SR001".to_string(),
        part_index: 0,
        part_name: "Brake Pads".to_string(),
        part_number: None,
        quantity: 1,
        unit_cost: None,
        supplier: None,
        fulfill_state: PartState::Ordered,
        estimated_delivery: None,
    };
    let entry = |action: ActionType| AuditEntry::new("SR001", action, None, "tester");
    repo.insert_with_log(&part, &entry(ActionType::PartsOrdered))
        .unwrap();

    repo.update_state_with_log(
        "SR001",
        0,
        PartState::Ordered,
        PartState::Installed,
        &entry(ActionType::PartsInstalled),
    )
    .unwrap();

    // 基于 ORDERED 旧读的提交必须被护栏拒绝,不得覆写出一次回退
    let err = repo
        .update_state_with_log(
            "SR001",
            0,
            PartState::Ordered,
            PartState::Shipped,
            &entry(ActionType::PartsShipped),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        auto_repair_dispatch::repository::RepositoryError::InvalidStateTransition { .. }
    ));

    let current = repo.find_one("SR001", 0).unwrap().unwrap();
    assert_eq!(current.fulfill_state, PartState::Installed);
}

#[test]
fn test_delete_if_idle_spares_loaded_mechanic() {
    let conn = setup_conn();
    let repo = MechanicRepository::from_connection(conn);

    repo.insert(&make_mechanic("M1", 4.5, 1, 3)).unwrap();
    repo.insert(&make_mechanic("M2", 4.0, 0, 3)).unwrap();

    // 护栏: 有负载的技师删不掉
    assert_eq!(repo.delete_if_idle("M1").unwrap(), 0);
    assert!(repo.find_by_id("M1").unwrap().is_some());

    // 空载技师正常删除
    assert_eq!(repo.delete_if_idle("M2").unwrap(), 1);
    assert!(repo.find_by_id("M2").unwrap().is_none());
}

#[test]
fn test_corrupt_stored_date_surfaces_error() {
    let conn = setup_conn();
    seed_request(&conn, "SR001");

    // 绕过引擎写坏日期列: 读取必须报错,不得静默回退
    conn.lock()
        .unwrap()
        .execute(
            "UPDATE service_request SET created_date = 'not-a-date' WHERE request_id = 'SR001'",
            [],
        )
        .unwrap();

    let repo = ServiceRequestRepository::from_connection(conn);
    assert!(repo.find_by_id("SR001").is_err());
}

#[test]
fn test_audit_log_preserves_insertion_order() {
    let conn = setup_conn();
    seed_request(&conn, "SR001");
    let repo = AuditLogRepository::from_connection(conn);

    // 同秒内多条写入,依赖 rowid 兜底保序
    repo.insert(&AuditEntry::new("SR001", ActionType::OrderAssigned, None, "admin"))
        .unwrap();
    repo.insert(&AuditEntry::new("SR001", ActionType::WorkCompleted, None, "Bennet"))
        .unwrap();
    repo.insert(&AuditEntry::new("SR001", ActionType::PartsOrdered, None, "Bennet"))
        .unwrap();

    let entries = repo.list_by_request("SR001").unwrap();
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(
        actions,
        vec!["Order Created", "Order Assigned", "Work Completed", "Parts Ordered"]
    );
    assert_eq!(repo.count_by_request("SR001").unwrap(), 4);
}

#[test]
fn test_audit_insert_rejects_unknown_request() {
    let conn = setup_conn();
    let repo = AuditLogRepository::from_connection(conn);

    // 外键保护: 日志不能挂到不存在的请求上
    let result = repo.insert(&AuditEntry::new(
        "no-such-request",
        ActionType::OrderCreated,
        None,
        "tester",
    ));
    assert!(matches!(
        result,
        Err(auto_repair_dispatch::repository::RepositoryError::ForeignKeyViolation(_))
    ));
}
