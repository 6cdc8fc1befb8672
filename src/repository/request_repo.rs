// ==========================================
// 汽车维修派工系统 - 服务请求数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑,只做数据映射
// 红线: status/派工/完工字段的修改只发生在 DispatchRepository 的事务提交中
// ==========================================

use crate::domain::audit::AuditEntry;
use crate::domain::request::ServiceRequest;
use crate::domain::types::{Priority, RequestState};
use crate::repository::audit_log_repo::insert_audit_entry;
use crate::repository::convert::{invalid_enum, parse_date, parse_ts, DATE_FORMAT, TS_FORMAT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ServiceRequestRepository - 服务请求仓储
// ==========================================
/// 服务请求仓储
/// 职责: 管理 service_request 表的读写
pub struct ServiceRequestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ServiceRequestRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入新请求并同事务追加操作日志
    ///
    /// 说明: "创建工单"本身是改变状态的操作,日志与数据必须一起提交
    pub fn insert_with_log(
        &self,
        request: &ServiceRequest,
        entry: &AuditEntry,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO service_request (
                request_id, customer_name, customer_contact, vehicle_info, issue,
                priority, status, created_date,
                assigned_mechanic_id, assigned_at,
                completed_at, actual_cost, service_rating
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                request.request_id,
                request.customer_name,
                request.customer_contact,
                request.vehicle_info,
                request.issue,
                request.priority.to_db_str(),
                request.status.to_db_str(),
                request.created_date.format(DATE_FORMAT).to_string(),
                request.assigned_mechanic_id,
                request.assigned_at.map(|t| t.format(TS_FORMAT).to_string()),
                request.completed_at.map(|t| t.format(TS_FORMAT).to_string()),
                request.actual_cost,
                request.service_rating,
            ],
        )?;

        insert_audit_entry(&tx, entry)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, request_id: &str) -> RepositoryResult<Option<ServiceRequest>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE request_id = ?1",
            SELECT_REQUEST
        ))?;

        let result = stmt
            .query_row(params![request_id], map_request_row)
            .optional()?;
        Ok(result)
    }

    /// 查询全部请求 (按创建日期、ID排序)
    pub fn list_all(&self) -> RepositoryResult<Vec<ServiceRequest>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_date, request_id",
            SELECT_REQUEST
        ))?;

        let rows = stmt.query_map([], map_request_row)?;
        collect_rows(rows)
    }

    /// 按状态查询
    ///
    /// 说明: 不做优先级排序 —— 排序是引擎层的业务规则 (RequestSorter)
    pub fn find_by_status(&self, status: RequestState) -> RepositoryResult<Vec<ServiceRequest>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE status = ?1",
            SELECT_REQUEST
        ))?;

        let rows = stmt.query_map(params![status.to_db_str()], map_request_row)?;
        collect_rows(rows)
    }

    /// 按状态计数 (驾驶舱汇总用)
    pub fn count_by_status(&self, status: RequestState) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM service_request WHERE status = ?1",
            params![status.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

const SELECT_REQUEST: &str = r#"
    SELECT request_id, customer_name, customer_contact, vehicle_info, issue,
           priority, status, created_date,
           assigned_mechanic_id, assigned_at,
           completed_at, actual_cost, service_rating
    FROM service_request
"#;

fn collect_rows(
    rows: rusqlite::MappedRows<'_, impl FnMut(&Row<'_>) -> rusqlite::Result<ServiceRequest>>,
) -> RepositoryResult<Vec<ServiceRequest>> {
    let mut requests = Vec::new();
    for row in rows {
        requests.push(row?);
    }
    Ok(requests)
}

/// service_request 行映射
pub(crate) fn map_request_row(row: &Row<'_>) -> rusqlite::Result<ServiceRequest> {
    let priority_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;

    Ok(ServiceRequest {
        request_id: row.get(0)?,
        customer_name: row.get(1)?,
        customer_contact: row.get(2)?,
        vehicle_info: row.get(3)?,
        issue: row.get(4)?,
        priority: Priority::from_db_str(&priority_str)
            .ok_or_else(|| invalid_enum(5, &priority_str))?,
        status: RequestState::from_db_str(&status_str)
            .ok_or_else(|| invalid_enum(6, &status_str))?,
        created_date: parse_date(7, &row.get::<_, String>(7)?)?,
        assigned_mechanic_id: row.get(8)?,
        assigned_at: row
            .get::<_, Option<String>>(9)?
            .map(|s| parse_ts(9, &s))
            .transpose()?,
        completed_at: row
            .get::<_, Option<String>>(10)?
            .map(|s| parse_ts(10, &s))
            .transpose()?,
        actual_cost: row.get(11)?,
        service_rating: row.get(12)?,
    })
}
