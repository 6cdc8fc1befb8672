// ==========================================
// 汽车维修派工系统 - 派工事务仓储
// ==========================================
// 职责: 把一次已校验的状态转换 (请求行 + 技师负载 + 日志行)
//       作为单个事务原子提交
// 红线: 不做业务判断 —— 新字段值与前置状态由派工引擎算好后传入
// 说明: 引擎的校验读与本事务之间存在窗口,所以每条 UPDATE 都带
//       状态/负载护栏重新验证前置条件;并发竞争中恰好一个提交成功,
//       后到者拿到 0 行更新并映射为对应的领域错误
// ==========================================

use crate::domain::audit::AuditEntry;
use crate::domain::request::ServiceRequest;
use crate::domain::types::RequestState;
use crate::repository::audit_log_repo::insert_audit_entry;
use crate::repository::convert::TS_FORMAT;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// DispatchRepository - 派工事务仓储
// ==========================================
pub struct DispatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DispatchRepository {
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

    /// 原子提交一次状态转换
    ///
    /// 同一事务内:
    /// 1. 覆写请求行的状态机字段 (护栏: 当前状态必须仍为 expected_status)
    /// 2. 技师负载按 load_delta 调整 (护栏: 调整后必须落在 [0, max_load])
    /// 3. 追加操作日志
    ///
    /// 任一步失败整体回滚,实体保持不变
    ///
    /// # 返回
    /// - Err(InvalidStateTransition): 请求状态已被并发修改
    /// - Err(LoadOutOfRange): 技师负载调整越界
    pub fn commit_transition(
        &self,
        request: &ServiceRequest,
        expected_status: RequestState,
        mechanic_id: &str,
        load_delta: i32,
        updated_at: NaiveDateTime,
        entry: &AuditEntry,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let rows = tx.execute(
            r#"
            UPDATE service_request SET
                status = ?2,
                assigned_mechanic_id = ?3,
                assigned_at = ?4,
                completed_at = ?5,
                actual_cost = ?6,
                service_rating = ?7
            WHERE request_id = ?1 AND status = ?8
            "#,
            params![
                request.request_id,
                request.status.to_db_str(),
                request.assigned_mechanic_id,
                request.assigned_at.map(|t| t.format(TS_FORMAT).to_string()),
                request.completed_at.map(|t| t.format(TS_FORMAT).to_string()),
                request.actual_cost,
                request.service_rating,
                expected_status.to_db_str(),
            ],
        )?;
        if rows == 0 {
            // 区分: 请求不存在 vs 状态已被并发修改
            let actual: Option<String> = tx
                .query_row(
                    "SELECT status FROM service_request WHERE request_id = ?1",
                    params![request.request_id],
                    |row| row.get(0),
                )
                .optional()?;
            return match actual {
                Some(status) => Err(RepositoryError::InvalidStateTransition {
                    from: status,
                    to: request.status.to_db_str().to_string(),
                }),
                None => Err(RepositoryError::NotFound {
                    entity: "ServiceRequest".to_string(),
                    id: request.request_id.clone(),
                }),
            };
        }

        let rows = tx.execute(
            r#"
            UPDATE mechanic SET current_load = current_load + ?2, updated_at = ?3
            WHERE mechanic_id = ?1
              AND current_load + ?2 >= 0
              AND current_load + ?2 <= max_load
            "#,
            params![
                mechanic_id,
                load_delta,
                updated_at.format(TS_FORMAT).to_string(),
            ],
        )?;
        if rows == 0 {
            let actual: Option<(i32, i32)> = tx
                .query_row(
                    "SELECT current_load, max_load FROM mechanic WHERE mechanic_id = ?1",
                    params![mechanic_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            return match actual {
                Some((current_load, max_load)) => Err(RepositoryError::LoadOutOfRange {
                    mechanic_id: mechanic_id.to_string(),
                    current_load,
                    max_load,
                }),
                None => Err(RepositoryError::NotFound {
                    entity: "Mechanic".to_string(),
                    id: mechanic_id.to_string(),
                }),
            };
        }

        insert_audit_entry(&tx, entry)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}
