// ==========================================
// 汽车维修派工系统 - 配件使用数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑,只做数据映射
// 红线: 履约状态的合法性由配件追踪引擎校验后才到达这里
// ==========================================

use crate::domain::audit::AuditEntry;
use crate::domain::part::PartUsage;
use crate::domain::types::PartState;
use crate::repository::audit_log_repo::insert_audit_entry;
use crate::repository::convert::{invalid_enum, parse_date, DATE_FORMAT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// PartUsageRepository - 配件使用仓储
// ==========================================
pub struct PartUsageRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PartUsageRepository {
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

    /// 追加配件条目并同事务写日志
    ///
    /// part_index 在事务内分配 (当前最大序号 + 1),保证请求内保序
    ///
    /// # 返回
    /// - Ok(part_index): 分配到的序号
    pub fn insert_with_log(
        &self,
        part: &PartUsage,
        entry: &AuditEntry,
    ) -> RepositoryResult<i32> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let next_index: i32 = tx.query_row(
            "SELECT COALESCE(MAX(part_index) + 1, 0) FROM part_usage WHERE request_id = ?1",
            params![part.request_id],
            |row| row.get(0),
        )?;

        tx.execute(
            r#"
            INSERT INTO part_usage (
                request_id, part_index, part_name, part_number, quantity,
                unit_cost, supplier, fulfill_state, estimated_delivery
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                part.request_id,
                next_index,
                part.part_name,
                part.part_number,
                part.quantity,
                part.unit_cost,
                part.supplier,
                part.fulfill_state.to_db_str(),
                part.estimated_delivery.map(|d| d.format(DATE_FORMAT).to_string()),
            ],
        )?;

        insert_audit_entry(&tx, entry)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(next_index)
    }

    /// 更新履约状态并同事务写日志
    ///
    /// SQL 护栏 `fulfill_state = expected_state` 与更新同语句生效:
    /// 引擎校验与提交之间若有并发写入,后到者拿到 InvalidStateTransition
    /// 而不是覆写出一次回退
    pub fn update_state_with_log(
        &self,
        request_id: &str,
        part_index: i32,
        expected_state: PartState,
        new_state: PartState,
        entry: &AuditEntry,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let rows = tx.execute(
            r#"
            UPDATE part_usage SET fulfill_state = ?3
            WHERE request_id = ?1 AND part_index = ?2 AND fulfill_state = ?4
            "#,
            params![
                request_id,
                part_index,
                new_state.to_db_str(),
                expected_state.to_db_str()
            ],
        )?;
        if rows == 0 {
            // 区分: 条目不存在 vs 状态已被并发推进
            let actual: Option<String> = tx
                .query_row(
                    "SELECT fulfill_state FROM part_usage WHERE request_id = ?1 AND part_index = ?2",
                    params![request_id, part_index],
                    |row| row.get(0),
                )
                .optional()?;
            return match actual {
                Some(state) => Err(RepositoryError::InvalidStateTransition {
                    from: state,
                    to: new_state.to_db_str().to_string(),
                }),
                None => Err(RepositoryError::NotFound {
                    entity: "PartUsage".to_string(),
                    id: format!("{}#{}", request_id, part_index),
                }),
            };
        }

        insert_audit_entry(&tx, entry)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 按请求查询配件列表 (按序号)
    pub fn find_by_request(&self, request_id: &str) -> RepositoryResult<Vec<PartUsage>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE request_id = ?1 ORDER BY part_index",
            SELECT_PART
        ))?;

        let rows = stmt.query_map(params![request_id], map_part_row)?;
        let mut parts = Vec::new();
        for row in rows {
            parts.push(row?);
        }
        Ok(parts)
    }

    /// 按主键查询单条
    pub fn find_one(
        &self,
        request_id: &str,
        part_index: i32,
    ) -> RepositoryResult<Option<PartUsage>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE request_id = ?1 AND part_index = ?2",
            SELECT_PART
        ))?;

        let result = stmt
            .query_row(params![request_id, part_index], map_part_row)
            .optional()?;
        Ok(result)
    }
}

const SELECT_PART: &str = r#"
    SELECT request_id, part_index, part_name, part_number, quantity,
           unit_cost, supplier, fulfill_state, estimated_delivery
    FROM part_usage
"#;

/// part_usage 行映射
fn map_part_row(row: &Row<'_>) -> rusqlite::Result<PartUsage> {
    let state_str: String = row.get(7)?;
    Ok(PartUsage {
        request_id: row.get(0)?,
        part_index: row.get(1)?,
        part_name: row.get(2)?,
        part_number: row.get(3)?,
        quantity: row.get(4)?,
        unit_cost: row.get(5)?,
        supplier: row.get(6)?,
        fulfill_state: PartState::from_db_str(&state_str)
            .ok_or_else(|| invalid_enum(7, &state_str))?,
        estimated_delivery: row
            .get::<_, Option<String>>(8)?
            .map(|s| parse_date(8, &s))
            .transpose()?,
    })
}
