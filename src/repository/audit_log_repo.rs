// ==========================================
// 汽车维修派工系统 - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 红线: audit_log 只追加 —— 本仓储不提供 UPDATE/DELETE
// ==========================================

use crate::domain::audit::AuditEntry;
use crate::repository::convert::{parse_ts, TS_FORMAT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// AuditLogRepository - 操作日志仓储
// ==========================================
pub struct AuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogRepository {
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

    /// 追加操作日志
    ///
    /// # 返回
    /// - Ok(entry_id): 成功追加
    pub fn insert(&self, entry: &AuditEntry) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_audit_entry(&conn, entry)?;
        Ok(entry.entry_id.clone())
    }

    /// 查询指定请求的完整日志 (最早在前)
    ///
    /// 排序: entry_ts 升序,同秒内按插入顺序 (rowid)
    pub fn list_by_request(&self, request_id: &str) -> RepositoryResult<Vec<AuditEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT entry_id, request_id, action, detail, actor, entry_ts
            FROM audit_log
            WHERE request_id = ?1
            ORDER BY entry_ts ASC, rowid ASC
            "#,
        )?;

        let rows = stmt.query_map(params![request_id], map_audit_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 按请求计数
    pub fn count_by_request(&self, request_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM audit_log WHERE request_id = ?1",
            params![request_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// 在给定连接/事务上追加一条日志
///
/// 供跨表事务复用: 状态转换与其日志必须在同一事务内提交
pub(crate) fn insert_audit_entry(
    conn: &Connection,
    entry: &AuditEntry,
) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO audit_log (entry_id, request_id, action, detail, actor, entry_ts)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            entry.entry_id,
            entry.request_id,
            entry.action,
            entry.detail,
            entry.actor,
            entry.entry_ts.format(TS_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// audit_log 行映射
fn map_audit_row(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
    Ok(AuditEntry {
        entry_id: row.get(0)?,
        request_id: row.get(1)?,
        action: row.get(2)?,
        detail: row.get(3)?,
        actor: row.get(4)?,
        entry_ts: parse_ts(5, &row.get::<_, String>(5)?)?,
    })
}
