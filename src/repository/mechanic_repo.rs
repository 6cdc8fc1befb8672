// ==========================================
// 汽车维修派工系统 - 技师数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑,只做数据映射
// 红线: current_load 的修改只发生在 DispatchRepository 的事务提交中
// ==========================================

use crate::domain::mechanic::Mechanic;
use crate::repository::convert::{parse_ts, TS_FORMAT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// MechanicRepository - 技师仓储
// ==========================================
/// 技师仓储
/// 职责: 管理 mechanic 表的 CRUD 操作
pub struct MechanicRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MechanicRepository {
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

    /// 插入技师
    pub fn insert(&self, mechanic: &Mechanic) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO mechanic (
                mechanic_id, name, specialization, experience_years, rating,
                current_load, max_load, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                mechanic.mechanic_id,
                mechanic.name,
                mechanic.specialization,
                mechanic.experience_years,
                mechanic.rating,
                mechanic.current_load,
                mechanic.max_load,
                mechanic.created_at.format(TS_FORMAT).to_string(),
                mechanic.updated_at.format(TS_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询
    ///
    /// # 返回
    /// - Ok(Some(Mechanic)): 找到技师
    /// - Ok(None): 未找到
    /// - Err: 数据库错误
    pub fn find_by_id(&self, mechanic_id: &str) -> RepositoryResult<Option<Mechanic>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT mechanic_id, name, specialization, experience_years, rating,
                   current_load, max_load, created_at, updated_at
            FROM mechanic
            WHERE mechanic_id = ?1
            "#,
        )?;

        let result = stmt
            .query_row(params![mechanic_id], map_mechanic_row)
            .optional()?;
        Ok(result)
    }

    /// 查询全部技师 (按ID排序)
    pub fn list_all(&self) -> RepositoryResult<Vec<Mechanic>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT mechanic_id, name, specialization, experience_years, rating,
                   current_load, max_load, created_at, updated_at
            FROM mechanic
            ORDER BY mechanic_id
            "#,
        )?;

        let rows = stmt.query_map([], map_mechanic_row)?;
        let mut mechanics = Vec::new();
        for row in rows {
            mechanics.push(row?);
        }
        Ok(mechanics)
    }

    /// 查询可接单技师
    ///
    /// 排序: current_load 升序 (均衡负载优先), rating 降序
    pub fn find_available(&self) -> RepositoryResult<Vec<Mechanic>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT mechanic_id, name, specialization, experience_years, rating,
                   current_load, max_load, created_at, updated_at
            FROM mechanic
            WHERE current_load < max_load
            ORDER BY current_load ASC, rating DESC
            "#,
        )?;

        let rows = stmt.query_map([], map_mechanic_row)?;
        let mut mechanics = Vec::new();
        for row in rows {
            mechanics.push(row?);
        }
        Ok(mechanics)
    }

    /// 删除空载技师
    ///
    /// SQL 护栏 `current_load = 0` 与删除同语句生效:
    /// 校验与删除之间没有窗口,正在接单的技师不会被删掉
    ///
    /// # 返回
    /// - Ok(rows): 删除的行数 (0 表示技师不存在或仍有负载,由调用方区分)
    pub fn delete_if_idle(&self, mechanic_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM mechanic WHERE mechanic_id = ?1 AND current_load = 0",
            params![mechanic_id],
        )?;
        Ok(rows)
    }
}

/// mechanic 行映射
fn map_mechanic_row(row: &Row<'_>) -> rusqlite::Result<Mechanic> {
    Ok(Mechanic {
        mechanic_id: row.get(0)?,
        name: row.get(1)?,
        specialization: row.get(2)?,
        experience_years: row.get(3)?,
        rating: row.get(4)?,
        current_load: row.get(5)?,
        max_load: row.get(6)?,
        created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
        updated_at: parse_ts(8, &row.get::<_, String>(8)?)?,
    })
}
