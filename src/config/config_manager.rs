// ==========================================
// 汽车维修派工系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value, scope_id='global')
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键全集
// ==========================================
pub mod config_keys {
    /// 新增技师时未指定产能的缺省值
    pub const DEFAULT_MAX_LOAD: &str = "default_max_load";
    /// 未指定操作人时记入日志的缺省身份
    pub const DEFAULT_ACTOR: &str = "default_actor";
}

/// 缺省最大并行工单数
const FALLBACK_MAX_LOAD: i32 = 5;
/// 缺省操作人
const FALLBACK_ACTOR: &str = "system";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Ok(Some(String)): 配置值
    /// - Ok(None): 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值 (覆写)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT (scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 缺省最大并行工单数 (未配置或非法值时回退内置缺省)
    pub fn get_default_max_load(&self) -> RepositoryResult<i32> {
        let value = self.get_global_config_value(config_keys::DEFAULT_MAX_LOAD)?;
        Ok(value
            .and_then(|v| v.parse::<i32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(FALLBACK_MAX_LOAD))
    }

    /// 缺省操作人
    pub fn get_default_actor(&self) -> RepositoryResult<String> {
        let value = self.get_global_config_value(config_keys::DEFAULT_ACTOR)?;
        Ok(value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_ACTOR.to_string()))
    }
}
