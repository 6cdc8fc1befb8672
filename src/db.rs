// ==========================================
// 汽车维修派工系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中建表语句，保证测试库与正式库 schema 一致
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 表结构：
/// - mechanic: 技师主数据 + 负载计数（状态不落库，由负载推导）
/// - service_request: 服务请求/工单（状态机字段由引擎独占写入）
/// - part_usage: 配件使用子账（按 request_id + part_index 定位）
/// - audit_log: 操作日志（只追加，禁止 UPDATE/DELETE）
/// - config_kv: 全局配置键值
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS mechanic (
            mechanic_id      TEXT PRIMARY KEY,
            name             TEXT NOT NULL,
            specialization   TEXT NOT NULL,
            experience_years INTEGER NOT NULL DEFAULT 0,
            rating           REAL NOT NULL DEFAULT 0.0,
            current_load     INTEGER NOT NULL DEFAULT 0,
            max_load         INTEGER NOT NULL,
            created_at       TEXT NOT NULL,
            updated_at       TEXT NOT NULL,
            CHECK (current_load >= 0),
            CHECK (max_load > 0)
        );

        CREATE TABLE IF NOT EXISTS service_request (
            request_id           TEXT PRIMARY KEY,
            customer_name        TEXT NOT NULL,
            customer_contact     TEXT,
            vehicle_info         TEXT NOT NULL,
            issue                TEXT NOT NULL,
            priority             TEXT NOT NULL,
            status               TEXT NOT NULL,
            created_date         TEXT NOT NULL,
            -- 软引用: 技师离职删除后,历史工单仍保留其ID
            assigned_mechanic_id TEXT,
            assigned_at          TEXT,
            completed_at         TEXT,
            actual_cost          REAL,
            service_rating       REAL
        );

        CREATE INDEX IF NOT EXISTS idx_service_request_status
            ON service_request(status);

        CREATE TABLE IF NOT EXISTS part_usage (
            request_id         TEXT NOT NULL REFERENCES service_request(request_id),
            part_index         INTEGER NOT NULL,
            part_name          TEXT NOT NULL,
            part_number        TEXT,
            quantity           INTEGER NOT NULL DEFAULT 1,
            unit_cost          REAL,
            supplier           TEXT,
            fulfill_state      TEXT NOT NULL,
            estimated_delivery TEXT,
            PRIMARY KEY (request_id, part_index)
        );

        CREATE TABLE IF NOT EXISTS audit_log (
            entry_id   TEXT PRIMARY KEY,
            request_id TEXT NOT NULL REFERENCES service_request(request_id),
            action     TEXT NOT NULL,
            detail     TEXT,
            actor      TEXT NOT NULL,
            entry_ts   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_audit_log_request
            ON audit_log(request_id);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id   TEXT NOT NULL DEFAULT 'global',
            key        TEXT NOT NULL,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;
    Ok(())
}
