// ==========================================
// 汽车维修派工系统 - 行值解析
// ==========================================
// 红线: 存储值损坏必须报错暴露,不做静默修复
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};

pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// 解析时间戳列
pub(crate) fn parse_ts(col: usize, s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).map_err(|_| invalid_value(col, s, "时间戳"))
}

/// 解析日期列
pub(crate) fn parse_date(col: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| invalid_value(col, s, "日期"))
}

/// 枚举列值非法 (数据被绕过引擎写坏时暴露)
pub(crate) fn invalid_enum(col: usize, value: &str) -> rusqlite::Error {
    invalid_value(col, value, "枚举值")
}

fn invalid_value(col: usize, value: &str, kind: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        col,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("非法{}: {}", kind, value),
        )),
    )
}
