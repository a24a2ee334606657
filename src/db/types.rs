//! Row normalization.
//!
//! Every backend row is converted into a [`JsonRow`] in select-list order.
//! Conversion is two-phase:
//! 1. `categorize_type` classifies the backend's type name
//! 2. a dialect decoder extracts the value for that category
//!
//! PostgreSQL values the typed decoders cannot handle fall back to the text
//! the server rendered, which is available for results of queries run
//! without parameters.
//!
//! SQLite is dynamically typed, so its decoder classifies each value by its
//! runtime storage class instead of the declared column type.

use crate::models::JsonRow;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::{PgRow, PgTypeInfo, PgTypeKind, PgValueFormat, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, ColumnIndex, Decode, Row, Type, TypeInfo, ValueRef};

/// Logical category for a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Interval,
    /// PostgreSQL array of any element type
    Array,
}

/// Classify a backend type name (as reported by the driver).
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let upper = type_name.trim().to_ascii_uppercase();
    let base = upper.trim_end_matches(" UNSIGNED");

    // sqlx reports arrays as "INT4[]"; unresolved array types keep the "_int4" form
    if base.ends_with("[]") || base.starts_with('_') {
        return TypeCategory::Array;
    }

    match base {
        "BOOL" | "BOOLEAN" => TypeCategory::Boolean,
        "INT2" | "INT4" | "INT8" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER"
        | "BIGINT" => TypeCategory::Integer,
        "FLOAT4" | "FLOAT8" | "FLOAT" | "REAL" | "DOUBLE" | "DOUBLE PRECISION" => {
            TypeCategory::Float
        }
        "NUMERIC" | "DECIMAL" => TypeCategory::Decimal,
        "JSON" | "JSONB" => TypeCategory::Json,
        "BYTEA" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => {
            TypeCategory::Binary
        }
        "DATE" => TypeCategory::Date,
        "TIME" => TypeCategory::Time,
        "TIMESTAMP" | "DATETIME" => TypeCategory::Timestamp,
        "TIMESTAMPTZ" => TypeCategory::TimestampTz,
        "UUID" => TypeCategory::Uuid,
        "INTERVAL" => TypeCategory::Interval,
        _ => TypeCategory::Text,
    }
}

/// DECIMAL/NUMERIC kept as the backend's exact text.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        categorize_type(ty.name()) == TypeCategory::Decimal
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        categorize_type(ty.name()) == TypeCategory::Decimal
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        // Binary NUMERIC is base-10000 digit groups, not text.
        if value.format() != PgValueFormat::Text {
            return Err("binary NUMERIC is not text".into());
        }
        let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

/// Binary payloads: UTF-8 text stays text, anything else is base64.
pub fn binary_to_json(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

fn float_to_json(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

/// JSON array of nullable elements.
fn array_to_json<T>(items: Vec<Option<T>>, element: impl Fn(T) -> JsonValue) -> JsonValue {
    JsonValue::Array(
        items
            .into_iter()
            .map(|item| item.map_or(JsonValue::Null, &element))
            .collect(),
    )
}

/// Decode a nullable column, treating decode failures as absent.
fn opt<'r, R, T>(row: &'r R, idx: usize) -> Option<T>
where
    R: Row,
    usize: ColumnIndex<R>,
    T: Decode<'r, R::Database> + Type<R::Database>,
{
    row.try_get::<Option<T>, _>(idx).ok().flatten()
}

fn is_null<R>(row: &R, idx: usize) -> bool
where
    R: Row,
    usize: ColumnIndex<R>,
{
    row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(true)
}

/// Conversion of a driver row into the normalized row shape.
pub trait RowToJson {
    fn column_names(&self) -> Vec<String>;
    fn to_json_row(&self) -> JsonRow;
}

impl RowToJson for PgRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_json_row(&self) -> JsonRow {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                (col.name().to_string(), postgres::decode_column(self, idx, category))
            })
            .collect()
    }
}

impl RowToJson for MySqlRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_json_row(&self) -> JsonRow {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                (col.name().to_string(), mysql::decode_column(self, idx, category))
            })
            .collect()
    }
}

impl RowToJson for SqliteRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_json_row(&self) -> JsonRow {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let declared = categorize_type(col.type_info().name());
                (col.name().to_string(), sqlite::decode_column(self, idx, declared))
            })
            .collect()
    }
}

mod postgres {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
    use rust_decimal::Decimal;
    use sqlx::postgres::types::PgInterval;
    use uuid::Uuid;

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> JsonValue {
        if is_null(row, idx) {
            return JsonValue::Null;
        }

        let value = match category {
            TypeCategory::Integer => opt::<_, i64>(row, idx)
                .or_else(|| opt::<_, i32>(row, idx).map(i64::from))
                .or_else(|| opt::<_, i16>(row, idx).map(i64::from))
                .map(JsonValue::from),
            TypeCategory::Float => opt::<_, f64>(row, idx)
                .or_else(|| opt::<_, f32>(row, idx).map(f64::from))
                .map(float_to_json),
            // Text keeps digits beyond Decimal's 28; binary goes through Decimal.
            TypeCategory::Decimal => opt::<_, RawDecimal>(row, idx)
                .map(|d| d.0)
                .or_else(|| opt::<_, Decimal>(row, idx).map(|d| d.to_string()))
                .map(JsonValue::String),
            TypeCategory::Boolean => opt::<_, bool>(row, idx).map(JsonValue::Bool),
            TypeCategory::Binary => opt::<_, Vec<u8>>(row, idx).map(|b| binary_to_json(&b)),
            TypeCategory::Json => opt::<_, JsonValue>(row, idx),
            TypeCategory::Date => opt::<_, NaiveDate>(row, idx).map(|d| d.to_string().into()),
            TypeCategory::Time => opt::<_, NaiveTime>(row, idx).map(|t| t.to_string().into()),
            TypeCategory::Timestamp => {
                opt::<_, NaiveDateTime>(row, idx).map(|t| t.to_string().into())
            }
            TypeCategory::TimestampTz => {
                opt::<_, DateTime<Utc>>(row, idx).map(|t| t.to_rfc3339().into())
            }
            TypeCategory::Uuid => opt::<_, Uuid>(row, idx).map(|u| u.to_string().into()),
            TypeCategory::Interval => opt::<_, PgInterval>(row, idx)
                .map(|iv| format_interval(iv.months, iv.days, iv.microseconds).into()),
            TypeCategory::Array => decode_array(row, idx),
            TypeCategory::Text => opt::<_, String>(row, idx).map(JsonValue::String),
        };

        value.or_else(|| server_text(row, idx)).unwrap_or_else(|| {
            tracing::debug!(column = idx, ?category, "Unsupported PostgreSQL value, emitting null");
            JsonValue::Null
        })
    }

    /// Arrays of common element types; anything else is left to the text fallback.
    fn decode_array(row: &PgRow, idx: usize) -> Option<JsonValue> {
        opt::<_, Vec<Option<i64>>>(row, idx)
            .map(|v| array_to_json(v, JsonValue::from))
            .or_else(|| opt::<_, Vec<Option<i32>>>(row, idx).map(|v| array_to_json(v, JsonValue::from)))
            .or_else(|| opt::<_, Vec<Option<i16>>>(row, idx).map(|v| array_to_json(v, JsonValue::from)))
            .or_else(|| opt::<_, Vec<Option<f64>>>(row, idx).map(|v| array_to_json(v, float_to_json)))
            .or_else(|| opt::<_, Vec<Option<bool>>>(row, idx).map(|v| array_to_json(v, JsonValue::Bool)))
            .or_else(|| {
                opt::<_, Vec<Option<String>>>(row, idx).map(|v| array_to_json(v, JsonValue::String))
            })
            .or_else(|| {
                opt::<_, Vec<Option<Uuid>>>(row, idx)
                    .map(|v| array_to_json(v, |u| JsonValue::String(u.to_string())))
            })
            .or_else(|| {
                opt::<_, Vec<Option<Decimal>>>(row, idx)
                    .map(|v| array_to_json(v, |d| JsonValue::String(d.to_string())))
            })
    }

    /// The value as the server rendered it.
    ///
    /// Only text-format results qualify, except enum labels, which are
    /// plain text in both formats.
    fn server_text(row: &PgRow, idx: usize) -> Option<JsonValue> {
        let value = row.try_get_raw(idx).ok()?;
        let is_enum = matches!(value.type_info().kind(), PgTypeKind::Enum(_));
        if value.format() != PgValueFormat::Text && !is_enum {
            return None;
        }
        <&str as Decode<sqlx::Postgres>>::decode(value)
            .ok()
            .map(|s| JsonValue::String(s.to_string()))
    }

    /// Interval in the server's default `postgres` output style,
    /// e.g. `1 year 2 mons 3 days 04:05:06.5`.
    pub fn format_interval(months: i32, days: i32, microseconds: i64) -> String {
        fn unit(n: i64, singular: &str, plural: &str) -> String {
            format!("{} {}", n, if n == 1 { singular } else { plural })
        }

        let mut parts = Vec::new();
        let (years, months) = (i64::from(months / 12), i64::from(months % 12));
        if years != 0 {
            parts.push(unit(years, "year", "years"));
        }
        if months != 0 {
            parts.push(unit(months, "mon", "mons"));
        }
        if days != 0 {
            parts.push(unit(i64::from(days), "day", "days"));
        }

        if microseconds != 0 || parts.is_empty() {
            let sign = if microseconds < 0 { "-" } else { "" };
            let total = microseconds.unsigned_abs();
            let (secs, frac) = (total / 1_000_000, total % 1_000_000);
            let mut clock = format!(
                "{}{:02}:{:02}:{:02}",
                sign,
                secs / 3600,
                (secs / 60) % 60,
                secs % 60
            );
            if frac != 0 {
                let digits = format!("{:06}", frac);
                clock.push('.');
                clock.push_str(digits.trim_end_matches('0'));
            }
            parts.push(clock);
        }
        parts.join(" ")
    }
}

mod mysql {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
        if is_null(row, idx) {
            return JsonValue::Null;
        }

        let value = match category {
            TypeCategory::Integer => opt::<_, i64>(row, idx)
                .map(JsonValue::from)
                .or_else(|| opt::<_, u64>(row, idx).map(JsonValue::from))
                .or_else(|| opt::<_, i32>(row, idx).map(JsonValue::from))
                .or_else(|| opt::<_, u32>(row, idx).map(JsonValue::from))
                .or_else(|| opt::<_, i16>(row, idx).map(JsonValue::from))
                .or_else(|| opt::<_, u16>(row, idx).map(JsonValue::from))
                .or_else(|| opt::<_, i8>(row, idx).map(JsonValue::from))
                .or_else(|| opt::<_, u8>(row, idx).map(JsonValue::from)),
            TypeCategory::Float => opt::<_, f64>(row, idx)
                .or_else(|| opt::<_, f32>(row, idx).map(f64::from))
                .map(float_to_json),
            TypeCategory::Decimal => {
                opt::<_, RawDecimal>(row, idx).map(|d| JsonValue::String(d.0))
            }
            TypeCategory::Boolean => opt::<_, bool>(row, idx).map(JsonValue::Bool),
            TypeCategory::Binary => opt::<_, Vec<u8>>(row, idx).map(|b| binary_to_json(&b)),
            TypeCategory::Json => opt::<_, JsonValue>(row, idx),
            TypeCategory::Date => opt::<_, NaiveDate>(row, idx).map(|d| d.to_string().into()),
            TypeCategory::Time => opt::<_, NaiveTime>(row, idx).map(|t| t.to_string().into()),
            TypeCategory::Timestamp => opt::<_, NaiveDateTime>(row, idx)
                .map(|t| t.to_string().into())
                .or_else(|| opt::<_, DateTime<Utc>>(row, idx).map(|t| t.to_rfc3339().into())),
            TypeCategory::TimestampTz => {
                opt::<_, DateTime<Utc>>(row, idx).map(|t| t.to_rfc3339().into())
            }
            TypeCategory::Text
            | TypeCategory::Uuid
            | TypeCategory::Interval
            | TypeCategory::Array => opt::<_, String>(row, idx).map(JsonValue::String),
        };

        // information_schema and EXPLAIN output can arrive with a binary
        // collation, which the String decoder refuses.
        value
            .or_else(|| opt::<_, Vec<u8>>(row, idx).map(|b| binary_to_json(&b)))
            .unwrap_or_else(|| {
                tracing::debug!(column = idx, ?category, "Unsupported MySQL value, emitting null");
                JsonValue::Null
            })
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(row: &SqliteRow, idx: usize, declared: TypeCategory) -> JsonValue {
        let storage = match row.try_get_raw(idx) {
            Ok(raw) if !raw.is_null() => raw.type_info().name().to_ascii_uppercase(),
            _ => return JsonValue::Null,
        };

        let value = match storage.as_str() {
            "INTEGER" if declared == TypeCategory::Boolean => {
                opt::<_, bool>(row, idx).map(JsonValue::Bool)
            }
            "INTEGER" => opt::<_, i64>(row, idx).map(JsonValue::from),
            "REAL" => opt::<_, f64>(row, idx).map(float_to_json),
            "BLOB" => opt::<_, Vec<u8>>(row, idx).map(|b| binary_to_json(&b)),
            _ => opt::<_, String>(row, idx).map(|s| {
                if declared == TypeCategory::Json {
                    serde_json::from_str(&s).unwrap_or(JsonValue::String(s))
                } else {
                    JsonValue::String(s)
                }
            }),
        };

        value.unwrap_or(JsonValue::Null)
    }
}
