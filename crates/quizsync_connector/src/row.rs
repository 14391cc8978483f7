//! Decoding of database CLI JSON rows into records.
//!
//! The CLI emits rows as JSON objects. Booleans come back as 0/1 integers
//! and absent text as `null`, so decoding is explicit per record type rather
//! than relying on serde derive.

use crate::error::{ConnectorError, ConnectorResult};
use quizsync_model::{CategoryRecord, ItemRecord, SubItemRecord};
use serde_json::{Map, Value};

type Row = Map<String, Value>;

fn text(row: &Row, key: &str) -> ConnectorResult<String> {
    match row.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        other => Err(ConnectorError::Decode(format!(
            "column '{key}' is not text: {other:?}"
        ))),
    }
}

fn opt_text(row: &Row, key: &str) -> Option<String> {
    match row.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn integer(row: &Row, key: &str, default: i64) -> i64 {
    match row.get(key) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(default),
        _ => default,
    }
}

fn opt_integer(row: &Row, key: &str) -> Option<i64> {
    match row.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    }
}

fn real(row: &Row, key: &str, default: f64) -> f64 {
    match row.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        _ => default,
    }
}

fn boolean(row: &Row, key: &str, default: bool) -> bool {
    match row.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0).unwrap_or(default),
        _ => default,
    }
}

fn opt_boolean(row: &Row, key: &str) -> Option<bool> {
    match row.get(key) {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Decodes a `test_categories` row.
pub fn decode_category(row: &Row) -> ConnectorResult<CategoryRecord> {
    Ok(CategoryRecord {
        id: text(row, "id")?,
        code: text(row, "code")?,
        name: text(row, "name")?,
        description: opt_text(row, "description"),
        dimensions: opt_text(row, "dimensions"),
        scoring_type: opt_text(row, "scoring_type"),
        min_score: integer(row, "min_score", 0),
        max_score: integer(row, "max_score", 0),
        estimated_time: opt_integer(row, "estimated_time"),
        is_active: boolean(row, "is_active", false),
        sort_order: integer(row, "sort_order", 0),
        created_at: opt_text(row, "created_at"),
        updated_at: opt_text(row, "updated_at"),
    })
}

/// Decodes a `questions` row.
pub fn decode_item(row: &Row) -> ConnectorResult<ItemRecord> {
    Ok(ItemRecord {
        id: text(row, "id")?,
        category_id: text(row, "category_id")?,
        text: text(row, "text")?,
        text_en: opt_text(row, "text_en"),
        item_type: text(row, "type")?,
        dimension: opt_text(row, "dimension"),
        domain: opt_text(row, "domain"),
        weight: real(row, "weight", 1.0),
        order_index: integer(row, "order_index", 0),
        is_required: boolean(row, "is_required", true),
        is_active: boolean(row, "is_active", false),
        is_reverse: opt_boolean(row, "is_reverse"),
        created_at: opt_text(row, "created_at"),
        updated_at: opt_text(row, "updated_at"),
    })
}

/// Decodes a `question_options` row.
pub fn decode_sub_item(row: &Row) -> ConnectorResult<SubItemRecord> {
    Ok(SubItemRecord {
        id: text(row, "id")?,
        item_id: text(row, "question_id")?,
        text: text(row, "text")?,
        text_en: opt_text(row, "text_en"),
        value: text(row, "value")?,
        score: real(row, "score", 0.0),
        description: opt_text(row, "description"),
        order_index: integer(row, "order_index", 0),
        is_correct: boolean(row, "is_correct", false),
        is_active: boolean(row, "is_active", false),
        created_at: opt_text(row, "created_at"),
    })
}

/// Extracts the single count column from a `SELECT COUNT(*) AS n` row set.
pub fn decode_count(rows: &[Row]) -> ConnectorResult<u64> {
    let row = rows
        .first()
        .ok_or_else(|| ConnectorError::Decode("count query returned no rows".into()))?;
    match row.get("n") {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| ConnectorError::Decode(format!("count is not unsigned: {n}"))),
        other => Err(ConnectorError::Decode(format!(
            "count column missing or non-numeric: {other:?}"
        ))),
    }
}
