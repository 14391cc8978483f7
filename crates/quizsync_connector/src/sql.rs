//! Parameterized statement construction.
//!
//! This module is the only place SQL text is assembled. Statements are built
//! from templates with `?` placeholders and bound values; escaping happens
//! exactly once, in [`SqlValue::to_literal`], so injection safety is
//! structural rather than enforced by review.

use quizsync_model::{CategoryRecord, ItemRecord, SubItemRecord, WriteOp};
use std::fmt::Write as _;

/// A value bound into a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Text literal, escaped on render.
    Text(String),
    /// Integer literal.
    Integer(i64),
    /// Floating-point literal.
    Real(f64),
    /// Boolean, stored as 0/1.
    Bool(bool),
    /// SQL NULL.
    Null,
}

impl SqlValue {
    fn to_literal(&self) -> String {
        match self {
            SqlValue::Text(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('\'');
                for ch in s.chars() {
                    if ch == '\'' {
                        out.push('\'');
                    }
                    out.push(ch);
                }
                out.push('\'');
                out
            }
            SqlValue::Integer(n) => n.to_string(),
            SqlValue::Real(f) => {
                // Keep a decimal point so SQLite types the column as REAL.
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            SqlValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            SqlValue::Null => "NULL".to_string(),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(s: &String) -> Self {
        SqlValue::Text(s.clone())
    }
}

impl From<&Option<String>> for SqlValue {
    fn from(s: &Option<String>) -> Self {
        match s {
            Some(s) => SqlValue::Text(s.clone()),
            None => SqlValue::Null,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        SqlValue::Integer(n)
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(n: Option<i64>) -> Self {
        match n {
            Some(n) => SqlValue::Integer(n),
            None => SqlValue::Null,
        }
    }
}

impl From<f64> for SqlValue {
    fn from(f: f64) -> Self {
        SqlValue::Real(f)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Bool(b)
    }
}

impl From<Option<bool>> for SqlValue {
    fn from(b: Option<bool>) -> Self {
        match b {
            Some(b) => SqlValue::Bool(b),
            None => SqlValue::Null,
        }
    }
}

/// A statement template plus its bound values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    template: String,
    params: Vec<SqlValue>,
}

impl Statement {
    /// Creates a statement from a template with `?` placeholders.
    pub fn new(template: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            template: template.into(),
            params,
        }
    }

    /// Renders the final SQL text with all values bound and escaped.
    ///
    /// Placeholder and parameter counts must match; this is an internal
    /// construction invariant, so a mismatch is a bug in this module and
    /// trips the debug assertion below rather than producing malformed SQL
    /// at a distance.
    pub fn render(&self) -> String {
        debug_assert_eq!(
            self.template.matches('?').count(),
            self.params.len(),
            "placeholder/parameter count mismatch in: {}",
            self.template
        );

        let mut out = String::with_capacity(self.template.len() + self.params.len() * 8);
        let mut params = self.params.iter();
        for ch in self.template.chars() {
            if ch == '?' {
                match params.next() {
                    Some(value) => {
                        let _ = write!(out, "{}", value.to_literal());
                    }
                    None => out.push('?'),
                }
            } else {
                out.push(ch);
            }
        }
        out
    }
}

/// Renders a write op into a statement.
pub fn render_op(op: &WriteOp) -> Statement {
    match op {
        WriteOp::UpsertCategory(c) => upsert_category(c),
        WriteOp::UpsertItem(i) => upsert_item(i),
        WriteOp::UpsertSubItem(s) => upsert_sub_item(s),
        WriteOp::RemapItemCategory {
            legacy_id,
            canonical_id,
        } => Statement::new(
            "UPDATE questions SET category_id = ? WHERE category_id = ?;",
            vec![canonical_id.into(), legacy_id.into()],
        ),
        WriteOp::DeleteCategory { id } => Statement::new(
            "DELETE FROM test_categories WHERE id = ?;",
            vec![id.into()],
        ),
    }
}

fn upsert_category(c: &CategoryRecord) -> Statement {
    Statement::new(
        "INSERT OR REPLACE INTO test_categories \
         (id, code, name, description, dimensions, scoring_type, min_score, max_score, \
          estimated_time, is_active, sort_order, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);",
        vec![
            (&c.id).into(),
            (&c.code).into(),
            (&c.name).into(),
            (&c.description).into(),
            (&c.dimensions).into(),
            (&c.scoring_type).into(),
            c.min_score.into(),
            c.max_score.into(),
            c.estimated_time.into(),
            c.is_active.into(),
            c.sort_order.into(),
            (&c.created_at).into(),
            (&c.updated_at).into(),
        ],
    )
}

fn upsert_item(i: &ItemRecord) -> Statement {
    Statement::new(
        "INSERT OR REPLACE INTO questions \
         (id, category_id, text, text_en, type, dimension, domain, weight, order_index, \
          is_required, is_active, is_reverse, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);",
        vec![
            (&i.id).into(),
            (&i.category_id).into(),
            (&i.text).into(),
            (&i.text_en).into(),
            (&i.item_type).into(),
            (&i.dimension).into(),
            (&i.domain).into(),
            i.weight.into(),
            i.order_index.into(),
            i.is_required.into(),
            i.is_active.into(),
            i.is_reverse.into(),
            (&i.created_at).into(),
            (&i.updated_at).into(),
        ],
    )
}

fn upsert_sub_item(s: &SubItemRecord) -> Statement {
    Statement::new(
        "INSERT OR REPLACE INTO question_options \
         (id, question_id, text, text_en, value, score, description, order_index, \
          is_correct, is_active, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);",
        vec![
            (&s.id).into(),
            (&s.item_id).into(),
            (&s.text).into(),
            (&s.text_en).into(),
            (&s.value).into(),
            s.score.into(),
            (&s.description).into(),
            s.order_index.into(),
            s.is_correct.into(),
            s.is_active.into(),
            (&s.created_at).into(),
        ],
    )
}

/// All categories in an environment.
pub fn select_categories() -> Statement {
    Statement::new("SELECT * FROM test_categories ORDER BY id;", vec![])
}

/// One category by id.
pub fn select_category_by_id(id: &str) -> Statement {
    Statement::new(
        "SELECT * FROM test_categories WHERE id = ?;",
        vec![id.into()],
    )
}

/// Active categories sharing a business code.
pub fn select_categories_by_code(code: &str) -> Statement {
    Statement::new(
        "SELECT * FROM test_categories WHERE code = ? AND is_active = 1 ORDER BY id;",
        vec![code.into()],
    )
}

/// All questions in a category.
pub fn select_items(category_id: &str) -> Statement {
    Statement::new(
        "SELECT * FROM questions WHERE category_id = ? ORDER BY order_index, id;",
        vec![category_id.into()],
    )
}

/// All options under a category's questions.
pub fn select_sub_items(category_id: &str) -> Statement {
    Statement::new(
        "SELECT o.* FROM question_options o \
         JOIN questions q ON o.question_id = q.id \
         WHERE q.category_id = ? ORDER BY q.order_index, o.order_index, o.id;",
        vec![category_id.into()],
    )
}

/// Count of questions in a category.
pub fn count_items(category_id: &str) -> Statement {
    Statement::new(
        "SELECT COUNT(*) AS n FROM questions WHERE category_id = ?;",
        vec![category_id.into()],
    )
}

/// Count of active questions referencing a category id. Used as the
/// zero-reference guard before deleting a legacy category.
pub fn count_active_items(category_id: &str) -> Statement {
    Statement::new(
        "SELECT COUNT(*) AS n FROM questions WHERE category_id = ? AND is_active = 1;",
        vec![category_id.into()],
    )
}

/// Count of options under a category's questions.
pub fn count_sub_items(category_id: &str) -> Statement {
    Statement::new(
        "SELECT COUNT(*) AS n FROM question_options o \
         JOIN questions q ON o.question_id = q.id WHERE q.category_id = ?;",
        vec![category_id.into()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_quoted_and_escaped() {
        let stmt = Statement::new(
            "SELECT * FROM test_categories WHERE name = ?;",
            vec!["O'Brien's test".into()],
        );
        assert_eq!(
            stmt.render(),
            "SELECT * FROM test_categories WHERE name = 'O''Brien''s test';"
        );
    }

    #[test]
    fn injection_attempt_stays_inert() {
        let stmt = select_category_by_id("x'; DROP TABLE test_categories; --");
        let sql = stmt.render();
        assert!(sql.contains("'x''; DROP TABLE test_categories; --'"));
    }

    #[test]
    fn null_and_bool_literals() {
        let stmt = Statement::new(
            "UPDATE questions SET text_en = ?, is_active = ?;",
            vec![SqlValue::Null, true.into()],
        );
        assert_eq!(stmt.render(), "UPDATE questions SET text_en = NULL, is_active = 1;");
    }

    #[test]
    #[should_panic(expected = "placeholder/parameter count mismatch")]
    fn render_rejects_placeholder_param_mismatch() {
        let stmt = Statement::new(
            "SELECT * FROM questions WHERE category_id = ? AND id = ?;",
            vec!["cat_x".into()],
        );
        let _ = stmt.render();
    }

    #[test]
    fn whole_reals_keep_decimal_point() {
        assert_eq!(SqlValue::Real(2.0).to_literal(), "2.0");
        assert_eq!(SqlValue::Real(1.5).to_literal(), "1.5");
    }

    #[test]
    fn remap_renders_conditional_update() {
        let op = WriteOp::RemapItemCategory {
            legacy_id: "love-language-category".into(),
            canonical_id: "cat_love_language".into(),
        };
        assert_eq!(
            render_op(&op).render(),
            "UPDATE questions SET category_id = 'cat_love_language' \
             WHERE category_id = 'love-language-category';"
        );
    }
}
