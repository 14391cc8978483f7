//! Content records for the three-level hierarchy.

use serde::{Deserialize, Serialize};

/// The kind of entity being synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A test category (top level).
    Category,
    /// A question within a category.
    Item,
    /// An answer option within a question.
    SubItem,
}

impl EntityKind {
    /// The database table backing this entity kind.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Category => "test_categories",
            EntityKind::Item => "questions",
            EntityKind::SubItem => "question_options",
        }
    }

    /// Human-readable label used in status and progress lines.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Item => "questions",
            EntityKind::SubItem => "options",
        }
    }
}

/// A test category.
///
/// `id` is environment-scoped and its format may differ across environments;
/// `code` is the stable cross-environment business key. Among active
/// categories, `code` is unique per environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Environment-scoped identifier.
    pub id: String,
    /// Stable business key, unique among active categories.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Scoring dimensions, stored as a JSON string.
    pub dimensions: Option<String>,
    /// Scoring type (e.g. "sum", "dimensional").
    pub scoring_type: Option<String>,
    /// Minimum achievable score.
    pub min_score: i64,
    /// Maximum achievable score.
    pub max_score: i64,
    /// Estimated completion time in minutes.
    pub estimated_time: Option<i64>,
    /// Whether the category is active.
    pub is_active: bool,
    /// Display ordering.
    pub sort_order: i64,
    /// Creation timestamp (ISO 8601 text).
    pub created_at: Option<String>,
    /// Last update timestamp (ISO 8601 text).
    pub updated_at: Option<String>,
}

/// A question belonging to a category.
///
/// Post-sync invariant: every active item's `category_id` references an
/// existing active category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Environment-scoped identifier.
    pub id: String,
    /// Owning category id.
    pub category_id: String,
    /// Question text.
    pub text: String,
    /// English question text.
    pub text_en: Option<String>,
    /// Question type (e.g. "single_choice", "scale").
    #[serde(rename = "type")]
    pub item_type: String,
    /// Scoring dimension this question contributes to.
    pub dimension: Option<String>,
    /// Domain tag.
    pub domain: Option<String>,
    /// Scoring weight.
    pub weight: f64,
    /// Position within the category.
    pub order_index: i64,
    /// Whether an answer is required.
    pub is_required: bool,
    /// Whether the question is active.
    pub is_active: bool,
    /// Whether the question is reverse-scored.
    pub is_reverse: Option<bool>,
    /// Creation timestamp (ISO 8601 text).
    pub created_at: Option<String>,
    /// Last update timestamp (ISO 8601 text).
    pub updated_at: Option<String>,
}

/// An answer option belonging to a question.
///
/// Post-sync invariant: every active sub-item's `item_id` references an
/// existing active item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubItemRecord {
    /// Environment-scoped identifier.
    pub id: String,
    /// Owning question id.
    pub item_id: String,
    /// Option text.
    pub text: String,
    /// English option text.
    pub text_en: Option<String>,
    /// Stored answer value.
    pub value: String,
    /// Score contributed when selected.
    pub score: f64,
    /// Optional description.
    pub description: Option<String>,
    /// Position within the question.
    pub order_index: i64,
    /// Whether this is the correct option (knowledge tests).
    pub is_correct: bool,
    /// Whether the option is active.
    pub is_active: bool,
    /// Creation timestamp (ISO 8601 text).
    pub created_at: Option<String>,
}
