//! Category identifier resolution across environments.

use crate::error::SyncResult;
use crate::legacy::LegacyIdTable;
use parking_lot::RwLock;
use quizsync_connector::EnvironmentStore;
use quizsync_model::{CategoryRecord, EntityKind, IdentifierMapping, ResolutionMethod};
use tracing::{debug, warn};

/// The outcome of resolving one source category against a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Resolved target category id.
    pub target_id: String,
    /// Which rule fired.
    pub method: ResolutionMethod,
}

/// Resolves canonical target identities for source categories.
///
/// Rules run first-match-wins:
/// 1. the source id exists verbatim in the target,
/// 2. the static legacy table maps the source id,
/// 3. an active target category shares the business code,
/// 4. fallback: the source id passes through unchanged and downstream
///    writes become best-effort.
///
/// Every resolution is appended to the per-run audit log; the mapper never
/// silently guesses.
pub struct IdentifierMapper {
    legacy: LegacyIdTable,
    audit: RwLock<Vec<IdentifierMapping>>,
    ambiguities: RwLock<Vec<String>>,
}

impl IdentifierMapper {
    /// Creates a mapper over the given legacy table.
    pub fn new(legacy: LegacyIdTable) -> Self {
        Self {
            legacy,
            audit: RwLock::new(Vec::new()),
            ambiguities: RwLock::new(Vec::new()),
        }
    }

    /// The legacy table in use.
    pub fn legacy_table(&self) -> &LegacyIdTable {
        &self.legacy
    }

    /// Resolves the target id for a source category.
    pub fn resolve_category(
        &self,
        source: &CategoryRecord,
        target: &dyn EnvironmentStore,
    ) -> SyncResult<Resolution> {
        let resolution = self.resolve_inner(source, target)?;
        debug!(
            source_id = %source.id,
            target_id = %resolution.target_id,
            method = %resolution.method,
            "resolved category id"
        );
        self.audit.write().push(IdentifierMapping {
            source_id: source.id.clone(),
            target_id: resolution.target_id.clone(),
            entity: EntityKind::Category,
            method: resolution.method,
        });
        Ok(resolution)
    }

    fn resolve_inner(
        &self,
        source: &CategoryRecord,
        target: &dyn EnvironmentStore,
    ) -> SyncResult<Resolution> {
        if target.category_by_id(&source.id)?.is_some() {
            return Ok(Resolution {
                target_id: source.id.clone(),
                method: ResolutionMethod::Exact,
            });
        }

        if let Some(canonical) = self.legacy.canonical_for(&source.id) {
            return Ok(Resolution {
                target_id: canonical.to_string(),
                method: ResolutionMethod::LegacyTable,
            });
        }

        let mut matches = target.categories_by_code(&source.code)?;
        if !matches.is_empty() {
            // Deterministic first choice by id; more than one active match
            // is flagged for review, not fatal.
            matches.sort_by(|a, b| a.id.cmp(&b.id));
            if matches.len() > 1 {
                let note = format!(
                    "code '{}' matches {} active target categories; using '{}'",
                    source.code,
                    matches.len(),
                    matches[0].id
                );
                warn!(code = %source.code, chosen = %matches[0].id, "ambiguous code match");
                self.ambiguities.write().push(note);
            }
            return Ok(Resolution {
                target_id: matches[0].id.clone(),
                method: ResolutionMethod::CodeMatch,
            });
        }

        Ok(Resolution {
            target_id: source.id.clone(),
            method: ResolutionMethod::Fallback,
        })
    }

    /// All resolutions recorded this run.
    pub fn audit_log(&self) -> Vec<IdentifierMapping> {
        self.audit.read().clone()
    }

    /// Ambiguity flags recorded this run.
    pub fn ambiguities(&self) -> Vec<String> {
        self.ambiguities.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizsync_connector::MemoryStore;
    use std::collections::BTreeMap;

    fn category(id: &str, code: &str) -> CategoryRecord {
        CategoryRecord {
            id: id.into(),
            code: code.into(),
            name: code.into(),
            description: None,
            dimensions: None,
            scoring_type: None,
            min_score: 0,
            max_score: 100,
            estimated_time: None,
            is_active: true,
            sort_order: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn legacy_table() -> LegacyIdTable {
        let mut categories = BTreeMap::new();
        categories.insert(
            "love-language-category".to_string(),
            "cat_love_language".to_string(),
        );
        LegacyIdTable {
            version: 1,
            categories,
        }
    }

    #[test]
    fn exact_match_wins_first() {
        let target = MemoryStore::new("target");
        target.seed(vec![category("love-language-category", "love_language")], vec![], vec![]);

        let mapper = IdentifierMapper::new(legacy_table());
        let res = mapper
            .resolve_category(&category("love-language-category", "love_language"), &target)
            .unwrap();

        // Exact beats the legacy table even when both would match.
        assert_eq!(res.target_id, "love-language-category");
        assert_eq!(res.method, ResolutionMethod::Exact);
    }

    #[test]
    fn legacy_table_beats_code_match() {
        let target = MemoryStore::new("target");
        target.seed(vec![category("cat_love_language", "love_language")], vec![], vec![]);

        let mapper = IdentifierMapper::new(legacy_table());
        let res = mapper
            .resolve_category(&category("love-language-category", "love_language"), &target)
            .unwrap();

        assert_eq!(res.target_id, "cat_love_language");
        assert_eq!(res.method, ResolutionMethod::LegacyTable);
    }

    #[test]
    fn code_match_when_table_misses() {
        let target = MemoryStore::new("target");
        target.seed(vec![category("cat_mbti", "mbti")], vec![], vec![]);

        let mapper = IdentifierMapper::new(LegacyIdTable::empty());
        let res = mapper
            .resolve_category(&category("mbti-category", "mbti"), &target)
            .unwrap();

        assert_eq!(res.target_id, "cat_mbti");
        assert_eq!(res.method, ResolutionMethod::CodeMatch);
        assert!(mapper.ambiguities().is_empty());
    }

    #[test]
    fn ambiguous_code_match_is_deterministic_and_flagged() {
        let target = MemoryStore::new("target");
        target.seed(
            vec![category("cat_b", "mbti"), category("cat_a", "mbti")],
            vec![],
            vec![],
        );

        let mapper = IdentifierMapper::new(LegacyIdTable::empty());
        let res = mapper
            .resolve_category(&category("mbti-category", "mbti"), &target)
            .unwrap();

        assert_eq!(res.target_id, "cat_a");
        assert_eq!(mapper.ambiguities().len(), 1);
        assert!(mapper.ambiguities()[0].contains("cat_a"));
    }

    #[test]
    fn fallback_passes_source_id_through() {
        let target = MemoryStore::new("target");
        let mapper = IdentifierMapper::new(LegacyIdTable::empty());
        let res = mapper
            .resolve_category(&category("brand-new-category", "brand_new"), &target)
            .unwrap();

        assert_eq!(res.target_id, "brand-new-category");
        assert_eq!(res.method, ResolutionMethod::Fallback);
    }

    #[test]
    fn every_resolution_is_audited() {
        let target = MemoryStore::new("target");
        let mapper = IdentifierMapper::new(legacy_table());

        mapper
            .resolve_category(&category("love-language-category", "love_language"), &target)
            .unwrap();
        mapper
            .resolve_category(&category("other-category", "other"), &target)
            .unwrap();

        let audit = mapper.audit_log();
        assert_eq!(audit.len(), 2);
        assert_eq!(audit[0].method, ResolutionMethod::LegacyTable);
        assert_eq!(audit[1].method, ResolutionMethod::Fallback);
    }
}
