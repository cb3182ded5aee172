/// Rule-set cache keyed by shape identity.
///
/// Rule-sets are looked up by [`TypeId`]. A missing rule-set is built
/// automatically over every declared member unless auto-build is disabled,
/// in which case the lookup is a [`ConfigError::NoRuleSet`]. Explicit
/// registration replaces whatever is cached.
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::conventions::Conventions;
use crate::failure::ConfigError;
use crate::rules::RuleSet;
use crate::shape::ShapeDescriptor;
use crate::types::TypeDesc;

/// Per-shape rule-set cache.
#[derive(Debug)]
pub struct RuleSetRegistry {
    rule_sets: RwLock<HashMap<TypeId, Arc<RuleSet>>>,
    auto_build: bool,
}

impl RuleSetRegistry {
    /// Creates an empty registry.
    pub fn new(auto_build: bool) -> Self {
        Self {
            rule_sets: RwLock::new(HashMap::new()),
            auto_build,
        }
    }

    /// Returns the cached rule-set for the shape `id`, if any.
    pub fn get(&self, id: TypeId) -> Option<Arc<RuleSet>> {
        self.rule_sets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Returns the rule-set for `shape`, building and caching it on first use.
    ///
    /// `describe` is only called when a rule-set has to be built.
    pub fn get_or_build(
        &self,
        shape: &TypeDesc,
        describe: impl FnOnce() -> ShapeDescriptor,
        conventions: &Conventions,
    ) -> Result<Arc<RuleSet>, ConfigError> {
        let no_rule_set = || ConfigError::NoRuleSet {
            type_name: shape.name().to_owned(),
        };
        let id = shape.type_id().ok_or_else(no_rule_set)?;
        if let Some(rule_set) = self.get(id) {
            return Ok(rule_set);
        }
        if !self.auto_build {
            return Err(no_rule_set());
        }

        let built = Arc::new(RuleSet::auto_from(describe(), conventions)?);
        let mut guard = self
            .rule_sets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // A concurrent build may have won the race; keep the first one.
        Ok(Arc::clone(guard.entry(id).or_insert(built)))
    }

    /// Registers a rule-set, replacing any cached one for the same shape.
    pub fn register(&self, rule_set: RuleSet) -> Result<(), ConfigError> {
        let id = rule_set.shape_id().ok_or_else(|| ConfigError::NoRuleSet {
            type_name: rule_set.shape().name().to_owned(),
        })?;
        debug!(
            shape = rule_set.shape().name(),
            rules = rule_set.rules().len(),
            "rule-set registered"
        );
        self.rule_sets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(rule_set));
        Ok(())
    }

    /// Drops every cached rule-set.
    pub fn clear(&self) {
        self.rule_sets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("rule-set cache cleared");
    }

    /// Returns `true` if a rule-set is cached for the shape `id`.
    pub fn contains(&self, id: TypeId) -> bool {
        self.rule_sets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Number of cached rule-sets.
    pub fn len(&self) -> usize {
        self.rule_sets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether missing rule-sets are built on demand.
    pub fn auto_build(&self) -> bool {
        self.auto_build
    }
}
