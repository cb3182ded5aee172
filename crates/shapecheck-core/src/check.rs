/// The comparison engine.
///
/// A [`Checker`] owns a [`Conventions`] context and a [`RuleSetRegistry`].
/// Comparing two shapes looks up (or builds) the rule-set of the expected
/// value's runtime shape, compares the parent portion first and then every
/// directly declared member in rule order.
///
/// Scalar mismatches propagate as soon as they are found. Container members
/// collect every mismatch they contain and raise one aggregated failure.
///
/// # Example
///
/// ```
/// use shapecheck_core::{Checker, Member, Reflect, Value};
///
/// #[derive(Debug)]
/// struct Simple {
///     id: i64,
///     name: String,
/// }
///
/// impl Reflect for Simple {
///     fn members() -> Vec<Member<Self>> {
///         vec![
///             Member::of::<i64>("Id", |s: &Self| Value::from(s.id)),
///             Member::of::<String>("Name", |s: &Self| Value::from(&s.name)),
///         ]
///     }
/// }
///
/// let checker = Checker::new();
/// let expected = Simple { id: 1, name: "A".to_owned() };
/// let candidate = Simple { id: 2, name: "A".to_owned() };
/// let err = checker.compare(&expected, &candidate).unwrap_err();
/// assert_eq!(err.to_string(), "Simple.Id: Expected:<1>. Actual:<2>");
/// ```
use std::any::TypeId;
use std::sync::Arc;

use tracing::debug;

use crate::conventions::Conventions;
use crate::failure::{CheckError, CoercionFailure, ConfigError, Failure};
use crate::kind::ComparisonKind;
use crate::registry::RuleSetRegistry;
use crate::rules::RuleSet;
use crate::shape::{Reflect, Shape, ShapeDescriptor};
use crate::value::Value;

mod dictionary;
mod member;
mod sequence;

// ---------------------------------------------------------------------------
// CheckerConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`Checker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Build rule-sets automatically for shapes without a registered one.
    /// When `false`, comparing an unregistered shape is a
    /// [`ConfigError::NoRuleSet`].
    pub auto_build: bool,
    /// Fail with [`ConfigError::CycleDetected`] when an `Entity` comparison
    /// re-enters a pair of instances it is already comparing.
    pub cycle_guard: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            auto_build: true,
            cycle_guard: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Checker
// ---------------------------------------------------------------------------

/// Compares expected and candidate object graphs member by member.
#[derive(Debug)]
pub struct Checker {
    conventions: Conventions,
    registry: RuleSetRegistry,
    config: CheckerConfig,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker {
    /// Creates a checker with default conventions and configuration.
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Creates a checker with the given configuration.
    pub fn with_config(config: CheckerConfig) -> Self {
        Self {
            conventions: Conventions::new(),
            registry: RuleSetRegistry::new(config.auto_build),
            config,
        }
    }

    /// The conventions context. Register conventions before the first
    /// comparison of a shape; cached rule-sets do not see later changes.
    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// The active configuration.
    pub fn config(&self) -> CheckerConfig {
        self.config
    }

    /// Registers a hand-authored rule-set, replacing any cached one.
    pub fn register(&self, rule_set: RuleSet) -> Result<(), ConfigError> {
        self.registry.register(rule_set)
    }

    /// The rule-set used for `T`, built on first use.
    pub fn rules<T: Reflect>(&self) -> Result<Arc<RuleSet>, ConfigError> {
        self.registry
            .get_or_build(&T::type_desc(), ShapeDescriptor::of::<T>, &self.conventions)
    }

    /// Returns `true` if a rule-set for `T` is cached.
    pub fn has_rules<T: Reflect>(&self) -> bool {
        self.registry.contains(TypeId::of::<T>())
    }

    /// Drops cached rule-sets but keeps conventions.
    pub fn clear_rules(&self) {
        self.registry.clear();
    }

    /// Restores the initial state: default conventions, no identity strategy
    /// and no cached rule-sets.
    pub fn reset(&self) {
        self.conventions.clear();
        self.registry.clear();
        debug!("checker reset");
    }

    /// Compares two instances, labelled with the shape name.
    pub fn compare<T: Reflect>(&self, expected: &T, candidate: &T) -> Result<(), CheckError> {
        self.compare_named(expected, candidate, "")
    }

    /// Compares two instances under `label`; an empty label means the shape name.
    pub fn compare_named<T: Reflect>(
        &self,
        expected: &T,
        candidate: &T,
        label: &str,
    ) -> Result<(), CheckError> {
        Walk::new(self).entity(expected, candidate, &label_or::<T>(label))
    }

    /// Compares two optional instances; exactly one `None` is a mismatch.
    pub fn compare_optional<T: Reflect>(
        &self,
        expected: Option<&T>,
        candidate: Option<&T>,
        label: &str,
    ) -> Result<(), CheckError> {
        let path = label_or::<T>(label);
        match (expected, candidate) {
            (None, None) => Ok(()),
            (None, Some(_)) => Err(Failure::null_expected(path).into()),
            (Some(_), None) => Err(Failure::null_candidate(path).into()),
            (Some(e), Some(c)) => Walk::new(self).entity(e, c, &path),
        }
    }

    /// Compares the parent portion and the declared members of `T` only.
    pub fn compare_base<T: Reflect>(
        &self,
        expected: &T,
        candidate: &T,
        label: &str,
    ) -> Result<(), CheckError> {
        let rules = self.rules::<T>()?;
        Walk::new(self).apply(&rules, expected, candidate, &label_or::<T>(label))
    }

    /// Compares two shapes known only at runtime.
    ///
    /// The rule-set is chosen by the expected value's runtime shape; a
    /// candidate of another shape is a coercion failure.
    pub fn compare_dyn(
        &self,
        expected: &dyn Shape,
        candidate: &dyn Shape,
        label: &str,
    ) -> Result<(), CheckError> {
        let path = if label.is_empty() {
            expected.display_name()
        } else {
            label.to_owned()
        };
        Walk::new(self).entity(expected, candidate, &path)
    }

    /// Compares two sequences of `T` with the collection differencer.
    pub fn compare_sequence<T: Reflect>(
        &self,
        expected: &[T],
        candidate: &[T],
        label: &str,
    ) -> Result<(), CheckError> {
        Walk::new(self).sequence(
            ComparisonKind::Collection,
            &Value::list(expected),
            &Value::list(candidate),
            &label_or::<T>(label),
        )
    }
}

fn label_or<T: Reflect>(label: &str) -> String {
    if label.is_empty() {
        T::shape_name()
    } else {
        label.to_owned()
    }
}

// ---------------------------------------------------------------------------
// Walk
// ---------------------------------------------------------------------------

/// State of one top-level comparison.
struct Walk<'c> {
    checker: &'c Checker,
    /// `(expected, candidate, shape)` of every entity comparison in progress.
    active: Vec<(*const (), *const (), TypeId)>,
}

impl<'c> Walk<'c> {
    fn new(checker: &'c Checker) -> Self {
        Self {
            checker,
            active: Vec::new(),
        }
    }

    fn conventions(&self) -> &'c Conventions {
        &self.checker.conventions
    }

    /// Compares two nested shapes, dispatching on the expected runtime shape.
    fn entity(
        &mut self,
        expected: &dyn Shape,
        candidate: &dyn Shape,
        path: &str,
    ) -> Result<(), CheckError> {
        let shape = expected.shape_type();
        if expected.shape_id() != candidate.shape_id() {
            return Err(CoercionFailure {
                path: path.to_owned(),
                role: "candidate",
                value: candidate.display_name(),
                runtime: candidate.shape_type().name().to_owned(),
                target: shape.name().to_owned(),
            }
            .into());
        }
        let rules = self.checker.registry.get_or_build(
            &shape,
            || expected.descriptor(),
            &self.checker.conventions,
        )?;

        let key = (address(expected), address(candidate), expected.shape_id());
        if self.checker.config.cycle_guard {
            if self.active.contains(&key) {
                return Err(ConfigError::CycleDetected {
                    path: path.to_owned(),
                }
                .into());
            }
            self.active.push(key);
        }
        let result = self.apply(&rules, expected, candidate, path);
        if self.checker.config.cycle_guard {
            self.active.pop();
        }
        result
    }

    /// Compares the parent portion, then every member rule.
    fn apply(
        &mut self,
        rules: &RuleSet,
        expected: &dyn Shape,
        candidate: &dyn Shape,
        path: &str,
    ) -> Result<(), CheckError> {
        if let Some(parent) = rules.parent() {
            let cast = |role: &'static str, value: &dyn Shape| CoercionFailure {
                path: path.to_owned(),
                role,
                value: value.display_name(),
                runtime: value.shape_type().name().to_owned(),
                target: parent.parent_type().name().to_owned(),
            };
            let e = parent
                .project(expected)
                .ok_or_else(|| cast("expected", expected))?;
            let c = parent
                .project(candidate)
                .ok_or_else(|| cast("candidate", candidate))?;
            let parent_rules = self.checker.registry.get_or_build(
                parent.parent_type(),
                || parent.descriptor(),
                &self.checker.conventions,
            )?;
            self.apply(&parent_rules, e, c, path)?;
        }
        for rule in rules.rules() {
            self.member(rule, Some(expected), Some(candidate), path)?;
        }
        Ok(())
    }
}

fn address(shape: &dyn Shape) -> *const () {
    (shape as *const dyn Shape).cast::<()>()
}

#[cfg(test)]
mod tests;
