/// Comparison conventions.
///
/// A [`Conventions`] context owns four [`ConventionTable`]s (type → kind,
/// type → comparer, member → kind, member → comparer) plus the identity
/// strategy. It is owned by a [`Checker`](crate::Checker) rather than held in
/// process-wide state, and [`Conventions::clear`] restores its initial state.
///
/// Kind resolution for a member consults member conventions first, then type
/// conventions on the declared type, and finally falls back to
/// [`ComparisonKind::Value`].
use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use regex::Regex;
use tracing::debug;

use crate::failure::ConfigError;
use crate::identity::{IdentityExtractor, NullIdentity};
use crate::kind::ComparisonKind;
use crate::shape::MemberDesc;
use crate::types::{Describe, TypeCategory, TypeDesc};
use crate::value::{FromValue, Value};

pub mod config;
mod table;

pub use config::{ConventionsConfig, MemberKindRule, TypeKindRule};
pub use table::ConventionTable;

// ---------------------------------------------------------------------------
// Comparer
// ---------------------------------------------------------------------------

/// Why a comparer could not decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparerError {
    /// A side could not be unwrapped to the comparer's operand type.
    Coercion {
        /// `"expected"` or `"candidate"`.
        role: &'static str,
        /// Representation of the value.
        value: String,
        /// Runtime type of the value.
        runtime: String,
        /// Operand type of the comparer.
        target: String,
    },
    /// The comparer failed; the text becomes the actual-value representation.
    Failed(String),
}

impl fmt::Display for ComparerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coercion {
                role,
                value,
                runtime,
                target,
            } => write!(f, "could not cast {role} value {value} ({runtime}) to {target}"),
            Self::Failed(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ComparerError {}

type CompareFn = dyn Fn(&Value<'_>, &Value<'_>) -> Result<bool, ComparerError> + Send + Sync;

/// A custom equality function over member values.
#[derive(Clone)]
pub struct Comparer(Arc<CompareFn>);

impl Comparer {
    /// Wraps an infallible equality function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value<'_>, &Value<'_>) -> bool + Send + Sync + 'static,
    {
        Self(erase(move |e, c| Ok(f(e, c))))
    }

    /// Wraps an equality function that can fail.
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&Value<'_>, &Value<'_>) -> Result<bool, ComparerError> + Send + Sync + 'static,
    {
        Self(erase(f))
    }

    /// Wraps an equality function over unwrapped operands of type `T`.
    ///
    /// A side whose runtime value cannot be unwrapped to `T` yields
    /// [`ComparerError::Coercion`].
    pub fn typed<T, F>(f: F) -> Self
    where
        T: FromValue + Describe,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self(erase(move |e, c| {
            let e = unwrap_operand::<T>(e, "expected")?;
            let c = unwrap_operand::<T>(c, "candidate")?;
            Ok(f(&e, &c))
        }))
    }

    /// Default value equality.
    pub fn equality() -> Self {
        Self::new(|e, c| e == c)
    }

    /// Applies the comparer.
    pub fn compare(&self, expected: &Value<'_>, candidate: &Value<'_>) -> Result<bool, ComparerError> {
        (self.0)(expected, candidate)
    }
}

impl fmt::Debug for Comparer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparer(..)")
    }
}

fn erase<F>(f: F) -> Arc<CompareFn>
where
    F: Fn(&Value<'_>, &Value<'_>) -> Result<bool, ComparerError> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn unwrap_operand<T: FromValue + Describe>(
    value: &Value<'_>,
    role: &'static str,
) -> Result<T, ComparerError> {
    T::from_value(value).ok_or_else(|| ComparerError::Coercion {
        role,
        value: value.to_string(),
        runtime: value.runtime_type().name().to_owned(),
        target: T::describe().name().to_owned(),
    })
}

// ---------------------------------------------------------------------------
// Conventions
// ---------------------------------------------------------------------------

/// The conventions context used by one checker.
pub struct Conventions {
    type_kinds: ConventionTable<TypeDesc, ComparisonKind>,
    type_comparers: ConventionTable<TypeDesc, Option<Comparer>>,
    member_kinds: ConventionTable<MemberDesc, ComparisonKind>,
    member_comparers: ConventionTable<MemberDesc, Option<Comparer>>,
    identity: RwLock<Arc<dyn IdentityExtractor>>,
}

impl Default for Conventions {
    fn default() -> Self {
        Self::new()
    }
}

impl Conventions {
    /// Creates a context with the default type conventions and no identity strategy.
    pub fn new() -> Self {
        let type_kinds = ConventionTable::new(ComparisonKind::Unknown);
        install_default_type_kinds(&type_kinds);
        Self {
            type_kinds,
            type_comparers: ConventionTable::new(None),
            member_kinds: ConventionTable::new(ComparisonKind::Unknown),
            member_comparers: ConventionTable::new(None),
            identity: RwLock::new(Arc::new(NullIdentity)),
        }
    }

    /// Restores the initial state: default type conventions only, no
    /// member conventions, no comparers and no identity strategy.
    pub fn clear(&self) {
        self.type_kinds.reset_with(install_default_type_kinds);
        self.type_comparers.clear();
        self.member_kinds.clear();
        self.member_comparers.clear();
        self.set_identity(NullIdentity);
        debug!("conventions cleared");
    }

    // -- identity ----------------------------------------------------------

    /// Assigns the identity strategy.
    pub fn set_identity(&self, extractor: impl IdentityExtractor + 'static) {
        let mut guard = self.identity.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(extractor);
    }

    /// The current identity strategy.
    pub fn identity(&self) -> Arc<dyn IdentityExtractor> {
        Arc::clone(&self.identity.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Maps every type supported by the current identity strategy to
    /// [`ComparisonKind::Id`].
    ///
    /// The strategy is captured now; assign it with
    /// [`Conventions::set_identity`] before calling this.
    pub fn register_identifiable_as_id(&self) {
        let ids = self.identity();
        self.type_kinds
            .register(move |t| ids.supports_id(t), ComparisonKind::Id);
    }

    // -- type conventions --------------------------------------------------

    /// Registers a kind for declared types matching `predicate`.
    pub fn register_type_kind<P>(&self, predicate: P, kind: ComparisonKind)
    where
        P: Fn(&TypeDesc) -> bool + Send + Sync + 'static,
    {
        self.type_kinds.register(predicate, kind);
    }

    /// Registers a kind for the exact type `T` (and optional `T`).
    pub fn type_kind<T: 'static>(&self, kind: ComparisonKind) {
        let id = TypeId::of::<T>();
        self.type_kinds.register(move |t| t.matches_id(id), kind);
    }

    /// Registers a comparer for declared or runtime types matching `predicate`.
    pub fn register_type_comparer<P>(&self, predicate: P, comparer: Comparer)
    where
        P: Fn(&TypeDesc) -> bool + Send + Sync + 'static,
    {
        self.type_comparers.register(predicate, Some(comparer));
    }

    /// Registers a typed comparer for `T`, matched on declared or runtime type.
    pub fn comparer_for<T, F>(&self, f: F)
    where
        T: FromValue + Describe,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let id = TypeId::of::<T>();
        self.type_comparers
            .register(move |t| t.matches_id(id), Some(Comparer::typed(f)));
    }

    // -- member conventions ------------------------------------------------

    /// Registers a kind for members matching `predicate`.
    pub fn register_member_kind<P>(&self, predicate: P, kind: ComparisonKind)
    where
        P: Fn(&MemberDesc) -> bool + Send + Sync + 'static,
    {
        self.member_kinds.register(predicate, kind);
    }

    /// Registers a kind for every member named `name`.
    pub fn member_kind(&self, name: impl Into<String>, kind: ComparisonKind) {
        let name = name.into();
        self.member_kinds.register(move |m| m.name() == name, kind);
    }

    /// Registers a kind for members whose name matches `pattern`.
    pub fn member_pattern_kind(&self, pattern: Regex, kind: ComparisonKind) {
        self.member_kinds
            .register(move |m| pattern.is_match(m.name()), kind);
    }

    /// Registers a comparer for members matching `predicate`.
    pub fn register_member_comparer<P>(&self, predicate: P, comparer: Comparer)
    where
        P: Fn(&MemberDesc) -> bool + Send + Sync + 'static,
    {
        self.member_comparers.register(predicate, Some(comparer));
    }

    /// Registers a comparer for every member named `name`.
    pub fn member_comparer(&self, name: impl Into<String>, comparer: Comparer) {
        let name = name.into();
        self.member_comparers
            .register(move |m| m.name() == name, Some(comparer));
    }

    /// Applies a conventions file. Every pattern is compiled before anything
    /// is registered, so an invalid file leaves the context unchanged.
    pub fn apply_config(&self, config: &ConventionsConfig) -> Result<(), ConfigError> {
        let compiled = config
            .member_kinds
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.kind))
                    .map_err(|e| ConfigError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for rule in &config.type_kinds {
            let name = rule.type_name.clone();
            self.type_kinds.register(move |t| t.name() == name, rule.kind);
        }
        for (re, kind) in compiled {
            self.member_pattern_kind(re, kind);
        }
        debug!(
            member_rules = config.member_kinds.len(),
            type_rules = config.type_kinds.len(),
            "conventions file applied"
        );
        Ok(())
    }

    // -- resolution --------------------------------------------------------

    /// Raw type-convention lookup; may return [`ComparisonKind::Unknown`].
    pub fn resolve_type_kind(&self, ty: &TypeDesc) -> ComparisonKind {
        self.type_kinds.resolve(ty)
    }

    /// Raw member-convention lookup; may return [`ComparisonKind::Unknown`].
    pub fn resolve_member_convention(&self, member: &MemberDesc) -> ComparisonKind {
        self.member_kinds.resolve(member)
    }

    /// The authoritative kind for a member: member conventions, then type
    /// conventions on the declared type, then [`ComparisonKind::Value`].
    pub fn resolve_member_kind(&self, member: &MemberDesc) -> ComparisonKind {
        self.member_kinds
            .resolve(member)
            .or(self.type_kinds.resolve(member.declared_type()))
            .or(ComparisonKind::Value)
    }

    /// The kind for a container element, resolved from its runtime type.
    ///
    /// Unresolved nested shapes fall back to [`ComparisonKind::Entity`] and
    /// unresolved scalars to [`ComparisonKind::Value`]. A scalar is never
    /// resolved to `Entity`.
    pub fn resolve_element_kind(&self, value: &Value<'_>) -> ComparisonKind {
        let kind = self.type_kinds.resolve(&value.runtime_type());
        match value {
            Value::Entity(_) => kind.or(ComparisonKind::Entity),
            Value::Null => kind.or(ComparisonKind::Value),
            Value::Bool(_)
            | Value::Integer(_)
            | Value::UnsignedInteger(_)
            | Value::Float(_)
            | Value::Text(_)
            | Value::Uuid(_)
            | Value::DateTime(_)
            | Value::Date(_)
            | Value::Duration(_)
            | Value::Enum(_)
            | Value::Seq(_)
            | Value::Map(_) => match kind {
                ComparisonKind::Entity | ComparisonKind::Unknown => ComparisonKind::Value,
                ComparisonKind::Ignore
                | ComparisonKind::Value
                | ComparisonKind::Id
                | ComparisonKind::Collection
                | ComparisonKind::Count
                | ComparisonKind::Dictionary => kind,
            },
        }
    }

    /// The comparer for a member, when the rule does not fix one: member
    /// conventions, then type conventions on the declared type, then on the
    /// runtime type of `expected`, then default equality.
    pub fn resolve_member_comparer(&self, member: &MemberDesc, expected: &Value<'_>) -> Comparer {
        self.member_comparers
            .resolve(member)
            .or_else(|| self.type_comparers.resolve(member.declared_type()))
            .or_else(|| self.type_comparers.resolve(&expected.runtime_type()))
            .unwrap_or_else(Comparer::equality)
    }

    /// The comparer for a container element, from its runtime type.
    pub fn resolve_element_comparer(&self, expected: &Value<'_>) -> Comparer {
        self.type_comparers
            .resolve(&expected.runtime_type())
            .unwrap_or_else(Comparer::equality)
    }
}

/// Registers the default type conventions, lowest priority first.
fn install_default_type_kinds(table: &ConventionTable<TypeDesc, ComparisonKind>) {
    table.register(
        |t| matches!(t.unwrap_nullable().category(), TypeCategory::Enum),
        ComparisonKind::Value,
    );
    // Entity values have no structural equality, so an optional value
    // shape is still walked member by member.
    table.register(
        |t| matches!(t.unwrap_nullable().category(), TypeCategory::ValueShape),
        ComparisonKind::Entity,
    );
    table.register(
        |t| matches!(t.category(), TypeCategory::Shape | TypeCategory::Dynamic),
        ComparisonKind::Entity,
    );
    table.register(TypeDesc::is_sequence, ComparisonKind::Collection);
    table.register(TypeDesc::is_dictionary, ComparisonKind::Dictionary);
    table.register(
        |t| t.unwrap_nullable().is_well_known_scalar(),
        ComparisonKind::Value,
    );
}

impl fmt::Debug for Conventions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conventions")
            .field("type_kinds", &self.type_kinds)
            .field("type_comparers", &self.type_comparers.len())
            .field("member_kinds", &self.member_kinds)
            .field("member_comparers", &self.member_comparers.len())
            .field("identity_configured", &self.identity().is_configured())
            .finish()
    }
}
