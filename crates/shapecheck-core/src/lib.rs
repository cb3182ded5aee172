#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod check;
pub mod conventions;
pub mod failure;
pub mod identity;
pub mod kind;
pub mod registry;
pub mod rules;
pub mod shape;
pub mod types;
pub mod value;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use check::{Checker, CheckerConfig};
pub use conventions::{
    Comparer, ComparerError, ConventionTable, Conventions, ConventionsConfig, MemberKindRule,
    TypeKindRule,
};
pub use failure::{
    AggregateFailure, CheckError, CoercionFailure, ConfigError, Failure, FailureReport,
};
pub use identity::{IdentityExtractor, IdentityKey, KeyedIdentity, NullIdentity};
pub use kind::{ComparisonKind, ParseKindError};
pub use registry::RuleSetRegistry;
pub use rules::{MemberRule, MemberRuleExpr, RuleSet, RuleSetBuilder};
pub use shape::{
    Accessor, InfallibleAccessor, Member, MemberDesc, ParentDesc, ParentLink, Reflect, Shape,
    ShapeDescriptor,
};
pub use types::{Describe, TypeCategory, TypeDesc};
pub use value::{EnumValue, FromValue, Mapping, Sequence, Value};

/// Returns the current version of the shapecheck-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
