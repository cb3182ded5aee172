/// Conventions loaded from a configuration file.
///
/// ```json
/// {
///   "member_kinds": [{ "pattern": "^Ignore$", "kind": "ignore" }],
///   "type_kinds": [{ "type_name": "Money", "kind": "value" }]
/// }
/// ```
///
/// Entries are registered in file order, so later entries win.
use serde::{Deserialize, Serialize};

use crate::kind::ComparisonKind;

/// A member-name convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberKindRule {
    /// Regular expression matched against member names.
    pub pattern: String,
    /// Kind assigned to matching members.
    pub kind: ComparisonKind,
}

/// A declared-type convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeKindRule {
    /// Exact display name of the declared type, e.g. `Vec<Child>`.
    pub type_name: String,
    /// Kind assigned to members of that type.
    pub kind: ComparisonKind,
}

/// A set of conventions to apply to a [`Conventions`](super::Conventions) context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConventionsConfig {
    /// Member-name conventions.
    pub member_kinds: Vec<MemberKindRule>,
    /// Declared-type conventions.
    pub type_kinds: Vec<TypeKindRule>,
}

impl ConventionsConfig {
    /// Parses a conventions file.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns `true` if the file declares no conventions.
    pub fn is_empty(&self) -> bool {
        self.member_kinds.is_empty() && self.type_kinds.is_empty()
    }
}
