/// Per-member dispatch.
use std::borrow::Cow;

use tracing::trace;

use super::Walk;
use crate::conventions::ComparerError;
use crate::failure::{CheckError, CoercionFailure, ConfigError, Failure};
use crate::identity::IdentityKey;
use crate::kind::ComparisonKind;
use crate::rules::MemberRule;
use crate::shape::Shape;
use crate::value::Value;

/// Where a value being compared came from.
#[derive(Clone, Copy)]
pub(super) enum Site<'r> {
    /// A declared member, with its rule.
    Member(&'r MemberRule),
    /// A container element; only type conventions apply.
    Element,
}

/// Checks that both sides are present. `Ok(true)` means both are absent and
/// there is nothing left to compare.
pub(super) fn both_null(
    expected: &Value<'_>,
    candidate: &Value<'_>,
    path: &str,
) -> Result<bool, CheckError> {
    match (expected.is_null(), candidate.is_null()) {
        (true, true) => Ok(true),
        (true, false) => Err(Failure::null_expected(path).into()),
        (false, true) => Err(Failure::null_candidate(path).into()),
        (false, false) => Ok(false),
    }
}

impl Walk<'_> {
    /// Compares one member of two owners under `base`.
    pub(super) fn member(
        &mut self,
        rule: &MemberRule,
        expected: Option<&dyn Shape>,
        candidate: Option<&dyn Shape>,
        base: &str,
    ) -> Result<(), CheckError> {
        if rule.kind() == ComparisonKind::Ignore {
            return Ok(());
        }
        let (expected, candidate) = match (expected, candidate) {
            (None, None) => return Ok(()),
            (None, Some(_)) => return Err(Failure::null_expected(base).into()),
            (Some(_), None) => return Err(Failure::null_candidate(base).into()),
            (Some(e), Some(c)) => (e, c),
        };

        let path = format!("{base}.{}", rule.name());
        let expected = read(rule, expected, &path)?;
        let candidate = read(rule, candidate, &path)?;

        trace!(path = %path, kind = %rule.kind(), "comparing member");
        self.dispatch(Site::Member(rule), rule.kind(), &expected, &candidate, &path)
    }

    /// Routes a pair of values to the comparison for `kind`.
    pub(super) fn dispatch(
        &mut self,
        site: Site<'_>,
        kind: ComparisonKind,
        expected: &Value<'_>,
        candidate: &Value<'_>,
        path: &str,
    ) -> Result<(), CheckError> {
        match kind {
            ComparisonKind::Ignore => Ok(()),
            ComparisonKind::Id => {
                self.identity(site, expected, candidate, &format!("{path}.Id"))
            }
            ComparisonKind::Entity => self.nested(expected, candidate, path),
            ComparisonKind::Collection | ComparisonKind::Count => {
                self.sequence(kind, expected, candidate, path)
            }
            ComparisonKind::Dictionary => self.dictionary(expected, candidate, path),
            ComparisonKind::Value => self.value(site, expected, candidate, path),
            ComparisonKind::Unknown => {
                Err(ConfigError::UnsupportedKind(kind.as_str().to_owned()).into())
            }
        }
    }

    /// Compares the elements of a container whose kind comes from the
    /// runtime type of the expected element.
    pub(super) fn element(
        &mut self,
        expected: &Value<'_>,
        candidate: &Value<'_>,
        path: &str,
    ) -> Result<(), CheckError> {
        let kind = self.conventions().resolve_element_kind(expected);
        self.dispatch(Site::Element, kind, expected, candidate, path)
    }

    /// Compares the identity keys of two entities with the member's comparer.
    fn identity(
        &mut self,
        site: Site<'_>,
        expected: &Value<'_>,
        candidate: &Value<'_>,
        path: &str,
    ) -> Result<(), CheckError> {
        if both_null(expected, candidate, path)? {
            return Ok(());
        }
        let ids = self.conventions().identity();
        if !ids.is_configured() {
            return Err(ConfigError::NoIdentityStrategy.into());
        }
        let expected_id = entity_of(expected, "expected", path)
            .map(|shape| ids.extract_id(shape))?
            .map(IdentityKey::into_value);
        let candidate_id = entity_of(candidate, "candidate", path)
            .map(|shape| ids.extract_id(shape))?
            .map(IdentityKey::into_value);

        let expected_id = expected_id.unwrap_or(Value::Null);
        let candidate_id = candidate_id.unwrap_or(Value::Null);
        self.value(site, &expected_id, &candidate_id, path)
    }

    fn nested(
        &mut self,
        expected: &Value<'_>,
        candidate: &Value<'_>,
        path: &str,
    ) -> Result<(), CheckError> {
        if both_null(expected, candidate, path)? {
            return Ok(());
        }
        match (expected.as_entity(), candidate.as_entity()) {
            (Some(e), Some(c)) => self.entity(e, c, path),
            (Some(e), None) => Err(CoercionFailure {
                path: path.to_owned(),
                role: "candidate",
                value: candidate.to_string(),
                runtime: candidate.runtime_type().name().to_owned(),
                target: e.display_name(),
            }
            .into()),
            // A scalar declared as a dynamic value is compared by its runtime type.
            (None, _) => self.element(expected, candidate, path),
        }
    }

    fn value(
        &mut self,
        site: Site<'_>,
        expected: &Value<'_>,
        candidate: &Value<'_>,
        path: &str,
    ) -> Result<(), CheckError> {
        if both_null(expected, candidate, path)? {
            return Ok(());
        }
        let conventions = self.conventions();
        let (comparer, length) = match site {
            Site::Member(rule) => (
                rule.comparer().cloned().unwrap_or_else(|| {
                    conventions.resolve_member_comparer(rule.member(), expected)
                }),
                rule.length(),
            ),
            Site::Element => (conventions.resolve_element_comparer(expected), 0),
        };

        let outcome = if length > 0 {
            comparer.compare(&truncate(expected, length), &truncate(candidate, length))
        } else {
            comparer.compare(expected, candidate)
        };
        match outcome {
            Ok(true) => Ok(()),
            Ok(false) => Err(Failure::new(path, expected, candidate).into()),
            Err(ComparerError::Coercion {
                role,
                value,
                runtime,
                target,
            }) => Err(CoercionFailure {
                path: path.to_owned(),
                role,
                value,
                runtime,
                target,
            }
            .into()),
            Err(ComparerError::Failed(message)) => Err(Failure::new(path, "", message).into()),
        }
    }
}

/// Reads a member; an accessor error becomes a failure carrying its text.
fn read<'a>(rule: &MemberRule, owner: &'a dyn Shape, path: &str) -> Result<Value<'a>, CheckError> {
    rule.member()
        .read(owner)
        .map_err(|message| Failure::new(path, "", message).into())
}

/// Keeps the first `length` characters of text; other values are unchanged.
fn truncate<'a>(value: &Value<'a>, length: usize) -> Value<'a> {
    match value.as_str() {
        Some(text) => Value::Text(Cow::Owned(text.chars().take(length).collect())),
        None => value.clone(),
    }
}

fn entity_of<'v>(
    value: &Value<'v>,
    role: &'static str,
    path: &str,
) -> Result<&'v dyn Shape, CheckError> {
    value.as_entity().ok_or_else(|| {
        CoercionFailure {
            path: path.to_owned(),
            role,
            value: value.to_string(),
            runtime: value.runtime_type().name().to_owned(),
            target: "identifiable shape".to_owned(),
        }
        .into()
    })
}
