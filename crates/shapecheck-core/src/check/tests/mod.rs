#![allow(clippy::expect_used)]

use super::*;
use crate::conventions::{Comparer, ComparerError};
use crate::shape::Member;
use crate::types::TypeDesc;

mod entity_tests;

pub(super) use crate::test_helpers::{
    Child, Derived, Node, Parent, SampleClass, SampleDictionary, SampleList, Simple, identity,
};

/// Compares and returns the rendered failure message.
pub(super) fn failure_message<T: Reflect>(checker: &Checker, expected: &T, candidate: &T) -> String {
    checker
        .compare(expected, candidate)
        .expect_err("comparison should fail")
        .to_string()
}

/// A shape whose only member cannot be read.
#[derive(Debug)]
struct Faulty;

impl Reflect for Faulty {
    fn members() -> Vec<Member<Self>> {
        vec![Member::fallible(
            "Broken",
            TypeDesc::of::<i32>(),
            |_: &Self| Err("boom".to_owned()),
        )]
    }
}

// ---------------------------------------------------------------------------
// Scalar members
// ---------------------------------------------------------------------------

#[test]
fn equal_instances_pass() {
    let checker = Checker::new();
    checker
        .compare(&Simple::new(1, "A"), &Simple::new(1, "A"))
        .expect("equal");
}

#[test]
fn scalar_mismatch_names_shape_and_member() {
    let checker = Checker::new();
    let message = failure_message(&checker, &Simple::new(1, "A"), &Simple::new(2, "A"));
    assert_eq!(message, "Simple.Id: Expected:<1>. Actual:<2>");
}

#[test]
fn scalar_mismatch_stops_at_the_first_member() {
    let checker = Checker::new();
    let err = checker
        .compare(&Simple::new(1, "A"), &Simple::new(2, "B"))
        .expect_err("differs");
    let failure = err.as_failure().expect("single mismatch");
    assert_eq!(failure.path, "Simple.Id");
}

#[test]
fn label_replaces_the_shape_name() {
    let checker = Checker::new();
    let err = checker
        .compare_named(&Simple::new(1, "A"), &Simple::new(1, "B"), "left")
        .expect_err("differs");
    assert_eq!(err.to_string(), "left.Name: Expected:<A>. Actual:<B>");
}

#[test]
fn repeated_comparisons_render_identically() {
    let checker = Checker::new();
    let first = failure_message(&checker, &Simple::new(1, "A"), &Simple::new(1, "B"));
    let second = failure_message(&checker, &Simple::new(1, "A"), &Simple::new(1, "B"));
    assert_eq!(first, second);
}

#[test]
fn optional_roots_follow_null_rules() {
    let checker = Checker::new();
    let simple = Simple::new(1, "A");
    checker
        .compare_optional::<Simple>(None, None, "")
        .expect("both absent");

    let err = checker
        .compare_optional(None, Some(&simple), "")
        .expect_err("expected absent");
    assert_eq!(err.to_string(), "Simple: Expected:<null>. Actual:<not null>");

    let err = checker
        .compare_optional(Some(&simple), None, "")
        .expect_err("candidate absent");
    assert_eq!(err.to_string(), "Simple: Expected:<not null>. Actual:<null>");
}

#[test]
fn extraction_errors_become_failures() {
    let checker = Checker::new();
    let message = failure_message(&checker, &Faulty, &Faulty);
    assert_eq!(message, "Faulty.Broken: Expected:<>. Actual:<boom>");
}

#[test]
fn comparer_errors_become_failures() {
    let checker = Checker::new();
    checker.conventions().member_comparer(
        "Id",
        Comparer::fallible(|_, _| Err(ComparerError::Failed("unreachable host".to_owned()))),
    );
    let message = failure_message(&checker, &Simple::new(1, "A"), &Simple::new(1, "A"));
    assert_eq!(message, "Simple.Id: Expected:<>. Actual:<unreachable host>");
}

#[test]
fn tolerance_comparer_reports_literal_values() {
    let checker = Checker::new();
    checker
        .conventions()
        .comparer_for::<f64, _>(|a, b| (a - b).abs() < 0.01);

    checker
        .compare(&Derived::new(1, "d", 1.0), &Derived::new(1, "d", 1.001))
        .expect("within tolerance");
    let message = failure_message(
        &checker,
        &Derived::new(1, "d", 1.0),
        &Derived::new(1, "d", 1.5),
    );
    assert_eq!(message, "Derived.Value: Expected:<1>. Actual:<1.5>");
}

#[test]
fn typed_comparer_on_the_wrong_type_is_a_coercion_failure() {
    let checker = Checker::new();
    checker
        .conventions()
        .member_comparer("Name", Comparer::typed::<i64, _>(|a, b| a == b));
    let err = checker
        .compare(&Simple::new(1, "A"), &Simple::new(1, "A"))
        .expect_err("text is not an integer");
    assert!(matches!(err, CheckError::Coercion(_)));
    assert_eq!(
        err.to_string(),
        "Simple.Name: Could not cast expected value A (String) to i64"
    );
}

#[test]
fn length_bounds_text_comparison() {
    let checker = Checker::new();
    let mut builder = RuleSet::builder::<Simple>(checker.conventions());
    builder.compare("Name").expect("Name").length(3);
    builder.auto().expect("auto");
    checker.register(builder.build()).expect("register");

    checker
        .compare(&Simple::new(1, "Alpha"), &Simple::new(1, "Alpine"))
        .expect("same prefix");
    let message = failure_message(&checker, &Simple::new(1, "Alpha"), &Simple::new(1, "Beta"));
    assert_eq!(message, "Simple.Name: Expected:<Alpha>. Actual:<Beta>");
}

// ---------------------------------------------------------------------------
// Rule-sets and conventions
// ---------------------------------------------------------------------------

#[test]
fn members_named_ignore_are_skipped_by_convention() {
    let checker = Checker::new();
    checker
        .conventions()
        .member_kind("Ignore", ComparisonKind::Ignore);
    let mut expected = SampleClass::new(1, "A");
    expected.ignore = "left".to_owned();
    let mut candidate = SampleClass::new(1, "A");
    candidate.ignore = "right".to_owned();
    checker.compare(&expected, &candidate).expect("ignored");
}

#[test]
fn registered_rule_sets_override_auto_built_ones() {
    let checker = Checker::new();
    checker
        .compare(&Simple::new(1, "A"), &Simple::new(1, "A"))
        .expect("auto-built");
    assert!(checker.has_rules::<Simple>());

    let mut builder = RuleSet::builder::<Simple>(checker.conventions());
    builder.compare("Id").expect("Id");
    builder.compare("Name").expect("Name").ignore();
    checker.register(builder.build()).expect("register");

    checker
        .compare(&Simple::new(1, "A"), &Simple::new(1, "B"))
        .expect("Name ignored");
}

#[test]
fn reset_restores_default_behaviour() {
    let checker = Checker::new();
    checker
        .conventions()
        .member_kind("Name", ComparisonKind::Ignore);
    checker
        .compare(&Simple::new(1, "A"), &Simple::new(1, "B"))
        .expect("Name ignored");

    checker.reset();
    assert!(!checker.has_rules::<Simple>());
    let message = failure_message(&checker, &Simple::new(1, "A"), &Simple::new(1, "B"));
    assert_eq!(message, "Simple.Name: Expected:<A>. Actual:<B>");
}

#[test]
fn missing_rule_set_without_auto_build_is_a_config_error() {
    let checker = Checker::with_config(CheckerConfig {
        auto_build: false,
        ..CheckerConfig::default()
    });
    let err = checker
        .compare(&Simple::new(1, "A"), &Simple::new(1, "A"))
        .expect_err("nothing registered");
    assert_eq!(
        err,
        CheckError::Config(ConfigError::NoRuleSet {
            type_name: "Simple".to_owned()
        })
    );
    assert!(!err.is_mismatch());

    checker
        .register(RuleSet::auto::<Simple>(checker.conventions()).expect("auto"))
        .expect("register");
    checker
        .compare(&Simple::new(1, "A"), &Simple::new(1, "A"))
        .expect("registered");
}

// ---------------------------------------------------------------------------
// Parents
// ---------------------------------------------------------------------------

#[test]
fn parent_members_are_compared_first() {
    let checker = Checker::new();
    let message = failure_message(
        &checker,
        &Derived::new(1, "d", 1.0),
        &Derived::new(2, "d", 2.0),
    );
    assert_eq!(message, "Derived.Id: Expected:<1>. Actual:<2>");
}

#[test]
fn derived_members_follow_the_parent() {
    let checker = Checker::new();
    let message = failure_message(
        &checker,
        &Derived::new(1, "d", 1.5),
        &Derived::new(1, "d", 2.5),
    );
    assert_eq!(message, "Derived.Value: Expected:<1.5>. Actual:<2.5>");
}

#[test]
fn compare_base_walks_parent_and_declared_members() {
    let checker = Checker::new();
    let err = checker
        .compare_base(&Derived::new(1, "a", 1.0), &Derived::new(1, "b", 1.0), "base")
        .expect_err("parent differs");
    assert_eq!(err.to_string(), "base.Name: Expected:<a>. Actual:<b>");
    checker
        .compare_base(&Derived::new(1, "a", 1.0), &Derived::new(1, "a", 1.0), "")
        .expect("equal");
}

// ---------------------------------------------------------------------------
// Runtime dispatch
// ---------------------------------------------------------------------------

#[test]
fn compare_dyn_uses_the_runtime_shape() {
    let checker = Checker::new();
    let expected = Simple::new(1, "A");
    let candidate = Simple::new(2, "A");
    let err = checker
        .compare_dyn(&expected, &candidate, "")
        .expect_err("differs");
    assert_eq!(err.to_string(), "Simple.Id: Expected:<1>. Actual:<2>");
}

#[test]
fn compare_dyn_rejects_a_different_candidate_shape() {
    let checker = Checker::new();
    let expected = Simple::new(1, "A");
    let candidate = Derived::new(1, "A", 0.0);
    let err = checker
        .compare_dyn(&expected, &candidate, "")
        .expect_err("different shapes");
    assert_eq!(
        err.to_string(),
        "Simple: Could not cast candidate value Derived (Derived) to Simple"
    );
}
