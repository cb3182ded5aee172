use std::sync::Arc;

use super::*;
use crate::identity::{IdentityKey, KeyedIdentity, NullIdentity};

/// Registers a `Child` rule-set comparing `Parent` by identity.
fn child_by_parent_id(checker: &Checker) {
    let mut builder = RuleSet::builder::<Child>(checker.conventions());
    builder.compare("Parent").expect("Parent").id().expect("Id");
    builder.auto().expect("auto");
    checker.register(builder.build()).expect("register");
}

fn parent_named(id: i64, name: &str) -> Arc<Parent> {
    let mut parent = Parent::new(id);
    parent.name = name.to_owned();
    Arc::new(parent)
}

// ---------------------------------------------------------------------------
// Entity members
// ---------------------------------------------------------------------------

#[test]
fn nested_entities_are_walked_recursively() {
    let checker = Checker::new();
    let message = failure_message(
        &checker,
        &Parent::new(1).with_favourite(Child::new(1)),
        &Parent::new(1).with_favourite(Child::new(2)),
    );
    assert_eq!(message, "Parent.Favourite.Id: Expected:<1>. Actual:<2>");
}

#[test]
fn null_pairs_are_symmetric() {
    let checker = Checker::new();
    let bare = Parent::new(1);
    let with = Parent::new(1).with_favourite(Child::new(1));

    let err = checker.compare(&bare, &with).expect_err("expected absent");
    let forward = err.as_failure().expect("mismatch").clone();
    let err = checker.compare(&with, &bare).expect_err("candidate absent");
    let backward = err.as_failure().expect("mismatch").clone();

    assert_eq!(forward.path, "Parent.Favourite");
    assert_eq!(forward.path, backward.path);
    assert_eq!((forward.expected.as_str(), forward.actual.as_str()), ("null", "not null"));
    assert_eq!((backward.expected, backward.actual), (forward.actual, forward.expected));
}

#[test]
fn both_absent_entities_pass() {
    let checker = Checker::new();
    checker
        .compare(&Parent::new(1), &Parent::new(1))
        .expect("no favourites");
}

// ---------------------------------------------------------------------------
// Id members
// ---------------------------------------------------------------------------

#[test]
fn id_comparison_ignores_other_members() {
    let checker = Checker::new();
    checker.conventions().set_identity(identity());
    child_by_parent_id(&checker);

    let expected = Child::new(1).with_parent(parent_named(1, "first"));
    let candidate = Child::new(1).with_parent(parent_named(1, "second"));
    checker.compare(&expected, &candidate).expect("same key");
}

#[test]
fn id_mismatch_is_reported_under_id() {
    let checker = Checker::new();
    checker.conventions().set_identity(identity());
    child_by_parent_id(&checker);

    let message = failure_message(
        &checker,
        &Child::new(1).with_parent(Arc::new(Parent::new(1))),
        &Child::new(1).with_parent(Arc::new(Parent::new(2))),
    );
    assert_eq!(message, "Child.Parent.Id: Expected:<1>. Actual:<2>");
}

#[test]
fn id_keys_use_the_rule_comparer() {
    let checker = Checker::new();
    checker.conventions().set_identity(identity());
    let mut builder = RuleSet::builder::<Child>(checker.conventions());
    builder
        .compare("Parent")
        .expect("Parent")
        .id()
        .expect("Id")
        .comparer(Comparer::new(|_, _| true));
    builder.auto().expect("auto");
    checker.register(builder.build()).expect("register");

    checker
        .compare(
            &Child::new(1).with_parent(Arc::new(Parent::new(1))),
            &Child::new(1).with_parent(Arc::new(Parent::new(2))),
        )
        .expect("comparer accepts any key");
}

#[test]
fn id_keys_use_type_comparers_for_the_key_type() {
    let checker = Checker::new();
    checker.conventions().set_identity(identity());
    checker
        .conventions()
        .comparer_for::<i64, _>(|a, b| (a - b).abs() <= 1);
    child_by_parent_id(&checker);

    checker
        .compare(
            &Child::new(1).with_parent(Arc::new(Parent::new(1))),
            &Child::new(1).with_parent(Arc::new(Parent::new(2))),
        )
        .expect("keys within tolerance");
    let message = failure_message(
        &checker,
        &Child::new(1).with_parent(Arc::new(Parent::new(1))),
        &Child::new(1).with_parent(Arc::new(Parent::new(5))),
    );
    assert_eq!(message, "Child.Parent.Id: Expected:<1>. Actual:<5>");
}

#[test]
fn id_null_rules() {
    let checker = Checker::new();
    checker.conventions().set_identity(identity());
    child_by_parent_id(&checker);

    checker
        .compare(&Child::new(1), &Child::new(1))
        .expect("both absent");
    let message = failure_message(
        &checker,
        &Child::new(1),
        &Child::new(1).with_parent(Arc::new(Parent::new(1))),
    );
    assert_eq!(message, "Child.Parent.Id: Expected:<null>. Actual:<not null>");
}

#[test]
fn identifiable_types_are_compared_by_id_automatically() {
    let checker = Checker::new();
    checker.conventions().set_identity(identity());
    checker.conventions().register_identifiable_as_id();

    let expected = Child::new(1).with_parent(parent_named(3, "first"));
    let candidate = Child::new(1).with_parent(parent_named(3, "second"));
    checker.compare(&expected, &candidate).expect("same key");
}

#[test]
fn id_kind_without_strategy_fails_when_building() {
    let checker = Checker::new();
    checker
        .conventions()
        .member_kind("Parent", ComparisonKind::Id);
    let err = checker
        .compare(&Child::new(1), &Child::new(1))
        .expect_err("no strategy");
    assert_eq!(err, CheckError::Config(ConfigError::NoIdentityStrategy));
}

#[test]
fn id_kind_without_strategy_fails_when_comparing() {
    let checker = Checker::new();
    checker.conventions().set_identity(identity());
    child_by_parent_id(&checker);
    checker.conventions().set_identity(NullIdentity);

    let err = checker
        .compare(
            &Child::new(1).with_parent(Arc::new(Parent::new(1))),
            &Child::new(1).with_parent(Arc::new(Parent::new(1))),
        )
        .expect_err("strategy removed");
    assert_eq!(err, CheckError::Config(ConfigError::NoIdentityStrategy));
}

#[test]
fn shapes_without_a_key_compare_as_null() {
    let checker = Checker::new();
    checker.conventions().set_identity(
        KeyedIdentity::new()
            .with::<Parent>(|p| (p.id > 0).then(|| IdentityKey::new(p.id))),
    );
    child_by_parent_id(&checker);

    let message = failure_message(
        &checker,
        &Child::new(1).with_parent(Arc::new(Parent::new(0))),
        &Child::new(1).with_parent(Arc::new(Parent::new(5))),
    );
    assert_eq!(message, "Child.Parent.Id: Expected:<null>. Actual:<not null>");
}

// ---------------------------------------------------------------------------
// Cycles
// ---------------------------------------------------------------------------

#[test]
fn entity_cycles_are_detected() {
    let checker = Checker::new();
    let expected = Node::new(1);
    Node::link(&expected, &expected);
    let candidate = Node::new(1);
    Node::link(&candidate, &candidate);

    let err = checker
        .compare(expected.as_ref(), candidate.as_ref())
        .expect_err("cycle");
    assert_eq!(
        err,
        CheckError::Config(ConfigError::CycleDetected {
            path: "Node.Next".to_owned()
        })
    );
}

#[test]
fn longer_cycles_are_detected_where_they_close() {
    let checker = Checker::new();
    let (a, b) = (Node::new(1), Node::new(2));
    Node::link(&a, &b);
    Node::link(&b, &a);
    let (c, d) = (Node::new(1), Node::new(2));
    Node::link(&c, &d);
    Node::link(&d, &c);

    let err = checker.compare(a.as_ref(), c.as_ref()).expect_err("cycle");
    assert_eq!(err.path(), Some("Node.Next.Next"));
}

#[test]
fn id_boundaries_stop_recursion() {
    let checker = Checker::new();
    checker
        .conventions()
        .set_identity(KeyedIdentity::new().with::<Node>(|n| Some(IdentityKey::new(n.id))));
    checker.conventions().register_identifiable_as_id();

    let expected = Node::new(1);
    Node::link(&expected, &expected);
    let candidate = Node::new(1);
    Node::link(&candidate, &candidate);
    checker
        .compare(expected.as_ref(), candidate.as_ref())
        .expect("identity boundary");
}
