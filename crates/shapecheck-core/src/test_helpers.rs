//! Shared test fixtures.
//!
//! This module is compiled only in test builds and provides the small object
//! graphs used across unit test modules throughout `shapecheck-core`: a flat
//! shape, a derived shape, a parent/child pair that can point at each other,
//! sample shapes with list and dictionary members, and a self-referencing
//! node for cycle tests.
//!
//! Integration tests in `crates/shapecheck-core/tests/` define their own local
//! fixtures because they link against the non-test library build where this
//! module is not available.
#![allow(clippy::expect_used)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::identity::{IdentityKey, KeyedIdentity};
use crate::shape::{Member, ParentLink, Reflect};
use crate::types::TypeDesc;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Simple / Derived
// ---------------------------------------------------------------------------

/// A flat shape with two scalar members.
#[derive(Debug, Clone, PartialEq)]
pub struct Simple {
    pub id: i64,
    pub name: String,
}

impl Simple {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
        }
    }
}

impl Reflect for Simple {
    fn members() -> Vec<Member<Self>> {
        vec![
            Member::of::<i64>("Id", |s: &Self| Value::from(s.id)),
            Member::of::<String>("Name", |s: &Self| Value::from(&s.name)),
        ]
    }
}

/// A shape that embeds [`Simple`] as its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub base: Simple,
    pub value: f64,
}

impl Derived {
    pub fn new(id: i64, name: &str, value: f64) -> Self {
        Self {
            base: Simple::new(id, name),
            value,
        }
    }
}

impl Reflect for Derived {
    fn members() -> Vec<Member<Self>> {
        vec![Member::of::<f64>("Value", |s: &Self| Value::from(s.value))]
    }

    fn parent() -> Option<ParentLink<Self>> {
        Some(ParentLink::new::<Simple>(|s: &Self| &s.base))
    }
}

// ---------------------------------------------------------------------------
// Parent / Child
// ---------------------------------------------------------------------------

/// Owner of a list of children and an optional favourite child.
#[derive(Debug, Clone)]
pub struct Parent {
    pub id: i64,
    pub name: String,
    pub another: i32,
    pub favourite: Option<Child>,
    pub children: Vec<Child>,
}

impl Parent {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            name: format!("parent {id}"),
            another: 0,
            favourite: None,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Child) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_favourite(mut self, child: Child) -> Self {
        self.favourite = Some(child);
        self
    }
}

impl Reflect for Parent {
    fn members() -> Vec<Member<Self>> {
        vec![
            Member::of::<i64>("Id", |s: &Self| Value::from(s.id)),
            Member::of::<String>("Name", |s: &Self| Value::from(&s.name)),
            Member::of::<i32>("Another", |s: &Self| Value::from(s.another)),
            Member::shape::<Child>("Favourite", |s: &Self| {
                Value::entity_opt(s.favourite.as_ref())
            }),
            Member::list::<Child>("Children", |s: &Self| Value::list(&s.children)),
        ]
    }
}

/// A child that may point back at its parent.
#[derive(Debug, Clone)]
pub struct Child {
    pub id: i64,
    pub name: String,
    pub parent: Option<Arc<Parent>>,
}

impl Child {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            name: format!("child {id}"),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: Arc<Parent>) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl Reflect for Child {
    fn members() -> Vec<Member<Self>> {
        vec![
            Member::of::<i64>("Id", |s: &Self| Value::from(s.id)),
            Member::of::<String>("Name", |s: &Self| Value::from(&s.name)),
            Member::shape::<Parent>("Parent", |s: &Self| {
                Value::entity_opt(s.parent.as_deref())
            }),
        ]
    }
}

// ---------------------------------------------------------------------------
// Sample shapes
// ---------------------------------------------------------------------------

/// A flat shape with an `Ignore` member meant to be skipped by convention.
#[derive(Debug, Clone)]
pub struct SampleClass {
    pub id: i64,
    pub name: String,
    pub ignore: String,
    pub value: f64,
}

impl SampleClass {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            ignore: String::new(),
            value: 0.0,
        }
    }
}

impl Reflect for SampleClass {
    fn members() -> Vec<Member<Self>> {
        vec![
            Member::of::<i64>("Id", |s: &Self| Value::from(s.id)),
            Member::of::<String>("Name", |s: &Self| Value::from(&s.name)),
            Member::of::<String>("Ignore", |s: &Self| Value::from(&s.ignore)),
            Member::of::<f64>("Value", |s: &Self| Value::from(s.value)),
        ]
    }
}

/// A shape with a list of [`SampleClass`] children.
#[derive(Debug, Clone)]
pub struct SampleList {
    pub id: i64,
    pub children: Vec<SampleClass>,
}

impl SampleList {
    pub fn new(id: i64, children: Vec<SampleClass>) -> Self {
        Self { id, children }
    }
}

impl Reflect for SampleList {
    fn members() -> Vec<Member<Self>> {
        vec![
            Member::of::<i64>("Id", |s: &Self| Value::from(s.id)),
            Member::list::<SampleClass>("Children", |s: &Self| Value::list(&s.children)),
        ]
    }
}

/// A [`SampleClass`] extended with dictionary members.
#[derive(Debug, Clone)]
pub struct SampleDictionary {
    pub base: SampleClass,
    pub integers: BTreeMap<String, i64>,
    pub strings: BTreeMap<String, String>,
    pub children: BTreeMap<String, SampleClass>,
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl SampleDictionary {
    pub fn new(id: i64) -> Self {
        Self {
            base: SampleClass::new(id, "dictionary"),
            integers: BTreeMap::new(),
            strings: BTreeMap::new(),
            children: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }
}

impl Reflect for SampleDictionary {
    fn members() -> Vec<Member<Self>> {
        vec![
            Member::of::<BTreeMap<String, i64>>("Integers", |s: &Self| {
                Value::map(s.integers.iter().map(|(k, v)| (k.as_str(), *v)))
            }),
            Member::of::<BTreeMap<String, String>>("Strings", |s: &Self| {
                Value::map(s.strings.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            }),
            Member::new(
                "Children",
                TypeDesc::map_of(TypeDesc::of::<String>(), SampleClass::type_desc()),
                |s: &Self| {
                    Value::map(
                        s.children
                            .iter()
                            .map(|(k, v)| (Value::from(k), Value::entity(v))),
                    )
                },
            ),
            Member::new(
                "Properties",
                TypeDesc::map_of(TypeDesc::of::<String>(), TypeDesc::dynamic()),
                |s: &Self| {
                    Value::map(
                        s.properties
                            .iter()
                            .map(|(k, v)| (Value::from(k), Value::from(v.clone()))),
                    )
                },
            ),
        ]
    }

    fn parent() -> Option<ParentLink<Self>> {
        Some(ParentLink::new::<SampleClass>(|s: &Self| &s.base))
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A linked node whose successor is set after construction, so that a node
/// can reach itself.
pub struct Node {
    pub id: i64,
    pub next: OnceLock<Arc<Node>>,
}

impl Node {
    pub fn new(id: i64) -> Arc<Self> {
        Arc::new(Self {
            id,
            next: OnceLock::new(),
        })
    }

    /// Links `from` to `to`. Panics if `from` is already linked.
    pub fn link(from: &Arc<Node>, to: &Arc<Node>) {
        assert!(from.next.set(Arc::clone(to)).is_ok(), "node linked once");
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("next", &self.next.get().map(|n| n.id))
            .finish()
    }
}

impl Reflect for Node {
    fn members() -> Vec<Member<Self>> {
        vec![
            Member::of::<i64>("Id", |s: &Self| Value::from(s.id)),
            Member::shape::<Node>("Next", |s: &Self| {
                Value::entity_opt(s.next.get().map(Arc::as_ref))
            }),
        ]
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identity keyed on the `id` field of [`Parent`], [`Child`] and [`SampleClass`].
pub fn identity() -> KeyedIdentity {
    KeyedIdentity::new()
        .with::<Parent>(|p| Some(IdentityKey::new(p.id)))
        .with::<Child>(|c| Some(IdentityKey::new(c.id)))
        .with::<SampleClass>(|s| Some(IdentityKey::new(s.id)))
}
