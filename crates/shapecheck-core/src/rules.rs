/// Per-shape comparison rules.
///
/// A [`RuleSet`] holds one [`MemberRule`] per directly declared member of a
/// shape, in comparison order, plus the link to its parent shape. Rule-sets
/// are built once per shape, either by hand through [`RuleSetBuilder`] or
/// automatically over every declared member, and cached by the
/// [`RuleSetRegistry`](crate::RuleSetRegistry).
use std::any::TypeId;

use tracing::debug;

use crate::conventions::{Comparer, Conventions};
use crate::failure::ConfigError;
use crate::kind::ComparisonKind;
use crate::shape::{MemberDesc, ParentDesc, Reflect, ShapeDescriptor};
use crate::types::{Describe, TypeDesc};
use crate::value::FromValue;

// ---------------------------------------------------------------------------
// MemberRule
// ---------------------------------------------------------------------------

/// How one member of a shape is compared.
#[derive(Debug, Clone)]
pub struct MemberRule {
    member: MemberDesc,
    kind: ComparisonKind,
    comparer: Option<Comparer>,
    length: usize,
}

impl MemberRule {
    /// Creates a rule with the kind resolved from `conventions`.
    pub fn resolved(member: MemberDesc, conventions: &Conventions) -> Result<Self, ConfigError> {
        let kind = conventions.resolve_member_kind(&member);
        let mut rule = Self {
            member,
            kind: ComparisonKind::Value,
            comparer: None,
            length: 0,
        };
        rule.set_kind(kind, conventions)?;
        Ok(rule)
    }

    /// The member being compared.
    pub fn member(&self) -> &MemberDesc {
        &self.member
    }

    /// Member name.
    pub fn name(&self) -> &str {
        self.member.name()
    }

    /// Comparison kind.
    pub fn kind(&self) -> ComparisonKind {
        self.kind
    }

    /// Explicit comparer, if one was set.
    pub fn comparer(&self) -> Option<&Comparer> {
        self.comparer.as_ref()
    }

    /// Maximum number of leading characters compared for text; `0` means unbounded.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Changes the kind.
    ///
    /// Setting [`ComparisonKind::Id`] fails immediately if no identity
    /// strategy is assigned or the member's declared type has no identity.
    pub fn set_kind(
        &mut self,
        kind: ComparisonKind,
        conventions: &Conventions,
    ) -> Result<(), ConfigError> {
        if kind == ComparisonKind::Id {
            let ids = conventions.identity();
            if !ids.is_configured() {
                return Err(ConfigError::NoIdentityStrategy);
            }
            if !ids.supports_id(self.member.declared_type()) {
                return Err(ConfigError::IdentityUnsupported {
                    member: self.member.name().to_owned(),
                    type_name: self.member.declared_type().name().to_owned(),
                });
            }
        }
        self.kind = kind;
        Ok(())
    }

    /// Fixes the comparer, overriding conventions.
    pub fn set_comparer(&mut self, comparer: Comparer) {
        self.comparer = Some(comparer);
    }

    /// Bounds text comparison to the first `length` characters.
    pub fn set_length(&mut self, length: usize) {
        self.length = length;
    }
}

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// The compiled rules for one shape.
#[derive(Debug, Clone)]
pub struct RuleSet {
    shape: TypeDesc,
    rules: Vec<MemberRule>,
    parent: Option<ParentDesc>,
}

impl RuleSet {
    /// Starts a hand-authored rule-set for `T`.
    pub fn builder<T: Reflect>(conventions: &Conventions) -> RuleSetBuilder<'_> {
        RuleSetBuilder::new(ShapeDescriptor::of::<T>(), conventions)
    }

    /// Builds a rule-set covering every declared member of `T`.
    pub fn auto<T: Reflect>(conventions: &Conventions) -> Result<Self, ConfigError> {
        Self::auto_from(ShapeDescriptor::of::<T>(), conventions)
    }

    /// Builds a rule-set covering every member of a reflected shape.
    pub fn auto_from(
        descriptor: ShapeDescriptor,
        conventions: &Conventions,
    ) -> Result<Self, ConfigError> {
        let mut builder = RuleSetBuilder::new(descriptor, conventions);
        builder.auto()?;
        Ok(builder.build())
    }

    /// Descriptor of the shape.
    pub fn shape(&self) -> &TypeDesc {
        &self.shape
    }

    /// [`TypeId`] of the shape.
    pub fn shape_id(&self) -> Option<TypeId> {
        self.shape.type_id()
    }

    /// Member rules in comparison order.
    pub fn rules(&self) -> &[MemberRule] {
        &self.rules
    }

    /// Looks up the rule for a member.
    pub fn member(&self, name: &str) -> Option<&MemberRule> {
        self.rules.iter().find(|r| r.name() == name)
    }

    /// The parent shape, compared before the declared members.
    pub fn parent(&self) -> Option<&ParentDesc> {
        self.parent.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds a [`RuleSet`] member by member.
#[derive(Debug)]
pub struct RuleSetBuilder<'c> {
    descriptor: ShapeDescriptor,
    conventions: &'c Conventions,
    rules: Vec<MemberRule>,
}

impl<'c> RuleSetBuilder<'c> {
    fn new(descriptor: ShapeDescriptor, conventions: &'c Conventions) -> Self {
        Self {
            descriptor,
            conventions,
            rules: Vec::new(),
        }
    }

    /// Adds (or re-resolves) the rule for `name` and returns it for tweaking.
    ///
    /// A member that already has a rule keeps its position; only its kind is
    /// re-resolved from conventions.
    pub fn compare(&mut self, name: &str) -> Result<MemberRuleExpr<'_>, ConfigError> {
        let member = self
            .descriptor
            .member(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownMember {
                shape: self.descriptor.shape_type().name().to_owned(),
                member: name.to_owned(),
            })?;

        let index = match self.rules.iter().position(|r| r.name() == name) {
            Some(index) => {
                let kind = self.conventions.resolve_member_kind(&member);
                if let Some(rule) = self.rules.get_mut(index) {
                    rule.set_kind(kind, self.conventions)?;
                }
                index
            }
            None => {
                self.rules
                    .push(MemberRule::resolved(member, self.conventions)?);
                self.rules.len() - 1
            }
        };

        let conventions = self.conventions;
        match self.rules.get_mut(index) {
            Some(rule) => Ok(MemberRuleExpr { rule, conventions }),
            None => Err(ConfigError::UnknownMember {
                shape: self.descriptor.shape_type().name().to_owned(),
                member: name.to_owned(),
            }),
        }
    }

    /// Adds a rule for every declared member not yet covered.
    pub fn auto(&mut self) -> Result<&mut Self, ConfigError> {
        let missing: Vec<MemberDesc> = self
            .descriptor
            .members()
            .iter()
            .filter(|m| !self.rules.iter().any(|r| r.name() == m.name()))
            .cloned()
            .collect();
        for member in missing {
            self.rules
                .push(MemberRule::resolved(member, self.conventions)?);
        }
        Ok(self)
    }

    /// Finishes the rule-set.
    pub fn build(self) -> RuleSet {
        debug!(
            shape = self.descriptor.shape_type().name(),
            rules = self.rules.len(),
            "rule-set built"
        );
        RuleSet {
            shape: self.descriptor.shape_type().clone(),
            parent: self.descriptor.parent().cloned(),
            rules: self.rules,
        }
    }
}

/// Fluent tweaks for one member rule.
pub struct MemberRuleExpr<'r> {
    rule: &'r mut MemberRule,
    conventions: &'r Conventions,
}

impl MemberRuleExpr<'_> {
    /// Compare by identity key. Fails if the member's type has no identity.
    pub fn id(self) -> Result<Self, ConfigError> {
        self.rule.set_kind(ComparisonKind::Id, self.conventions)?;
        Ok(self)
    }

    /// Compare recursively as a nested shape.
    pub fn entity(self) -> Self {
        self.set(ComparisonKind::Entity)
    }

    /// Compare the element count only.
    pub fn count(self) -> Self {
        self.set(ComparisonKind::Count)
    }

    /// Compare the count, then each element by position.
    pub fn collection(self) -> Self {
        self.set(ComparisonKind::Collection)
    }

    /// Compare key by key.
    pub fn dictionary(self) -> Self {
        self.set(ComparisonKind::Dictionary)
    }

    /// Compare by value equality.
    pub fn value(self) -> Self {
        self.set(ComparisonKind::Value)
    }

    /// Skip the member.
    pub fn ignore(self) -> Self {
        self.set(ComparisonKind::Ignore)
    }

    /// Compare by value with a typed equality function.
    pub fn value_with<T, F>(self, f: F) -> Self
    where
        T: FromValue + Describe,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.comparer(Comparer::typed(f)).value()
    }

    /// Fix the comparer for the member.
    pub fn comparer(self, comparer: Comparer) -> Self {
        self.rule.set_comparer(comparer);
        self
    }

    /// Compare only the first `length` characters of text.
    pub fn length(self, length: usize) -> Self {
        self.rule.set_length(length);
        self
    }

    /// The rule being configured.
    pub fn rule(&self) -> &MemberRule {
        self.rule
    }

    // Every kind but Id is accepted without validation.
    fn set(self, kind: ComparisonKind) -> Self {
        self.rule.kind = kind;
        self
    }
}
