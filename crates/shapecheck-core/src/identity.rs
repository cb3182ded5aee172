/// Identity extraction for `Id`-kind comparisons.
///
/// An [`IdentityExtractor`] answers two questions: whether a declared type
/// can be compared by identity, and what the identity key of an instance is.
/// [`NullIdentity`] is the unconfigured fallback; [`KeyedIdentity`] maps shape
/// types to key functions registered up front.
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::shape::{Reflect, Shape};
use crate::types::TypeDesc;
use crate::value::Value;

/// An equatable identity value. Compared with default value equality.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityKey(Value<'static>);

impl IdentityKey {
    /// Wraps a value as an identity key.
    pub fn new(value: impl Into<Value<'static>>) -> Self {
        Self(value.into())
    }

    /// The wrapped value.
    pub fn value(&self) -> &Value<'static> {
        &self.0
    }

    /// Unwraps the key, mapping it back to a plain value.
    pub fn into_value(self) -> Value<'static> {
        self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Strategy for identity comparison.
pub trait IdentityExtractor: Send + Sync {
    /// Returns `true` if instances of `ty` carry an identity key.
    fn supports_id(&self, ty: &TypeDesc) -> bool;

    /// Extracts the identity key of `instance`; `None` means no identity.
    fn extract_id(&self, instance: &dyn Shape) -> Option<IdentityKey>;

    /// `false` only for the unconfigured fallback.
    fn is_configured(&self) -> bool {
        true
    }
}

/// The fallback used when no identity strategy has been assigned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIdentity;

impl IdentityExtractor for NullIdentity {
    fn supports_id(&self, _ty: &TypeDesc) -> bool {
        false
    }

    fn extract_id(&self, _instance: &dyn Shape) -> Option<IdentityKey> {
        None
    }

    fn is_configured(&self) -> bool {
        false
    }
}

type KeyFn = Arc<dyn Fn(&dyn Shape) -> Option<IdentityKey> + Send + Sync>;

/// Identity keys registered per shape type.
///
/// A shape without its own key function falls back to its parent chain, so
/// registering the base shape covers every shape that embeds it.
#[derive(Clone, Default)]
pub struct KeyedIdentity {
    keys: HashMap<TypeId, KeyFn>,
}

impl KeyedIdentity {
    /// Creates an empty strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the key function for the shape `T`, replacing any previous one.
    pub fn register<T: Reflect>(&mut self, key: fn(&T) -> Option<IdentityKey>) -> &mut Self {
        let erased: KeyFn = Arc::new(move |instance: &dyn Shape| {
            instance.as_any().downcast_ref::<T>().and_then(key)
        });
        self.keys.insert(TypeId::of::<T>(), erased);
        self
    }

    /// Builder form of [`KeyedIdentity::register`].
    pub fn with<T: Reflect>(mut self, key: fn(&T) -> Option<IdentityKey>) -> Self {
        self.register(key);
        self
    }

    /// Number of registered shape types.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no shape type is registered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl IdentityExtractor for KeyedIdentity {
    fn supports_id(&self, ty: &TypeDesc) -> bool {
        ty.unwrap_nullable()
            .lineage()
            .any(|id| self.keys.contains_key(&id))
    }

    fn extract_id(&self, instance: &dyn Shape) -> Option<IdentityKey> {
        if let Some(key) = self.keys.get(&instance.shape_id()) {
            return key(instance);
        }
        let parent = instance.descriptor().parent()?.clone();
        self.extract_id(parent.project(instance)?)
    }
}

impl fmt::Debug for KeyedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedIdentity")
            .field("shapes", &self.keys.len())
            .finish()
    }
}
