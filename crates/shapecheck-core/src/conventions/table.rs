/// Ordered, overridable predicate tables.
///
/// Registration prepends, so the most recent registration shadows older ones
/// with overlapping predicates. Resolution snapshots the current list before
/// iterating; a registration racing a resolution never corrupts it, it is
/// simply seen or not seen.
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

type Predicate<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// A list of `(predicate, outcome)` pairs with a fallback outcome.
pub struct ConventionTable<S: ?Sized, O> {
    entries: RwLock<Arc<Vec<(Predicate<S>, O)>>>,
    default: O,
}

impl<S: ?Sized, O: Clone> ConventionTable<S, O> {
    /// Creates an empty table resolving to `default`.
    pub fn new(default: O) -> Self {
        Self {
            entries: RwLock::new(Arc::new(Vec::new())),
            default,
        }
    }

    /// Registers `outcome` for subjects matching `predicate`, ahead of every
    /// earlier registration.
    pub fn register<P>(&self, predicate: P, outcome: O)
    where
        P: Fn(&S) -> bool + Send + Sync + 'static,
    {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.push((Arc::new(predicate) as Predicate<S>, outcome));
        next.extend(guard.iter().cloned());
        *guard = Arc::new(next);
    }

    /// Returns the outcome of the first matching predicate, else the default.
    pub fn resolve(&self, subject: &S) -> O {
        let snapshot = self.snapshot();
        snapshot
            .iter()
            .find(|(matches, _)| matches(subject))
            .map_or_else(|| self.default.clone(), |(_, outcome)| outcome.clone())
    }

    /// Removes every registration.
    pub fn clear(&self) {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(Vec::new());
    }

    /// Replaces every registration with those `install` makes on an empty
    /// table. Readers see either the old list or the new one, never a
    /// partially installed one.
    pub fn reset_with<F>(&self, install: F)
    where
        F: FnOnce(&Self),
    {
        let fresh = Self::new(self.default.clone());
        install(&fresh);
        let entries = fresh.snapshot();
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        *guard = entries;
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn snapshot(&self) -> Arc<Vec<(Predicate<S>, O)>> {
        Arc::clone(&self.entries.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<S: ?Sized, O: Clone + fmt::Debug> fmt::Debug for ConventionTable<S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConventionTable")
            .field("entries", &self.len())
            .field("default", &self.default)
            .finish()
    }
}
