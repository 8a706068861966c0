//! Ordered, stable-ID predicate slots for admission (fetch conditions) and
//! post-headers gating (download conditions).
//!
//! Slots are `Vec<Option<Predicate>>`: `add` appends, `remove` nullifies a
//! slot in place so previously returned IDs stay valid, and evaluation
//! skips empty slots.

use futures::future::BoxFuture;

use crate::error::PredicateError;
use crate::queue::QueueItem;

/// A single admission predicate, either synchronous or asynchronous. Both
/// forms receive the candidate item and its referrer.
pub enum Predicate {
    Sync(Box<dyn Fn(&QueueItem, &QueueItem) -> Result<bool, String> + Send + Sync>),
    Async(Box<dyn Fn(&QueueItem, &QueueItem) -> BoxFuture<'static, Result<bool, String>> + Send + Sync>),
}

impl Predicate {
    /// Wrap a synchronous `(item, referrer) -> bool` predicate.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&QueueItem, &QueueItem) -> Result<bool, String> + Send + Sync + 'static,
    {
        Self::Sync(Box::new(f))
    }

    /// Wrap an asynchronous predicate returning a boxed future.
    pub fn asynchronous<F>(f: F) -> Self
    where
        F: Fn(&QueueItem, &QueueItem) -> BoxFuture<'static, Result<bool, String>> + Send + Sync + 'static,
    {
        Self::Async(Box::new(f))
    }

    async fn evaluate(&self, item: &QueueItem, referrer: &QueueItem) -> Result<bool, String> {
        match self {
            Predicate::Sync(f) => f(item, referrer),
            Predicate::Async(f) => f(item, referrer).await,
        }
    }
}

/// A single ordered array of predicate slots. An empty slot (after
/// `remove`) is always-pass and does not renumber later entries.
#[derive(Default)]
pub struct PredicateList {
    slots: Vec<Option<Predicate>>,
}

impl PredicateList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate, returning its stable slot id.
    pub fn add(&mut self, predicate: Predicate) -> usize {
        self.slots.push(Some(predicate));
        self.slots.len() - 1
    }

    /// Nullify the slot at `id`. Fails if there is no live predicate there.
    pub fn remove(&mut self, id: usize) -> Result<(), PredicateError> {
        match self.slots.get_mut(id) {
            Some(slot @ Some(_)) => {
                *slot = None;
                Ok(())
            }
            _ => Err(PredicateError::UnknownId(id)),
        }
    }

    /// Evaluate every live predicate against `item`/`referrer` in order,
    /// short-circuiting on the first `false` or error. Empty slots always
    /// pass.
    pub async fn all_pass(&self, item: &QueueItem, referrer: &QueueItem) -> Result<bool, String> {
        for slot in &self.slots {
            if let Some(predicate) = slot {
                if !predicate.evaluate(item, referrer).await? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The two parallel predicate arrays: evaluated at admission (before
/// queueing) and after response headers (before body streaming),
/// respectively.
#[derive(Default)]
pub struct Predicates {
    pub fetch_conditions: PredicateList,
    pub download_conditions: PredicateList,
}

impl Predicates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
