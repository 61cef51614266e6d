//! Deduplicated, ordered collections that are safe to read while being rebuilt.
//!
//! [`OrderedSet`] keeps elements in insertion order, optionally reordered by an
//! explicit numeric key. Mutations only mark the set dirty; the sorted view is
//! rebuilt lazily on the next read and published as a whole `Arc<Vec<T>>`.
//!
//! # Ordering
//!
//! - Elements without an order key behave as key `0`.
//! - The snapshot is stably sorted by key, so insertion order breaks ties.
//! - A key of `0` is the same as no key.
//! - Re-inserting an existing element is a no-op, except that a non-zero key
//!   replaces a missing one. Two different non-zero keys for the same element
//!   are an [`OrderConflict`].
//!
//! # Concurrency
//!
//! All methods take `&self`. Writers serialize on an internal mutex. Readers
//! that find the set clean only take a short read lock on the published
//! snapshot, so they observe either the previous complete snapshot or the new
//! one, never a partially built vector.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Two different non-zero order keys were requested for the same element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conflicting order keys for {value}: {existing} and {requested}")]
pub struct OrderConflict {
  pub value: String,
  pub existing: i32,
  pub requested: i32,
}

#[derive(Debug, Clone)]
struct Entry<T> {
  value: T,
  /// `None` until a non-zero key is given.
  order: Option<i32>,
}

#[derive(Debug)]
struct State<T> {
  /// Entries in insertion order.
  entries: Vec<Entry<T>>,
  /// Element -> position in `entries`.
  index: HashMap<T, usize>,
}

impl<T> Default for State<T> {
  fn default() -> Self {
    Self {
      entries: Vec::new(),
      index: HashMap::new(),
    }
  }
}

/// An insertion-ordered set with optional order keys and lazily published snapshots.
pub struct OrderedSet<T> {
  state: Mutex<State<T>>,
  dirty: AtomicBool,
  snapshot: RwLock<Arc<Vec<T>>>,
}

impl<T> Default for OrderedSet<T> {
  fn default() -> Self {
    Self {
      state: Mutex::new(State::default()),
      dirty: AtomicBool::new(false),
      snapshot: RwLock::new(Arc::new(Vec::new())),
    }
  }
}

impl<T> OrderedSet<T>
where
  T: Eq + Hash + Clone,
{
  /// Create an empty set.
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert an element without an order key.
  ///
  /// Returns `true` if the element was not present.
  pub fn insert(&self, value: T) -> bool {
    let mut state = self.state.lock();
    if state.index.contains_key(&value) {
      return false;
    }
    let position = state.entries.len();
    state.index.insert(value.clone(), position);
    state.entries.push(Entry { value, order: None });
    self.dirty.store(true, Ordering::Release);
    true
  }

  /// Insert every element of `values`, in order.
  pub fn extend<I>(&self, values: I)
  where
    I: IntoIterator<Item = T>,
  {
    for value in values {
      self.insert(value);
    }
  }

  /// Number of elements.
  pub fn len(&self) -> usize {
    self.state.lock().entries.len()
  }

  /// Whether the set has no elements.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Whether `value` is in the set.
  pub fn contains(&self, value: &T) -> bool {
    self.state.lock().index.contains_key(value)
  }

  /// Remove an element. Returns `true` if it was present.
  pub fn remove(&self, value: &T) -> bool {
    let mut state = self.state.lock();
    let Some(position) = state.index.remove(value) else {
      return false;
    };
    state.entries.remove(position);
    let State { entries, index } = &mut *state;
    for (i, entry) in entries.iter().enumerate().skip(position) {
      if let Some(slot) = index.get_mut(&entry.value) {
        *slot = i;
      }
    }
    self.dirty.store(true, Ordering::Release);
    true
  }

  /// Remove every element.
  pub fn clear(&self) {
    let mut state = self.state.lock();
    if state.entries.is_empty() {
      return;
    }
    state.entries.clear();
    state.index.clear();
    self.dirty.store(true, Ordering::Release);
  }

  /// Whether the published snapshot is stale.
  pub fn is_dirty(&self) -> bool {
    self.dirty.load(Ordering::Acquire)
  }

  /// The current ordered, deduplicated contents.
  ///
  /// Rebuilds the snapshot first if a mutation happened since the last read.
  pub fn values(&self) -> Arc<Vec<T>> {
    if self.dirty.load(Ordering::Acquire) {
      self.refresh();
    }
    self.snapshot.read().clone()
  }

  /// Collect the current contents into an owned vector.
  pub fn to_vec(&self) -> Vec<T> {
    self.values().as_ref().clone()
  }

  fn refresh(&self) {
    let state = self.state.lock();
    // Another reader may have rebuilt while we waited for the lock.
    if !self.dirty.load(Ordering::Acquire) {
      return;
    }

    let mut entries: Vec<&Entry<T>> = state.entries.iter().collect();
    entries.sort_by_key(|entry| entry.order.unwrap_or(0));
    let values: Vec<T> = entries.into_iter().map(|entry| entry.value.clone()).collect();

    *self.snapshot.write() = Arc::new(values);
    self.dirty.store(false, Ordering::Release);
  }
}

impl<T> OrderedSet<T>
where
  T: Eq + Hash + Clone + fmt::Debug,
{
  /// Insert an element with an explicit order key.
  ///
  /// An element already present without a key takes the new key. A key of
  /// `0` behaves like [`insert`](Self::insert). Returns `Ok(true)` if the
  /// element was not present.
  pub fn insert_with_order(&self, value: T, order: i32) -> Result<bool, OrderConflict> {
    if order == 0 {
      return Ok(self.insert(value));
    }
    let mut state = self.state.lock();
    if let Some(&position) = state.index.get(&value) {
      let entry = &mut state.entries[position];
      return match entry.order {
        Some(existing) if existing != order => Err(OrderConflict {
          value: format!("{:?}", value),
          existing,
          requested: order,
        }),
        Some(_) => Ok(false),
        None => {
          entry.order = Some(order);
          self.dirty.store(true, Ordering::Release);
          Ok(false)
        }
      };
    }

    let position = state.entries.len();
    state.index.insert(value.clone(), position);
    state.entries.push(Entry {
      value,
      order: Some(order),
    });
    self.dirty.store(true, Ordering::Release);
    Ok(true)
  }
}

impl<T> Clone for OrderedSet<T>
where
  T: Eq + Hash + Clone,
{
  fn clone(&self) -> Self {
    let state = self.state.lock();
    let cloned = Self {
      state: Mutex::new(State {
        entries: state.entries.clone(),
        index: state.index.clone(),
      }),
      dirty: AtomicBool::new(true),
      snapshot: RwLock::new(Arc::new(Vec::new())),
    };
    drop(state);
    cloned
  }
}

impl<T> fmt::Debug for OrderedSet<T>
where
  T: Eq + Hash + Clone + fmt::Debug,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.values().iter()).finish()
  }
}

impl<T> PartialEq for OrderedSet<T>
where
  T: Eq + Hash + Clone,
{
  fn eq(&self, other: &Self) -> bool {
    self.values() == other.values()
  }
}

impl<T> Eq for OrderedSet<T> where T: Eq + Hash + Clone {}

impl<T> FromIterator<T> for OrderedSet<T>
where
  T: Eq + Hash + Clone,
{
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    let set = Self::new();
    set.extend(iter);
    set
  }
}

impl<T> Serialize for OrderedSet<T>
where
  T: Eq + Hash + Clone + Serialize,
{
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let values = self.values();
    let mut seq = serializer.serialize_seq(Some(values.len()))?;
    for value in values.iter() {
      seq.serialize_element(value)?;
    }
    seq.end()
  }
}

/// A string with an optional explicit order key, as declared in a build description.
///
/// Deserializes from either a plain string or `{ "value": ..., "order": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "OrderedValueRepr")]
pub struct OrderedValue {
  pub value: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub order: Option<i32>,
}

impl OrderedValue {
  /// A value with an explicit order key.
  pub fn with_order(value: impl Into<String>, order: i32) -> Self {
    Self {
      value: value.into(),
      order: Some(order),
    }
  }
}

impl From<&str> for OrderedValue {
  fn from(value: &str) -> Self {
    Self {
      value: value.to_string(),
      order: None,
    }
  }
}

impl From<String> for OrderedValue {
  fn from(value: String) -> Self {
    Self { value, order: None }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OrderedValueRepr {
  Plain(String),
  Keyed {
    value: String,
    #[serde(default)]
    order: Option<i32>,
  },
}

impl From<OrderedValueRepr> for OrderedValue {
  fn from(repr: OrderedValueRepr) -> Self {
    match repr {
      OrderedValueRepr::Plain(value) => Self { value, order: None },
      OrderedValueRepr::Keyed { value, order } => Self { value, order },
    }
  }
}
