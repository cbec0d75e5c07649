//! Storage: the sorted-store capability and its in-memory/journaled implementation.

pub mod journal;
pub mod lock;
pub mod memory;

pub use memory::MemoryStore;

use crate::error::StorageError;
use crate::id::IdGenerator;
use crate::types::Record;

/// A bounded range scan over one partition.
///
/// Values are built fresh per call and never mutated in place; the
/// builder-style methods consume `self` and return a new query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    /// Maximum number of records to return.
    pub limit: usize,
    /// Walk the index from the highest sort key down.
    pub reverse: bool,
    /// Exclusive lower bound on the sort key.
    pub gt: Option<String>,
    /// Exclusive upper bound on the sort key.
    pub lt: Option<String>,
}

impl RangeQuery {
    pub fn new(limit: usize, reverse: bool) -> Self {
        Self {
            limit,
            reverse,
            gt: None,
            lt: None,
        }
    }

    /// The same query scanning in the opposite direction.
    pub fn inverted(self) -> Self {
        Self {
            reverse: !self.reverse,
            ..self
        }
    }

    /// Restrict the scan to keys strictly beyond `key` in scan order:
    /// below it when scanning in reverse, above it otherwise.
    pub fn starting_after(self, key: impl Into<String>) -> Self {
        if self.reverse {
            Self {
                lt: Some(key.into()),
                ..self
            }
        } else {
            Self {
                gt: Some(key.into()),
                ..self
            }
        }
    }
}

/// The sorted key-value capability the API is written against.
///
/// Within a partition, records are totally ordered by sort key.
/// Implementations must be safe to share across threads.
pub trait RangeStore: Send + Sync {
    /// Up to `query.limit` records of `partition` within the query's bounds,
    /// descending when `query.reverse`, ascending otherwise.
    fn range_query(&self, partition: &str, query: &RangeQuery)
    -> Result<Vec<Record>, StorageError>;

    fn get(&self, partition: &str, sort_key: &str) -> Result<Option<Record>, StorageError>;

    /// Insert or replace the record at its `(partition, sort_key)`.
    fn put(&self, record: &Record) -> Result<(), StorageError>;

    /// Remove a record. Removing an absent key is not an error.
    fn delete(&self, partition: &str, sort_key: &str) -> Result<(), StorageError>;

    /// The id source for new records. Every handle onto the same data must
    /// return the same generator, so that creation order and sort-key order
    /// agree no matter which handle created a record.
    fn ids(&self) -> &IdGenerator;
}
