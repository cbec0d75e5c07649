use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::error::StorageError;
use crate::id::IdGenerator;
use crate::types::Record;

use super::journal::{Journal, JournalOp};
use super::lock::JournalLock;
use super::{RangeQuery, RangeStore};

type Partition = BTreeMap<String, Record>;

struct Durability {
    journal: Mutex<Journal>,
    _lock: JournalLock,
}

struct StoreInner {
    partitions: RwLock<BTreeMap<String, Partition>>,
    durability: Option<Durability>,
    ids: IdGenerator,
}

/// A sorted, partitioned record store.
///
/// `MemoryStore` is cheaply clonable (`Arc`-based) and `Send + Sync`.
/// Reads run concurrently; writes are serialized. When opened on a journal
/// path, every mutation is appended and synced before it becomes visible.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    /// A volatile store with no journal.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                partitions: RwLock::new(BTreeMap::new()),
                durability: None,
                ids: IdGenerator::new(),
            }),
        }
    }

    /// Open (or create) a durable store backed by the journal at `path`.
    ///
    /// Fails with [`StorageError::FileLocked`] if another handle already has
    /// the journal open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let lock = JournalLock::acquire(path)?;

        let (journal, ops) = Journal::open(path)?;
        let mut partitions: BTreeMap<String, Partition> = BTreeMap::new();
        for op in ops {
            apply(&mut partitions, op);
        }
        // New ids must sort after every replayed one.
        let ids = IdGenerator::new();
        for newest in partitions.values().filter_map(|p| p.keys().next_back()) {
            ids.observe(newest);
        }

        Ok(Self {
            inner: Arc::new(StoreInner {
                partitions: RwLock::new(partitions),
                durability: Some(Durability {
                    journal: Mutex::new(journal),
                    _lock: lock,
                }),
                ids,
            }),
        })
    }

    /// Rewrite the journal so it holds exactly one put per live record.
    /// A no-op for volatile stores.
    pub fn compact(&self) -> Result<(), StorageError> {
        let Some(durability) = &self.inner.durability else {
            return Ok(());
        };
        // Holding the read lock keeps writers (which take the write lock)
        // out until the new journal is in place.
        let partitions = self.inner.partitions.read();
        let mut journal = durability.journal.lock();
        let path = journal.path().to_path_buf();
        let records = partitions.values().flat_map(|p| p.values());
        *journal = Journal::rewrite(&path, records)?;
        let live: usize = partitions.values().map(|p| p.len()).sum();
        info!(path = %path.display(), records = live, "journal compacted");
        Ok(())
    }

    /// Number of records in `partition`.
    pub fn len(&self, partition: &str) -> usize {
        self.inner
            .partitions
            .read()
            .get(partition)
            .map_or(0, |p| p.len())
    }

    pub fn is_durable(&self) -> bool {
        self.inner.durability.is_some()
    }

    fn write(&self, op: JournalOp) -> Result<(), StorageError> {
        let mut partitions = self.inner.partitions.write();
        if let Some(durability) = &self.inner.durability {
            durability.journal.lock().append(&op)?;
        }
        apply(&mut partitions, op);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply(partitions: &mut BTreeMap<String, Partition>, op: JournalOp) {
    match op {
        JournalOp::Put { record } => {
            partitions
                .entry(record.partition.clone())
                .or_default()
                .insert(record.sort_key.clone(), record);
        }
        JournalOp::Delete {
            partition,
            sort_key,
        } => {
            if let Some(p) = partitions.get_mut(&partition) {
                p.remove(&sort_key);
                if p.is_empty() {
                    partitions.remove(&partition);
                }
            }
        }
    }
}

impl RangeStore for MemoryStore {
    fn range_query(
        &self,
        partition: &str,
        query: &RangeQuery,
    ) -> Result<Vec<Record>, StorageError> {
        let partitions = self.inner.partitions.read();
        let Some(records) = partitions.get(partition) else {
            return Ok(Vec::new());
        };

        // BTreeMap::range panics on an inverted or empty exclusive range.
        if let (Some(gt), Some(lt)) = (&query.gt, &query.lt)
            && gt >= lt
        {
            return Ok(Vec::new());
        }

        let lower = match &query.gt {
            Some(gt) => Bound::Excluded(gt.as_str()),
            None => Bound::Unbounded,
        };
        let upper = match &query.lt {
            Some(lt) => Bound::Excluded(lt.as_str()),
            None => Bound::Unbounded,
        };

        let range = records.range::<str, _>((lower, upper)).map(|(_, r)| r);
        let items = if query.reverse {
            range.rev().take(query.limit).cloned().collect()
        } else {
            range.take(query.limit).cloned().collect()
        };
        Ok(items)
    }

    fn get(&self, partition: &str, sort_key: &str) -> Result<Option<Record>, StorageError> {
        Ok(self
            .inner
            .partitions
            .read()
            .get(partition)
            .and_then(|p| p.get(sort_key))
            .cloned())
    }

    fn put(&self, record: &Record) -> Result<(), StorageError> {
        self.write(JournalOp::Put {
            record: record.clone(),
        })
    }

    fn delete(&self, partition: &str, sort_key: &str) -> Result<(), StorageError> {
        self.write(JournalOp::Delete {
            partition: partition.to_string(),
            sort_key: sort_key.to_string(),
        })
    }

    fn ids(&self) -> &IdGenerator {
        &self.inner.ids
    }
}
