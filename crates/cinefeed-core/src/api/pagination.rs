//! Cursor-based pagination over a sorted partition.
//!
//! A page is derived from exactly one range scan of `limit + 1` records. The
//! extra record is only used to learn whether another page exists in the scan
//! direction; it is never returned.
//!
//! Cursors are sort keys. `after` continues in the natural direction of the
//! request. `before` fetches the page preceding the cursor by scanning the
//! opposite way from it and reversing the result back into natural order.

use serde::{Deserialize, Serialize};

use crate::error::{Error, QueryError};
use crate::storage::{RangeQuery, RangeStore};
use crate::types::{DEFAULT_LIMIT, Record, SortDirection};

/// Position of a page relative to a previously returned boundary record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    After(String),
    Before(String),
}

/// A validated list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    limit: usize,
    sort: SortDirection,
    cursor: Option<Cursor>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            sort: SortDirection::default(),
            cursor: None,
        }
    }
}

impl ListParams {
    /// Validate raw list arguments.
    ///
    /// An absent limit defaults to [`DEFAULT_LIMIT`]; a non-positive one is
    /// rejected. Empty cursors count as absent. Supplying both cursors is
    /// rejected rather than resolved by precedence.
    pub fn new(
        limit: Option<i64>,
        sort: Option<SortDirection>,
        after: Option<String>,
        before: Option<String>,
    ) -> Result<Self, QueryError> {
        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(n) if n <= 0 => return Err(QueryError::InvalidLimit(n)),
            Some(n) => usize::try_from(n)
                .ok()
                .filter(|n| n.checked_add(1).is_some())
                .ok_or(QueryError::InvalidLimit(n))?,
        };

        let after = after.filter(|c| !c.is_empty());
        let before = before.filter(|c| !c.is_empty());
        let cursor = match (after, before) {
            (Some(_), Some(_)) => return Err(QueryError::ConflictingCursors),
            (Some(a), None) => Some(Cursor::After(a)),
            (None, Some(b)) => Some(Cursor::Before(b)),
            (None, None) => None,
        };

        Ok(Self {
            limit,
            sort: sort.unwrap_or_default(),
            cursor,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn sort(&self) -> SortDirection {
        self.sort
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }
}

/// Continuation cursors for a page.
///
/// `after` is set when records remain beyond the last element of `data` in
/// the natural direction. `before` is set when records precede the first
/// element of `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub limit: usize,
    pub after: Option<String>,
    pub before: Option<String>,
}

/// One page of a list request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub data: Vec<Record>,
    pub meta: PageMeta,
}

/// List one page of `partition`.
///
/// Issues a single range scan against `store`. Cursor records are excluded
/// from the result, and a cursor that names no existing record simply bounds
/// the scan (yielding a possibly empty page).
pub fn paginate<S: RangeStore + ?Sized>(
    store: &S,
    partition: &str,
    params: &ListParams,
) -> Result<Page, Error> {
    let limit = params.limit;
    let natural = RangeQuery::new(limit + 1, params.sort.is_reverse());

    let page = match &params.cursor {
        Some(Cursor::Before(anchor)) => {
            let query = natural.inverted().starting_after(anchor.as_str());
            let mut data = store.range_query(partition, &query)?;

            let has_before = data.len() > limit;
            data.truncate(limit);
            data.reverse();

            // The anchor itself follows this page, so `after` is always
            // reachable when the page is non-empty.
            let meta = PageMeta {
                limit,
                after: data.last().map(|r| r.id.clone()),
                before: if has_before {
                    data.first().map(|r| r.id.clone())
                } else {
                    None
                },
            };
            Page { data, meta }
        }
        Some(Cursor::After(anchor)) => {
            let query = natural.starting_after(anchor.as_str());
            let mut data = store.range_query(partition, &query)?;

            let has_after = data.len() > limit;
            data.truncate(limit);

            let meta = PageMeta {
                limit,
                after: if has_after {
                    data.last().map(|r| r.id.clone())
                } else {
                    None
                },
                before: data.first().map(|r| r.id.clone()),
            };
            Page { data, meta }
        }
        None => {
            let mut data = store.range_query(partition, &natural)?;

            let has_after = data.len() > limit;
            data.truncate(limit);

            let meta = PageMeta {
                limit,
                after: if has_after {
                    data.last().map(|r| r.id.clone())
                } else {
                    None
                },
                before: None,
            };
            Page { data, meta }
        }
    };

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;
    use chrono::Utc;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use serde_json::Map;

    const PK: &str = "Noticia";

    fn record(sk: &str) -> Record {
        let now = Utc::now();
        Record {
            partition: PK.to_string(),
            sort_key: sk.to_string(),
            id: sk.to_string(),
            created_on: now,
            saved_on: now,
            app_version: "test".to_string(),
            fields: Map::new(),
        }
    }

    fn store_with(n: usize) -> (MemoryStore, Vec<String>) {
        let store = MemoryStore::new();
        let ids: Vec<String> = (0..n).map(|i| format!("r{i:04}")).collect();
        for id in &ids {
            store.put(&record(id)).unwrap();
        }
        (store, ids)
    }

    fn params(
        limit: i64,
        sort: SortDirection,
        after: Option<&str>,
        before: Option<&str>,
    ) -> ListParams {
        ListParams::new(
            Some(limit),
            Some(sort),
            after.map(str::to_string),
            before.map(str::to_string),
        )
        .unwrap()
    }

    fn ids(page: &Page) -> Vec<&str> {
        page.data.iter().map(|r| r.id.as_str()).collect()
    }

    fn meta(limit: usize, after: Option<&str>, before: Option<&str>) -> PageMeta {
        PageMeta {
            limit,
            after: after.map(str::to_string),
            before: before.map(str::to_string),
        }
    }

    /// Counts range scans issued against the wrapped store.
    struct CountingStore {
        inner: MemoryStore,
        queries: Mutex<Vec<RangeQuery>>,
    }

    impl RangeStore for CountingStore {
        fn range_query(
            &self,
            partition: &str,
            query: &RangeQuery,
        ) -> Result<Vec<Record>, StorageError> {
            self.queries.lock().push(query.clone());
            self.inner.range_query(partition, query)
        }
        fn get(&self, partition: &str, sort_key: &str) -> Result<Option<Record>, StorageError> {
            self.inner.get(partition, sort_key)
        }
        fn put(&self, record: &Record) -> Result<(), StorageError> {
            self.inner.put(record)
        }
        fn delete(&self, partition: &str, sort_key: &str) -> Result<(), StorageError> {
            self.inner.delete(partition, sort_key)
        }
        fn ids(&self) -> &crate::id::IdGenerator {
            self.inner.ids()
        }
    }

    #[test]
    fn test_defaults() {
        let p = ListParams::new(None, None, None, None).unwrap();
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.sort(), SortDirection::Desc);
        assert_eq!(p.cursor(), None);
        assert_eq!(p, ListParams::default());
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(matches!(
            ListParams::new(Some(0), None, None, None),
            Err(QueryError::InvalidLimit(0))
        ));
        assert!(matches!(
            ListParams::new(Some(-3), None, None, None),
            Err(QueryError::InvalidLimit(-3))
        ));
        assert!(matches!(
            ListParams::new(None, None, Some("a".into()), Some("b".into())),
            Err(QueryError::ConflictingCursors)
        ));
    }

    #[test]
    fn test_empty_cursors_are_absent() {
        let p = ListParams::new(None, None, Some(String::new()), Some(String::new())).unwrap();
        assert_eq!(p.cursor(), None);
        let p = ListParams::new(None, None, Some(String::new()), Some("x".into())).unwrap();
        assert_eq!(p.cursor(), Some(&Cursor::Before("x".to_string())));
    }

    #[test]
    fn test_three_records_descending() {
        let (store, _) = store_with(3);
        let desc = SortDirection::Desc;

        let page = paginate(&store, PK, &params(2, desc, None, None)).unwrap();
        assert_eq!(ids(&page), vec!["r0002", "r0001"]);
        assert_eq!(page.meta, meta(2, Some("r0001"), None));

        let page = paginate(&store, PK, &params(2, desc, Some("r0001"), None)).unwrap();
        assert_eq!(ids(&page), vec!["r0000"]);
        assert_eq!(page.meta, meta(2, None, Some("r0000")));

        let page = paginate(&store, PK, &params(2, desc, None, Some("r0000"))).unwrap();
        assert_eq!(ids(&page), vec!["r0002", "r0001"]);
        assert_eq!(page.meta, meta(2, Some("r0001"), None));
    }

    #[test]
    fn test_three_records_ascending() {
        let (store, _) = store_with(3);
        let asc = SortDirection::Asc;

        let page = paginate(&store, PK, &params(2, asc, None, None)).unwrap();
        assert_eq!(ids(&page), vec!["r0000", "r0001"]);
        assert_eq!(page.meta, meta(2, Some("r0001"), None));

        let page = paginate(&store, PK, &params(2, asc, Some("r0001"), None)).unwrap();
        assert_eq!(ids(&page), vec!["r0002"]);
        assert_eq!(page.meta, meta(2, None, Some("r0002")));

        let page = paginate(&store, PK, &params(2, asc, None, Some("r0002"))).unwrap();
        assert_eq!(ids(&page), vec!["r0000", "r0001"]);
        assert_eq!(page.meta, meta(2, Some("r0001"), None));
    }

    #[test]
    fn test_before_with_further_previous_page() {
        let (store, _) = store_with(6);
        let desc = SortDirection::Desc;

        // Natural DESC order: r5 r4 | r3 r2 | r1 r0
        let page = paginate(&store, PK, &params(2, desc, None, Some("r0001"))).unwrap();
        assert_eq!(ids(&page), vec!["r0003", "r0002"]);
        assert_eq!(page.meta, meta(2, Some("r0002"), Some("r0003")));

        let prev = paginate(&store, PK, &params(2, desc, None, Some("r0003"))).unwrap();
        assert_eq!(ids(&prev), vec!["r0005", "r0004"]);
        assert_eq!(prev.meta, meta(2, Some("r0004"), None));
    }

    #[test]
    fn test_walking_back_shows_every_record_once() {
        let (store, all) = store_with(7);
        let desc = SortDirection::Desc;

        // Last DESC page is [r0]; step back from it until the start.
        let mut seen: Vec<String> = vec!["r0000".to_string()];
        let mut cursor = "r0000".to_string();
        loop {
            let page = paginate(&store, PK, &params(2, desc, None, Some(cursor.as_str()))).unwrap();
            let mut ids: Vec<String> = page.data.iter().map(|r| r.id.clone()).collect();
            ids.extend(seen);
            seen = ids;
            match page.meta.before {
                Some(before) => cursor = before,
                None => break,
            }
        }

        let mut newest_first = all;
        newest_first.reverse();
        assert_eq!(seen, newest_first);
    }

    #[test]
    fn test_empty_partition() {
        let store = MemoryStore::new();
        for cursor in [(None, None), (Some("x"), None), (None, Some("x"))] {
            let page = paginate(
                &store,
                PK,
                &params(5, SortDirection::Desc, cursor.0, cursor.1),
            )
            .unwrap();
            assert!(page.data.is_empty());
            assert_eq!(page.meta, meta(5, None, None));
        }
    }

    #[test]
    fn test_nonexistent_cursor_bounds_scan() {
        let (store, _) = store_with(4);
        // "r0001x" sorts between r0001 and r0002.
        let page = paginate(&store, PK, &params(10, SortDirection::Asc, Some("r0001x"), None))
            .unwrap();
        assert_eq!(ids(&page), vec!["r0002", "r0003"]);

        let page = paginate(&store, PK, &params(10, SortDirection::Asc, Some("zzz"), None))
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.meta, meta(10, None, None));
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_cursor() {
        let (store, _) = store_with(4);
        let page = paginate(&store, PK, &params(2, SortDirection::Asc, Some("r0001"), None))
            .unwrap();
        assert_eq!(ids(&page), vec!["r0002", "r0003"]);
        assert_eq!(page.meta.after, None);
    }

    #[test]
    fn test_single_scan_with_overfetch() {
        let (inner, _) = store_with(5);
        let store = CountingStore {
            inner,
            queries: Mutex::new(Vec::new()),
        };

        paginate(
            &store,
            PK,
            &params(2, SortDirection::Desc, None, Some("r0001")),
        )
        .unwrap();

        let queries = store.queries.lock();
        assert_eq!(queries.len(), 1);
        assert_eq!(
            queries[0],
            RangeQuery {
                limit: 3,
                reverse: false,
                gt: Some("r0001".to_string()),
                lt: None,
            }
        );
    }

    #[test]
    fn test_works_through_trait_object() {
        let (store, _) = store_with(3);
        let dyn_store: &dyn RangeStore = &store;
        let page = paginate(dyn_store, PK, &ListParams::default()).unwrap();
        assert_eq!(ids(&page), vec!["r0002", "r0001", "r0000"]);
        assert_eq!(page.meta, meta(DEFAULT_LIMIT, None, None));
    }

    fn arb_sort() -> impl Strategy<Value = SortDirection> {
        prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
    }

    proptest! {
        #[test]
        fn forward_traversal_visits_each_record_once(
            n in 0usize..40,
            limit in 1i64..8,
            sort in arb_sort(),
        ) {
            let (store, mut expected) = store_with(n);
            if sort == SortDirection::Desc {
                expected.reverse();
            }

            let mut seen = Vec::new();
            let mut page = paginate(&store, PK, &params(limit, sort, None, None)).unwrap();
            prop_assert_eq!(page.meta.before.clone(), None);
            loop {
                for r in &page.data {
                    seen.push(r.id.clone());
                }
                let Some(after) = page.meta.after.clone() else { break };
                page = paginate(&store, PK, &params(limit, sort, Some(after.as_str()), None)).unwrap();
                prop_assert!(!page.data.iter().any(|r| r.id == after));
                prop_assert!(page.meta.before.is_some() || page.data.is_empty());
            }
            prop_assert_eq!(seen, expected);
        }

        #[test]
        fn before_returns_preceding_page_and_after_returns_back(
            n in 1usize..40,
            limit in 1i64..8,
            start in 0usize..40,
            sort in arb_sort(),
        ) {
            let (store, mut ordered) = store_with(n);
            if sort == SortDirection::Desc {
                ordered.reverse();
            }
            // Anchor a page so that it starts at `start` in natural order.
            let start = start % n;
            let page = if start == 0 {
                paginate(&store, PK, &params(limit, sort, None, None)).unwrap()
            } else {
                paginate(&store, PK, &params(limit, sort, Some(ordered[start - 1].as_str()), None)).unwrap()
            };
            prop_assert_eq!(page.meta.before.is_none(), start == 0);

            if let Some(before) = page.meta.before.clone() {
                let prev = paginate(&store, PK, &params(limit, sort, None, Some(before.as_str()))).unwrap();
                let lim = limit as usize;
                let from = start.saturating_sub(lim);
                let expected: Vec<&str> = ordered[from..start].iter().map(String::as_str).collect();
                prop_assert_eq!(ids(&prev), expected);
                prop_assert_eq!(prev.meta.before.is_none(), from == 0);

                let back_after = prev.meta.after.clone().unwrap();
                let back = paginate(&store, PK, &params(limit, sort, Some(back_after.as_str()), None)).unwrap();
                prop_assert_eq!(ids(&back), ids(&page));
            }
        }
    }
}
