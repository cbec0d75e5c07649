use crate::error::Error;
use crate::schema::EntitySchema;
use crate::storage::RangeStore;
use crate::types::SortDirection;

use super::database::CinefeedDB;
use super::pagination::{ListParams, Page, paginate};

// ---------------------------------------------------------------------------
// ListBuilder
// ---------------------------------------------------------------------------

/// Builder for listing one page of an entity's records.
///
/// Arguments are collected as given and validated together in
/// [`execute`](Self::execute).
pub struct ListBuilder<'a, S> {
    db: &'a CinefeedDB<S>,
    schema: &'static EntitySchema,
    limit: Option<i64>,
    sort: Option<SortDirection>,
    after: Option<String>,
    before: Option<String>,
}

impl<'a, S: RangeStore> ListBuilder<'a, S> {
    pub(crate) fn new(db: &'a CinefeedDB<S>, schema: &'static EntitySchema) -> Self {
        Self {
            db,
            schema,
            limit: None,
            sort: None,
            after: None,
            before: None,
        }
    }

    /// Maximum number of records on the page (default 10).
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn sort(mut self, sort: SortDirection) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Continue after the given cursor (a previous page's `meta.after`).
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Fetch the page preceding the given cursor (a page's `meta.before`).
    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    /// Set both cursors from optional values, as received over the wire.
    pub fn cursors(mut self, after: Option<String>, before: Option<String>) -> Self {
        self.after = after;
        self.before = before;
        self
    }

    /// Execute the list.
    pub fn execute(self) -> Result<Page, Error> {
        let params = ListParams::new(self.limit, self.sort, self.after, self.before)?;
        paginate(self.db.store(), self.schema.partition, &params)
    }
}
