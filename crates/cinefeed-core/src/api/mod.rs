//! Public API: content handle, entity CRUD, and cursor pagination.

pub mod builders;
pub mod database;
pub mod pagination;

pub use builders::ListBuilder;
pub use database::CinefeedDB;
pub use pagination::{Cursor, ListParams, Page, PageMeta, paginate};
