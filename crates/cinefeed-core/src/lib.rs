//! # Cinefeed
//!
//! Content storage for a cinema site's news items (`Noticia`) and homepage
//! slides (`Slider`).
//!
//! Records live in per-entity partitions of a sorted key-value store, keyed
//! by time-sortable ids. Lists are paged with opaque `after`/`before` cursors
//! that let a client walk forward and back through the newest-first (or
//! oldest-first) ordering.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cinefeed_core::api::CinefeedDB;
//! use cinefeed_core::schema::NOTICIA;
//! use serde_json::json;
//!
//! // Open (or create) a journaled store
//! let db = CinefeedDB::open("content.journal").unwrap();
//!
//! // Create a record
//! let noticia = db.create(&NOTICIA, json!({
//!     "title": "Estreno",
//!     "subtitle": "Este viernes en cines",
//! })).unwrap();
//!
//! // Page through the newest records
//! let page = db.list(&NOTICIA).limit(5).execute().unwrap();
//! assert_eq!(page.data[0].id, noticia.id);
//!
//! if let Some(cursor) = page.meta.after {
//!     let next = db.list(&NOTICIA).limit(5).after(cursor).execute().unwrap();
//!     assert!(next.data.len() <= 5);
//! }
//! ```

pub mod api;
pub mod error;
pub mod id;
pub mod schema;
pub mod storage;
pub mod types;
