//! # elif-relations
//!
//! Referential integrity for schema-less document stores in the elif.rs
//! framework.
//!
//! ## Features
//!
//! - **Declarative relations**: document types declare which fields point at
//!   other document types and what happens when the target is deleted
//! - **Explicit binding**: relations are resolved once into a bidirectional
//!   [`RelationGraph`], forward references included
//! - **Validation on save**: referenced documents must exist
//! - **Delete policies**: `check`, `cascade` and `set_null`
//! - **Document registry**: index bookkeeping with bulk initialization
//! - **Async-first**: every storage interaction goes through [`DocumentStore`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use elif_relations::{
//!     Document, DocumentDefinition, DocumentId, DocumentRegistry, MemoryStore, OnDelete,
//!     RelatedDocument, RelationConfig, RelationGraph, RelationManager, SaveOptions,
//!     StoreOptions,
//! };
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Author {
//!     #[serde(skip)]
//!     id: Option<DocumentId>,
//!     name: String,
//! }
//!
//! impl Document for Author {
//!     fn document_name() -> &'static str { "author" }
//!     fn index_name() -> &'static str { "authors" }
//!     fn id(&self) -> Option<&DocumentId> { self.id.as_ref() }
//!     fn set_id(&mut self, id: DocumentId) { self.id = Some(id); }
//! }
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Book {
//!     #[serde(skip)]
//!     id: Option<DocumentId>,
//!     author: Option<DocumentId>,
//! }
//!
//! impl Document for Book {
//!     fn document_name() -> &'static str { "book" }
//!     fn index_name() -> &'static str { "books" }
//!     fn id(&self) -> Option<&DocumentId> { self.id.as_ref() }
//!     fn set_id(&mut self, id: DocumentId) { self.id = Some(id); }
//!
//!     fn define(definition: &mut DocumentDefinition<Self>) {
//!         definition.relation(
//!             "author",
//!             RelatedDocument::to::<Author>().on_delete(OnDelete::Cascade),
//!             |book| book.author.clone().into(),
//!         );
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let graph = Arc::new(
//!     RelationGraph::builder()
//!         .document::<Book>()
//!         .document::<Author>()
//!         .bind()
//!         .unwrap(),
//! );
//!
//! let store = Arc::new(MemoryStore::new());
//! let registry = DocumentRegistry::new(graph.clone());
//! registry.register::<Author>().unwrap().register::<Book>().unwrap();
//! registry.init_all(store.as_ref(), false, &StoreOptions::default()).await.unwrap();
//!
//! let manager = RelationManager::new(store, graph, RelationConfig::default());
//! let mut author = Author { id: None, name: "Ursula".to_string() };
//! let author_id = manager.save(&mut author, SaveOptions::default()).await.unwrap();
//!
//! let mut book = Book { id: None, author: Some(author_id) };
//! let book_id = manager.save(&mut book, SaveOptions::default()).await.unwrap();
//!
//! // Deleting the author cascades to the book
//! manager.delete(&author, &StoreOptions::default()).await.unwrap();
//! assert!(manager.get::<Book>(&book_id).await.unwrap().is_none());
//! # });
//! ```

pub mod backends;
pub mod config;
pub mod document;
pub mod error;
pub mod manager;
pub mod mapping;
pub mod registry;
pub mod relations;
pub mod store;

#[cfg(test)]
pub(crate) mod fixtures;

pub use backends::*;
pub use config::*;
pub use document::*;
pub use error::*;
pub use manager::*;
pub use mapping::*;
pub use registry::*;
pub use relations::*;
pub use store::*;
