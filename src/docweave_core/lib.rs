// Copyright 2024 Vincent Chan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Typed paths, query templates and cascading relationships over a
//! document store.
//!
//! The crate sits between application code and an existing document store
//! driver, represented by the [`DocumentStore`](store::DocumentStore) trait.
//! It provides:
//!
//! - [`path!`] and the [`path`] compiler, turning typed member access into
//!   dotted and positional update paths;
//! - [`Template`], token substitution over raw query, update and pipeline
//!   text that refuses to render while any token is unresolved;
//! - [`relation`], relationships persisted in join collections;
//! - [`DbContext::delete`] and friends, deleting entities together with
//!   their join rows and file chunks in bounded batches.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bson::{doc, oid::ObjectId};
//! use serde::{Deserialize, Serialize};
//! use docweave_core::{DbContext, Entity, MemoryStore, Result};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Author {
//!     #[serde(rename = "_id")]
//!     id: ObjectId,
//!     name: String,
//! }
//!
//! impl Entity for Author {
//!     type Id = ObjectId;
//!
//!     fn id(&self) -> &ObjectId { &self.id }
//!     fn set_id(&mut self, id: ObjectId) { self.id = id; }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let ctx = DbContext::new(Arc::new(MemoryStore::new()));
//!
//! let mut author = Author { id: ObjectId::from_bytes([0; 12]), name: "Vincent".into() };
//! ctx.save(&mut author).await?;
//!
//! let result = ctx.delete_one::<Author>(&author.id, None).await?;
//! assert_eq!(result.deleted_count, 1);
//! # Ok(())
//! # }
//! ```

mod errors;
mod macros;
mod utils;
mod config;
mod context;
mod results;
mod template;

pub mod cascade;
pub mod entity;
pub mod options;
pub mod path;
pub mod relation;
pub mod store;

pub use bson;

pub use cascade::{CascadeDelete, DELETE_BATCH_SIZE};
pub use config::{Config, ConfigBuilder, FilterPosition};
pub use context::{DbContext, DbContextBuilder};
pub use entity::{Entity, EntityId, EntityInfo, FileChunk, One};
pub use errors::{Error, RegexError, RelationNotFoundError};
pub use relation::{Cardinality, JoinRecord, Many, Relations, Side};
pub use results::{DeleteResult, InsertOneResult, UpdateResult};
pub use store::{DocumentCursor, DocumentStore, MemoryStore, Session};
pub use template::Template;

pub type Result<T> = std::result::Result<T, Error>;
