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


//! The document store consumed by this crate.
//!
//! Everything here is a thin seam over an existing driver: the crate never
//! speaks a wire protocol itself. [`MemoryStore`] is an in-process
//! implementation used by the tests.

mod session;
mod memory;

use async_trait::async_trait;
use bson::Document;
use crate::options::FindOptions;
use crate::results::{DeleteResult, InsertOneResult, UpdateResult};
use crate::Result;

pub use session::Session;
pub(crate) use session::has_active_transaction;
pub use memory::{MemoryStore, StoreCall};

/// A server-side cursor, read one page at a time.
#[async_trait]
pub trait DocumentCursor: Send {

    /// Returns `None` once the cursor is exhausted.
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>>;

}

#[async_trait]
pub trait DocumentStore: Send + Sync {

    /// Names of the collections matching the regular expression `pattern`.
    ///
    /// Listing is an administrative command and never runs inside a
    /// transaction.
    async fn list_collection_names(&self, pattern: &str) -> Result<Vec<String>>;

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
        session: Option<&Session>,
    ) -> Result<Box<dyn DocumentCursor>>;

    async fn insert_one(
        &self,
        collection: &str,
        doc: Document,
        session: Option<&Session>,
    ) -> Result<InsertOneResult>;

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
        session: Option<&Session>,
    ) -> Result<UpdateResult>;

    async fn delete_many(
        &self,
        collection: &str,
        filter: Document,
        session: Option<&Session>,
    ) -> Result<DeleteResult>;

    async fn start_session(&self) -> Result<Session>;

    async fn start_transaction(&self, session: &Session) -> Result<()>;

    async fn commit_transaction(&self, session: &Session) -> Result<()>;

    async fn abort_transaction(&self, session: &Session) -> Result<()>;

}

/// Drains a cursor into memory.
pub async fn collect_all(mut cursor: Box<dyn DocumentCursor>) -> Result<Vec<Document>> {
    let mut result = Vec::new();
    while let Some(batch) = cursor.next_batch().await? {
        result.extend(batch);
    }
    Ok(result)
}
