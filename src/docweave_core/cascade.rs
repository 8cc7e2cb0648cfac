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


//! Deleting entities together with everything that points at them.
//!
//! For every batch of ids the engine lists the join collections touching
//! the entity's collection, then deletes the entities, their join rows and
//! (for file entities) their chunks concurrently. Batches run one after
//! another.

use std::future::Future;
use bson::{doc, Bson, Document};
use futures::future::try_join_all;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;
use crate::entity::{EntityInfo, FILE_ID};
use crate::options::FindOptions;
use crate::relation::{join_pattern, JoinName, CHILD_ID, PARENT_ID};
use crate::results::DeleteResult;
use crate::store::{has_active_transaction, DocumentStore, Session};
use crate::{Error, Result};

/// Upper bound of ids sent in one `$in`.
pub const DELETE_BATCH_SIZE: usize = 100_000;

/// The filter removing every join row that references one of `ids`, on
/// either side.
///
/// Returns `None` when `join_collection` does not touch `collection`.
pub fn join_delete_filter(join_collection: &str, collection: &str, ids: &Bson) -> Option<Document> {
    let name = JoinName::parse(join_collection)?;
    if !name.is_parent(collection) && !name.is_child(collection) {
        return None;
    }
    Some(doc! {
        "$or": [
            { PARENT_ID: { "$in": ids.clone() } },
            { CHILD_ID: { "$in": ids.clone() } },
        ],
    })
}

pub struct CascadeDelete<'a> {
    store: &'a dyn DocumentStore,
    session: Option<&'a Session>,
    chunk_collection: &'a str,
    cancellation: Option<CancellationToken>,
}

impl<'a> CascadeDelete<'a> {

    pub fn new(
        store: &'a dyn DocumentStore,
        session: Option<&'a Session>,
        chunk_collection: &'a str,
    ) -> CascadeDelete<'a> {
        CascadeDelete {
            store,
            session,
            chunk_collection,
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, cancellation: Option<CancellationToken>) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Cancelling half way is only safe when the store can roll back, so a
    /// token without an active transaction is refused up front.
    pub fn check_cancellation(&self) -> Result<()> {
        if self.cancellation.is_some() && !has_active_transaction(self.session) {
            return Err(Error::NotSupported(
                "cancellation requires an active transaction".into(),
            ));
        }
        Ok(())
    }

    pub async fn delete_ids(&self, entity: &EntityInfo, ids: Vec<Bson>) -> Result<DeleteResult> {
        self.check_cancellation()?;
        self.cancellable(self.delete_id_batches(entity, &ids)).await
    }

    pub async fn delete_matching(&self, entity: &EntityInfo, filter: Document) -> Result<DeleteResult> {
        self.check_cancellation()?;
        self.cancellable(self.delete_pages(entity, filter)).await
    }

    async fn cancellable<F>(&self, fut: F) -> Result<DeleteResult>
    where
        F: Future<Output = Result<DeleteResult>>,
    {
        match &self.cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        warn!("cascade delete cancelled");
                        Err(Error::Cancelled)
                    }
                    result = fut => result,
                }
            }
            None => fut.await,
        }
    }

    async fn delete_id_batches(&self, entity: &EntityInfo, ids: &[Bson]) -> Result<DeleteResult> {
        let mut total = DeleteResult::default();
        if ids.is_empty() {
            return Ok(total);
        }

        let batch_count = ids.len().div_ceil(DELETE_BATCH_SIZE);
        if batch_count > 1 {
            info!("deleting {} ids from '{}' in {} batches", ids.len(), entity.collection, batch_count);
        }

        for (index, batch) in ids.chunks(DELETE_BATCH_SIZE).enumerate() {
            let result = self.delete_batch(entity, batch).await?;
            if !result.acknowledged {
                warn!("batch {} on '{}' was not acknowledged", index, entity.collection);
            }
            total.merge(&result);
        }

        Ok(total)
    }

    async fn delete_batch(&self, entity: &EntityInfo, ids: &[Bson]) -> Result<DeleteResult> {
        // listing is administrative and runs outside the session
        let join_collections = self.store
            .list_collection_names(&join_pattern(&entity.collection))
            .await?;

        let ids = Bson::Array(ids.to_vec());

        let mut side_deletes = Vec::with_capacity(join_collections.len() + 1);
        for name in &join_collections {
            if let Some(filter) = join_delete_filter(name, &entity.collection, &ids) {
                debug!("removing join rows of '{}' from '{}'", entity.collection, name);
                side_deletes.push(self.store.delete_many(name, filter, self.session));
            }
        }
        if entity.is_file {
            let filter = doc! { FILE_ID: { "$in": ids.clone() } };
            side_deletes.push(self.store.delete_many(self.chunk_collection, filter, self.session));
        }

        let primary = self.store.delete_many(
            &entity.collection,
            doc! { "_id": { "$in": ids.clone() } },
            self.session,
        );

        let (result, _) = futures::try_join!(primary, try_join_all(side_deletes))?;
        debug!("deleted {} from '{}'", result.deleted_count, entity.collection);

        Ok(result)
    }

    /// Streams the `_id`s of matching entities and deletes them page by
    /// page; a page is fully processed before the next one is fetched.
    async fn delete_pages(&self, entity: &EntityInfo, filter: Document) -> Result<DeleteResult> {
        let options = FindOptions::builder()
            .projection(doc! { "_id": 1 })
            .batch_size(DELETE_BATCH_SIZE as u32)
            .build();
        let mut cursor = self.store
            .find(&entity.collection, filter, options, self.session)
            .await?;

        let mut total = DeleteResult::default();
        while let Some(page) = cursor.next_batch().await? {
            let ids: Vec<Bson> = page
                .into_iter()
                .filter_map(|mut doc| doc.remove("_id"))
                .collect();
            if ids.is_empty() {
                continue;
            }
            let result = self.delete_id_batches(entity, &ids).await?;
            total.merge(&result);
        }

        Ok(total)
    }

}
