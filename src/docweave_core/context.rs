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


use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use bson::{doc, Document};
use log::debug;
use tokio_util::sync::CancellationToken;
use crate::cascade::CascadeDelete;
use crate::config::{Config, FilterPosition};
use crate::entity::{self, Entity, EntityId};
use crate::errors::RelationNotFoundError;
use crate::options::FindOptions;
use crate::relation::{Inverse, Many, Owner, RelationDescriptor, Side};
use crate::results::DeleteResult;
use crate::store::{collect_all, has_active_transaction, DocumentStore, Session};
use crate::{Error, Result};

/// The entry point: a store, its configuration, the global filters and,
/// inside a transaction, the session every operation runs in.
///
/// Cloning is cheap and shares everything.
#[derive(Clone)]
pub struct DbContext {
    inner: Arc<DbContextInner>,
}

struct DbContextInner {
    store: Arc<dyn DocumentStore>,
    config: Config,
    session: Option<Session>,
    global_filters: Arc<HashMap<TypeId, GlobalFilter>>,
}

struct GlobalFilter {
    filter: Document,
    position: Option<FilterPosition>,
}

impl DbContext {

    pub fn new(store: Arc<dyn DocumentStore>) -> DbContext {
        DbContext::builder(store).build()
    }

    pub fn builder(store: Arc<dyn DocumentStore>) -> DbContextBuilder {
        DbContextBuilder {
            store,
            config: Config::default(),
            session: None,
            global_filters: HashMap::new(),
        }
    }

    #[inline]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    #[inline]
    pub fn session(&self) -> Option<&Session> {
        self.inner.session.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn global_filter<T: Entity>(&self) -> Option<&Document> {
        self.inner.global_filters.get(&TypeId::of::<T>()).map(|global| &global.filter)
    }

    /// Where the global filter of `T` goes in a merged filter: its own
    /// position if it was registered with one, the configured one otherwise.
    pub fn global_filter_position<T: Entity>(&self) -> FilterPosition {
        self.inner.global_filters
            .get(&TypeId::of::<T>())
            .and_then(|global| global.position)
            .unwrap_or(self.inner.config.global_filter_position)
    }

    /// ANDs the global filter registered for `T` with `filter`.
    pub fn merge_filter<T: Entity>(&self, filter: Document) -> Document {
        let global = match self.global_filter::<T>() {
            Some(global) => global.clone(),
            None => return filter,
        };
        let clauses = match self.global_filter_position::<T>() {
            FilterPosition::Prepend => vec![global, filter],
            FilterPosition::Append => vec![filter, global],
        };
        doc! { "$and": clauses }
    }

    /// Inserts or replaces the entity, assigning a fresh id to an unsaved one.
    pub async fn save<T: Entity>(&self, entity: &mut T) -> Result<()> {
        let info = entity::info::<T>()?;
        if entity.id().is_default() {
            let id = T::Id::generate().ok_or(Error::IdRequired(type_name::<T>()))?;
            entity.set_id(id);
        }
        let id = entity.id().to_bson()?;
        let doc = bson::to_document(&*entity)?;
        let result = self.store()
            .replace_one(&info.collection, doc! { "_id": id.clone() }, doc, true, self.session())
            .await?;
        debug!("saved {} into '{}', upserted: {}", id, info.collection, result.upserted_id.is_some());
        Ok(())
    }

    pub async fn find<T: Entity>(&self, filter: Document) -> Result<Vec<T>> {
        self.find_with_options(filter, FindOptions::default()).await
    }

    pub async fn find_one<T: Entity>(&self, filter: Document) -> Result<Option<T>> {
        let options = FindOptions::builder().limit(1).build();
        let mut found = self.find_with_options::<T>(filter, options).await?;
        Ok(found.pop())
    }

    pub async fn find_by_id<T: Entity>(&self, id: &T::Id) -> Result<Option<T>> {
        self.find_one::<T>(doc! { "_id": id.to_bson()? }).await
    }

    async fn find_with_options<T: Entity>(&self, filter: Document, options: FindOptions) -> Result<Vec<T>> {
        let info = entity::info::<T>()?;
        let cursor = self.store()
            .find(&info.collection, self.merge_filter::<T>(filter), options, self.session())
            .await?;
        let docs = collect_all(cursor).await?;
        let mut result = Vec::with_capacity(docs.len());
        for doc in docs {
            result.push(bson::from_document(doc)?);
        }
        Ok(result)
    }

    fn cascade(&self, cancellation: Option<CancellationToken>) -> CascadeDelete<'_> {
        CascadeDelete::new(self.store(), self.session(), &self.inner.config.chunk_collection)
            .with_cancellation(cancellation)
    }

    /// Deletes the entities with the given ids together with their join
    /// rows and, for file entities, their chunks.
    ///
    /// A cancellation token is only honored inside a transaction; passing
    /// one outside of a transaction is rejected before anything is sent.
    pub async fn delete<T: Entity>(
        &self,
        ids: &[T::Id],
        cancellation: Option<CancellationToken>,
    ) -> Result<DeleteResult> {
        let info = entity::info::<T>()?;
        let engine = self.cascade(cancellation);
        engine.check_cancellation()?;

        let ids = ids
            .iter()
            .map(EntityId::to_bson)
            .collect::<Result<Vec<_>>>()?;

        if self.global_filter::<T>().is_some() {
            if ids.is_empty() {
                return Ok(DeleteResult::default());
            }
            let filter = self.merge_filter::<T>(doc! { "_id": { "$in": ids } });
            return engine.delete_matching(&info, filter).await;
        }
        engine.delete_ids(&info, ids).await
    }

    pub async fn delete_one<T: Entity>(
        &self,
        id: &T::Id,
        cancellation: Option<CancellationToken>,
    ) -> Result<DeleteResult> {
        self.delete::<T>(std::slice::from_ref(id), cancellation).await
    }

    /// Deletes every entity matching `filter` (and the global filter).
    pub async fn delete_where<T: Entity>(
        &self,
        filter: Document,
        cancellation: Option<CancellationToken>,
    ) -> Result<DeleteResult> {
        let info = entity::info::<T>()?;
        let engine = self.cascade(cancellation);
        engine.check_cancellation()?;
        engine.delete_matching(&info, self.merge_filter::<T>(filter)).await
    }

    fn descriptor<C: Entity, P: Entity>(&self, property: &str, side: Side) -> Result<Arc<RelationDescriptor>> {
        let declaring = entity::info::<P>()?;
        let related = entity::info::<C>()?;
        let found = declaring
            .relation(property, side)
            .filter(|rel| rel.related_collection() == related.collection)
            .cloned();
        match found {
            Some(descriptor) => Ok(descriptor),
            None => Err(RelationNotFoundError {
                entity: declaring.collection.clone(),
                property: property.to_string(),
                side: match side {
                    Side::Owner => "owner",
                    Side::Inverse => "inverse",
                },
            }.into()),
        }
    }

    /// The `C` entities linked to the `P` with `parent_id` through the
    /// relationship `P` owns under `property`.
    pub fn many<C: Entity, P: Entity>(&self, property: &str, parent_id: &P::Id) -> Result<Many<C, P, Owner>> {
        let descriptor = self.descriptor::<C, P>(property, Side::Owner)?;
        Ok(Many::new(self.clone(), descriptor, parent_id.to_bson()?))
    }

    /// Read-only navigation of a relationship owned by `C`, declared on `P`
    /// under `property`.
    pub fn many_inverse<C: Entity, P: Entity>(&self, property: &str, id: &P::Id) -> Result<Many<C, P, Inverse>> {
        let descriptor = self.descriptor::<C, P>(property, Side::Inverse)?;
        Ok(Many::new(self.clone(), descriptor, id.to_bson()?))
    }

    /// Starts a session and a transaction on it. The returned context runs
    /// every operation inside that transaction until it is committed or
    /// aborted.
    pub async fn transaction(&self) -> Result<DbContext> {
        if has_active_transaction(self.session()) {
            return Err(Error::StartTransactionInAnotherTransaction);
        }
        let session = self.store().start_session().await?;
        self.store().start_transaction(&session).await?;
        debug!("transaction started on session {}", session.id());

        Ok(DbContext {
            inner: Arc::new(DbContextInner {
                store: self.inner.store.clone(),
                config: self.inner.config.clone(),
                session: Some(session),
                global_filters: self.inner.global_filters.clone(),
            }),
        })
    }

    pub async fn commit(&self) -> Result<()> {
        let session = self.session().ok_or(Error::NoTransactionStarted)?;
        self.store().commit_transaction(session).await
    }

    pub async fn abort(&self) -> Result<()> {
        let session = self.session().ok_or(Error::NoTransactionStarted)?;
        self.store().abort_transaction(session).await
    }

}

impl fmt::Debug for DbContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbContext")
            .field("config", &self.inner.config)
            .field("session", &self.inner.session)
            .field("global_filters", &self.inner.global_filters.len())
            .finish()
    }
}

pub struct DbContextBuilder {
    store: Arc<dyn DocumentStore>,
    config: Config,
    session: Option<Session>,
    global_filters: HashMap<TypeId, GlobalFilter>,
}

impl DbContextBuilder {

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Runs every operation in an existing session.
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Restricts every read and delete of `T` to documents matching
    /// `filter`. Registering twice for the same type replaces the filter.
    pub fn global_filter<T: Entity>(mut self, filter: Document) -> Self {
        self.global_filters.insert(TypeId::of::<T>(), GlobalFilter { filter, position: None });
        self
    }

    /// [`global_filter`](Self::global_filter) merged at `position`, whatever
    /// the configured default is.
    pub fn global_filter_at<T: Entity>(mut self, filter: Document, position: FilterPosition) -> Self {
        self.global_filters.insert(TypeId::of::<T>(), GlobalFilter { filter, position: Some(position) });
        self
    }

    pub fn build(self) -> DbContext {
        DbContext {
            inner: Arc::new(DbContextInner {
                store: self.store,
                config: self.config,
                session: self.session,
                global_filters: Arc::new(self.global_filters),
            }),
        }
    }

}
