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


use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use uuid::Uuid;
use crate::errors::RegexError;
use crate::options::FindOptions;
use crate::results::{DeleteResult, InsertOneResult, UpdateResult};
use crate::store::memory::Matcher;
use crate::store::{has_active_transaction, DocumentCursor, DocumentStore, Session};
use crate::utils::value_key;
use crate::{Error, Result};

pub(crate) const DEFAULT_BATCH_SIZE: u32 = 101;

type Collection = IndexMap<Vec<u8>, Document>;
type Collections = BTreeMap<String, Collection>;

/// One call received by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    ListCollectionNames(String),
    Find {
        collection: String,
        filter: Document,
        batch_size: u32,
    },
    InsertOne(String),
    ReplaceOne(String),
    DeleteMany {
        collection: String,
        filter: Document,
        in_transaction: bool,
    },
}

/// A document store held entirely in process memory.
///
/// Transactions snapshot every collection when they start and restore the
/// snapshot on abort; there is no isolation between sessions. Every call
/// is journaled so callers can inspect what was issued.
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

struct MemoryStoreInner {
    collections: Collections,
    snapshots: HashMap<Uuid, Collections>,
    calls: Vec<StoreCall>,
    acknowledged: bool,
    unacknowledged_delete: Option<(String, usize)>,
    failing_deletes: HashSet<String>,
}

fn id_key(collection: &str, id: &Bson) -> Result<Vec<u8>> {
    value_key(id).ok_or_else(|| {
        Error::Store(format!("unsupported _id type {:?} in collection '{}'", id.element_type(), collection))
    })
}

impl MemoryStore {

    pub fn new() -> MemoryStore {
        MemoryStore {
            inner: Mutex::new(MemoryStoreInner {
                collections: BTreeMap::new(),
                snapshots: HashMap::new(),
                calls: Vec::new(),
                acknowledged: true,
                unacknowledged_delete: None,
                failing_deletes: HashSet::new(),
            }),
        }
    }

    /// Bulk load without journaling, for preparing fixtures.
    pub fn insert_many(&self, collection: &str, docs: impl IntoIterator<Item = Document>) -> Result<usize> {
        let mut inner = self.inner.lock()?;
        let coll = inner.collections.entry(collection.to_string()).or_default();
        let mut count = 0;
        for doc in docs {
            insert_into(collection, coll, doc)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn count(&self, collection: &str) -> Result<usize> {
        let inner = self.inner.lock()?;
        Ok(inner.collections.get(collection).map_or(0, |c| c.len()))
    }

    pub fn documents(&self, collection: &str) -> Result<Vec<Document>> {
        let inner = self.inner.lock()?;
        Ok(inner.collections
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    pub fn collection_names(&self) -> Result<Vec<String>> {
        let inner = self.inner.lock()?;
        Ok(inner.collections.keys().cloned().collect())
    }

    pub fn calls(&self) -> Result<Vec<StoreCall>> {
        let inner = self.inner.lock()?;
        Ok(inner.calls.clone())
    }

    pub fn clear_calls(&self) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.calls.clear();
        Ok(())
    }

    /// Makes writes report `acknowledged: false`; they are still applied.
    pub fn set_acknowledged(&self, acknowledged: bool) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.acknowledged = acknowledged;
        Ok(())
    }

    /// Makes only the `nth` (zero-based) `delete_many` on `collection`
    /// report `acknowledged: false`. Calls are counted from the journal, so
    /// [`clear_calls`](Self::clear_calls) restarts the count.
    pub fn unacknowledge_delete(&self, collection: &str, nth: usize) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.unacknowledged_delete = Some((collection.to_string(), nth));
        Ok(())
    }

    /// Every later `delete_many` on `collection` fails.
    pub fn fail_deletes_on(&self, collection: &str) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.failing_deletes.insert(collection.to_string());
        Ok(())
    }

}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

fn insert_into(collection: &str, coll: &mut Collection, mut doc: Document) -> Result<Bson> {
    let id = match doc.get("_id") {
        Some(id) => id.clone(),
        None => {
            let id = Bson::ObjectId(ObjectId::new());
            doc.insert("_id", id.clone());
            id
        }
    };
    let key = id_key(collection, &id)?;
    if coll.contains_key(&key) {
        return Err(Error::Store(format!("duplicate key error collection: {}, key: {}", collection, id)));
    }
    coll.insert(key, doc);
    Ok(id)
}

fn project(doc: &Document, projection: Option<&Document>) -> Document {
    let projection = match projection {
        Some(p) if !p.is_empty() => p,
        _ => return doc.clone(),
    };
    let keep_id = projection.get("_id").map_or(true, |v| !matches!(v, Bson::Int32(0) | Bson::Int64(0) | Bson::Boolean(false)));
    let mut result = Document::new();
    for (key, value) in doc {
        let included = if key == "_id" { keep_id } else { projection.contains_key(key) };
        if included {
            result.insert(key.clone(), value.clone());
        }
    }
    result
}

struct MemoryCursor {
    pages: VecDeque<Vec<Document>>,
}

#[async_trait]
impl DocumentCursor for MemoryCursor {
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>> {
        Ok(self.pages.pop_front())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {

    async fn list_collection_names(&self, pattern: &str) -> Result<Vec<String>> {
        let regex = Regex::new(pattern).map_err(|err| RegexError {
            error: err.to_string(),
            expression: pattern.to_string(),
        })?;
        let mut inner = self.inner.lock()?;
        inner.calls.push(StoreCall::ListCollectionNames(pattern.to_string()));
        Ok(inner.collections
            .keys()
            .filter(|name| regex.is_match(name))
            .cloned()
            .collect())
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
        _session: Option<&Session>,
    ) -> Result<Box<dyn DocumentCursor>> {
        let matcher = Matcher::compile(&filter)?;
        let batch_size = options.batch_size_or(DEFAULT_BATCH_SIZE) as usize;
        let limit = options.limit.map_or(usize::MAX, |l| l as usize);

        let mut inner = self.inner.lock()?;
        inner.calls.push(StoreCall::Find {
            collection: collection.to_string(),
            filter,
            batch_size: batch_size as u32,
        });

        let matched: Vec<Document> = inner.collections
            .get(collection)
            .map(|coll| {
                coll.values()
                    .filter(|doc| matcher.matches(doc))
                    .take(limit)
                    .map(|doc| project(doc, options.projection.as_ref()))
                    .collect()
            })
            .unwrap_or_default();

        let mut pages = VecDeque::new();
        let mut iter = matched.into_iter().peekable();
        while iter.peek().is_some() {
            pages.push_back(iter.by_ref().take(batch_size).collect());
        }
        debug!("memory find on '{}': {} page(s)", collection, pages.len());

        Ok(Box::new(MemoryCursor { pages }))
    }

    async fn insert_one(
        &self,
        collection: &str,
        doc: Document,
        _session: Option<&Session>,
    ) -> Result<InsertOneResult> {
        let mut inner = self.inner.lock()?;
        inner.calls.push(StoreCall::InsertOne(collection.to_string()));
        let coll = inner.collections.entry(collection.to_string()).or_default();
        let inserted_id = insert_into(collection, coll, doc)?;
        Ok(InsertOneResult { inserted_id })
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        mut replacement: Document,
        upsert: bool,
        _session: Option<&Session>,
    ) -> Result<UpdateResult> {
        let matcher = Matcher::compile(&filter)?;
        let mut inner = self.inner.lock()?;
        inner.calls.push(StoreCall::ReplaceOne(collection.to_string()));
        let acknowledged = inner.acknowledged;
        let coll = inner.collections.entry(collection.to_string()).or_default();

        let existing = coll
            .iter()
            .find(|(_, doc)| matcher.matches(doc))
            .map(|(key, doc)| (key.clone(), doc.get("_id").cloned()));

        if let Some((key, id)) = existing {
            if let Some(id) = id {
                replacement.insert("_id", id);
            }
            coll.insert(key, replacement);
            return Ok(UpdateResult {
                matched_count: 1,
                modified_count: 1,
                upserted_id: None,
                acknowledged,
            });
        }

        if !upsert {
            return Ok(UpdateResult {
                acknowledged,
                ..UpdateResult::default()
            });
        }

        if !replacement.contains_key("_id") {
            if let Some(id) = filter.get("_id").filter(|id| value_key(id).is_some()) {
                replacement.insert("_id", id.clone());
            }
        }
        let upserted_id = insert_into(collection, coll, replacement)?;
        Ok(UpdateResult {
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(upserted_id),
            acknowledged,
        })
    }

    async fn delete_many(
        &self,
        collection: &str,
        filter: Document,
        session: Option<&Session>,
    ) -> Result<DeleteResult> {
        let matcher = Matcher::compile(&filter)?;
        let mut inner = self.inner.lock()?;
        inner.calls.push(StoreCall::DeleteMany {
            collection: collection.to_string(),
            filter,
            in_transaction: has_active_transaction(session),
        });
        if inner.failing_deletes.contains(collection) {
            return Err(Error::Store(format!("delete on '{}' failed", collection)));
        }
        let issued = inner.calls
            .iter()
            .filter(|call| matches!(call, StoreCall::DeleteMany { collection: c, .. } if c == collection))
            .count();
        let acknowledged = inner.acknowledged && !matches!(
            &inner.unacknowledged_delete,
            Some((target, nth)) if target == collection && nth + 1 == issued
        );

        let deleted_count = match inner.collections.get_mut(collection) {
            Some(coll) => {
                let before = coll.len();
                coll.retain(|_, doc| !matcher.matches(doc));
                (before - coll.len()) as u64
            }
            None => 0,
        };

        Ok(DeleteResult {
            deleted_count,
            acknowledged,
        })
    }

    async fn start_session(&self) -> Result<Session> {
        Ok(Session::new())
    }

    async fn start_transaction(&self, session: &Session) -> Result<()> {
        if session.in_transaction() {
            return Err(Error::StartTransactionInAnotherTransaction);
        }
        let mut inner = self.inner.lock()?;
        let snapshot = inner.collections.clone();
        inner.snapshots.insert(session.id(), snapshot);
        session.set_in_transaction(true);
        Ok(())
    }

    async fn commit_transaction(&self, session: &Session) -> Result<()> {
        if !session.in_transaction() {
            return Err(Error::NoTransactionStarted);
        }
        let mut inner = self.inner.lock()?;
        inner.snapshots.remove(&session.id());
        session.set_in_transaction(false);
        Ok(())
    }

    async fn abort_transaction(&self, session: &Session) -> Result<()> {
        if !session.in_transaction() {
            return Err(Error::NoTransactionStarted);
        }
        let mut inner = self.inner.lock()?;
        if let Some(snapshot) = inner.snapshots.remove(&session.id()) {
            inner.collections = snapshot;
        }
        session.set_in_transaction(false);
        Ok(())
    }

}
