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


use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use log::debug;
use serde::{Deserialize, Serialize};
use crate::options::FindOptions;
use crate::relation::Cardinality;
use crate::results::DeleteResult;
use crate::store::{collect_all, DocumentStore, Session};
use crate::Result;

pub const PARENT_ID: &str = "ParentID";
pub const CHILD_ID: &str = "ChildID";

/// One linked pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "ParentID")]
    pub parent_id: Bson,
    #[serde(rename = "ChildID")]
    pub child_id: Bson,
}

/// Operations on a single join collection.
pub struct JoinCollection<'a> {
    store: &'a dyn DocumentStore,
    name: &'a str,
    cardinality: Cardinality,
    session: Option<&'a Session>,
}

impl<'a> JoinCollection<'a> {

    pub fn new(
        store: &'a dyn DocumentStore,
        name: &'a str,
        cardinality: Cardinality,
        session: Option<&'a Session>,
    ) -> JoinCollection<'a> {
        JoinCollection {
            store,
            name,
            cardinality,
            session,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name
    }

    /// Links `child` to `parent`.
    ///
    /// For a one-to-many relationship the child's existing row is removed
    /// first. The two writes are only atomic inside a transaction; without
    /// one, a failure between them leaves the child unlinked.
    pub async fn add(&self, parent: Bson, child: Bson) -> Result<()> {
        match self.cardinality {
            Cardinality::OneToMany => {
                let moved = self.store
                    .delete_many(self.name, doc! { CHILD_ID: child.clone() }, self.session)
                    .await?;
                if moved.deleted_count > 0 {
                    debug!("unlinked {} from its previous parent in '{}'", child, self.name);
                }
                let record = JoinRecord {
                    id: ObjectId::new(),
                    parent_id: parent,
                    child_id: child,
                };
                self.store.insert_one(self.name, bson::to_document(&record)?, self.session).await?;
            }
            Cardinality::ManyToMany => {
                let pair = doc! {
                    PARENT_ID: parent,
                    CHILD_ID: child,
                };
                self.store.replace_one(self.name, pair.clone(), pair, true, self.session).await?;
            }
        }
        Ok(())
    }

    /// Unlinks the pair; removing an absent pair is not an error.
    pub async fn remove(&self, parent: Bson, child: Bson) -> Result<DeleteResult> {
        let filter = doc! {
            PARENT_ID: parent,
            CHILD_ID: child,
        };
        self.store.delete_many(self.name, filter, self.session).await
    }

    pub async fn remove_many(&self, parent: Bson, children: Vec<Bson>) -> Result<DeleteResult> {
        if children.is_empty() {
            return Ok(DeleteResult::default());
        }
        let filter = doc! {
            PARENT_ID: parent,
            CHILD_ID: { "$in": children },
        };
        self.store.delete_many(self.name, filter, self.session).await
    }

    pub async fn children_of(&self, parent: Bson) -> Result<Vec<JoinRecord>> {
        self.records(doc! { PARENT_ID: parent }).await
    }

    pub async fn parents_of(&self, child: Bson) -> Result<Vec<JoinRecord>> {
        self.records(doc! { CHILD_ID: child }).await
    }

    async fn records(&self, filter: Document) -> Result<Vec<JoinRecord>> {
        let cursor = self.store
            .find(self.name, filter, FindOptions::default(), self.session)
            .await?;
        let docs = collect_all(cursor).await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            records.push(bson::from_document(doc)?);
        }
        Ok(records)
    }

}

#[cfg(test)]
mod tests {
    use bson::Bson;
    use crate::relation::{Cardinality, JoinCollection};
    use crate::store::MemoryStore;

    fn id(s: &str) -> Bson {
        Bson::String(s.to_string())
    }

    #[tokio::test]
    async fn test_one_to_many_add_moves_child() {
        let store = MemoryStore::new();
        let join = JoinCollection::new(&store, "~A~B(Bs)", Cardinality::OneToMany, None);

        join.add(id("a1"), id("b1")).await.unwrap();
        join.add(id("a2"), id("b1")).await.unwrap();

        assert!(join.children_of(id("a1")).await.unwrap().is_empty());
        let parents = join.parents_of(id("b1")).await.unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].parent_id, id("a2"));
    }

    #[tokio::test]
    async fn test_many_to_many_add_is_idempotent() {
        let store = MemoryStore::new();
        let join = JoinCollection::new(&store, "~A~B(Bs)", Cardinality::ManyToMany, None);

        join.add(id("a1"), id("b1")).await.unwrap();
        join.add(id("a1"), id("b1")).await.unwrap();
        join.add(id("a2"), id("b1")).await.unwrap();

        assert_eq!(store.count("~A~B(Bs)").unwrap(), 2);
        assert_eq!(join.parents_of(id("b1")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryStore::new();
        let join = JoinCollection::new(&store, "~A~B(Bs)", Cardinality::ManyToMany, None);

        join.add(id("a1"), id("b1")).await.unwrap();
        join.add(id("a1"), id("b2")).await.unwrap();
        join.add(id("a1"), id("b3")).await.unwrap();

        assert_eq!(join.remove(id("a1"), id("b1")).await.unwrap().deleted_count, 1);
        assert_eq!(join.remove(id("a1"), id("b1")).await.unwrap().deleted_count, 0);

        let removed = join.remove_many(id("a1"), vec![id("b2"), id("b9")]).await.unwrap();
        assert_eq!(removed.deleted_count, 1);

        let left = join.children_of(id("a1")).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].child_id, id("b3"));
    }
}
