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

#![allow(dead_code)]

use std::borrow::Cow;
use std::sync::Arc;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use docweave_core::{DbContext, Entity, MemoryStore, One, Relations};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn prepare_context() -> (Arc<MemoryStore>, DbContext) {
    init_logger();
    let store = Arc::new(MemoryStore::new());
    let ctx = DbContext::new(store.clone());
    (store, ctx)
}

pub fn unsaved_id() -> ObjectId {
    ObjectId::from_bytes([0; 12])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

impl Author {
    pub fn new(name: &str) -> Author {
        Author {
            id: unsaved_id(),
            name: name.to_string(),
            active: true,
        }
    }
}

impl Entity for Author {
    type Id = ObjectId;

    fn id(&self) -> &ObjectId { &self.id }

    fn set_id(&mut self, id: ObjectId) { self.id = id; }

    fn relations(relations: &mut Relations<Self>) {
        relations.one_to_many::<Book>("Books");
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub rating: i32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub author: One<Author>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Book {
    pub fn new(title: &str) -> Book {
        Book {
            id: unsaved_id(),
            title: title.to_string(),
            author: One::none(),
            reviews: Vec::new(),
        }
    }
}

impl Entity for Book {
    type Id = ObjectId;

    fn id(&self) -> &ObjectId { &self.id }

    fn set_id(&mut self, id: ObjectId) { self.id = id; }

    fn relations(relations: &mut Relations<Self>) {
        relations
            .parent_of::<Author>("Author", "Books")
            .many_to_many::<Genre>("Genres")
            .many_to_many::<Book>("Sequels");
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(rename = "_id")]
    pub id: String,
}

impl Entity for Genre {
    type Id = String;

    fn id(&self) -> &String { &self.id }

    fn set_id(&mut self, id: String) { self.id = id; }

    fn relations(relations: &mut Relations<Self>) {
        relations.many_to_many_inverse::<Book>("Books", "Genres");
    }
}

/// An entity whose id can not be generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: i64,
    pub value: i64,
}

impl Entity for Counter {
    type Id = i64;

    fn id(&self) -> &i64 { &self.id }

    fn set_id(&mut self, id: i64) { self.id = id; }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub file_name: String,
}

impl Entity for Attachment {
    type Id = Uuid;

    fn id(&self) -> &Uuid { &self.id }

    fn set_id(&mut self, id: Uuid) { self.id = id; }

    fn collection_name() -> Cow<'static, str> {
        Cow::Borrowed("attachments")
    }

    fn is_file_entity() -> bool {
        true
    }
}
