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


use bson::Document;

#[derive(Debug, Clone)]
pub struct FindOptions {
    /// Fields to keep in returned documents, `{ "_id": 1 }` style.
    pub projection: Option<Document>,
    /// Number of documents per cursor page.
    pub batch_size: Option<u32>,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn builder() -> FindOptionsBuilder {
        FindOptionsBuilder::default()
    }

    pub(crate) fn batch_size_or(&self, default: u32) -> u32 {
        self.batch_size.filter(|size| *size > 0).unwrap_or(default)
    }
}

pub struct FindOptionsBuilder {
    projection: Option<Document>,
    batch_size: Option<u32>,
    limit: Option<u64>,
}

impl FindOptionsBuilder {
    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(self) -> FindOptions {
        FindOptions {
            projection: self.projection,
            batch_size: self.batch_size,
            limit: self.limit,
        }
    }
}

impl Default for FindOptionsBuilder {
    fn default() -> Self {
        FindOptionsBuilder {
            projection: None,
            batch_size: None,
            limit: None,
        }
    }
}

impl Default for FindOptions {
    fn default() -> Self {
        FindOptions {
            projection: None,
            batch_size: None,
            limit: None,
        }
    }
}
