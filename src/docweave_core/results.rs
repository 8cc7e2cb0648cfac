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


use bson::Bson;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    /// The `_id` field of the document inserted.
    pub inserted_id: Bson,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    /// The number of documents that matched the filter.
    #[serde(serialize_with = "bson::serde_helpers::serialize_u64_as_i64")]
    pub matched_count: u64,
    /// The number of documents that were modified by the operation.
    #[serde(serialize_with = "bson::serde_helpers::serialize_u64_as_i64")]
    pub modified_count: u64,
    /// The `_id` of the document inserted by an upsert.
    pub upserted_id: Option<Bson>,
    pub acknowledged: bool,
}

impl Default for UpdateResult {
    fn default() -> Self {
        UpdateResult {
            matched_count: 0,
            modified_count: 0,
            upserted_id: None,
            acknowledged: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// The number of documents deleted by the operation.
    #[serde(serialize_with = "bson::serde_helpers::serialize_u64_as_i64")]
    pub deleted_count: u64,
    /// Whether the store acknowledged the write.
    pub acknowledged: bool,
}

impl DeleteResult {

    pub fn unacknowledged() -> DeleteResult {
        DeleteResult {
            deleted_count: 0,
            acknowledged: false,
        }
    }

    /// Folds the result of another batch into this one.
    ///
    /// A single unacknowledged batch downgrades the aggregate.
    pub fn merge(&mut self, other: &DeleteResult) {
        self.deleted_count += other.deleted_count;
        self.acknowledged &= other.acknowledged;
    }

}

impl Default for DeleteResult {
    fn default() -> Self {
        DeleteResult {
            deleted_count: 0,
            acknowledged: true,
        }
    }
}
