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
use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Document};
use serde::{Deserialize, Serialize};
use crate::Result;

/// Field of a chunk that holds the owning file entity's id.
pub const FILE_ID: &str = "FileID";

/// One piece of the binary content of a file entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChunk {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "FileID")]
    pub file_id: Bson,
    #[serde(rename = "n")]
    pub index: i32,
    #[serde(rename = "data")]
    pub data: Binary,
}

impl FileChunk {

    pub fn new(file_id: Bson, index: i32, bytes: Vec<u8>) -> FileChunk {
        FileChunk {
            id: ObjectId::new(),
            file_id,
            index,
            data: Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            },
        }
    }

    pub fn to_document(&self) -> Result<Document> {
        Ok(bson::to_document(self)?)
    }

}

#[cfg(test)]
mod tests {
    use bson::Bson;
    use super::{FileChunk, FILE_ID};

    #[test]
    fn test_chunk_document() {
        let chunk = FileChunk::new(Bson::String("f1".into()), 3, vec![1, 2, 3]);
        let doc = chunk.to_document().unwrap();
        assert_eq!(doc.get_str(FILE_ID).unwrap(), "f1");
        assert_eq!(doc.get_i32("n").unwrap(), 3);
        assert_eq!(doc.get_binary_generic("data").unwrap(), &vec![1u8, 2, 3]);
    }
}
