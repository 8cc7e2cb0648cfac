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


//! Entities, their identifiers and the per-type registry.

mod file;
mod one;
pub(crate) mod registry;

use std::borrow::Cow;
use std::fmt::Debug;
use bson::oid::ObjectId;
use bson::Bson;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;
use crate::relation::Relations;
use crate::Result;

pub use file::{FileChunk, FILE_ID};
pub use one::One;
pub use registry::{info, validate_collection_name, EntityInfo};

/// The identifier of an entity.
///
/// A default value (`ObjectId` of zeros, nil `Uuid`, empty `String`, `0`)
/// marks an entity that has not been persisted.
pub trait EntityId: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {

    fn is_default(&self) -> bool;

    /// A fresh identifier, or `None` when the type can not be generated.
    fn generate() -> Option<Self>;

    /// The value stored in `_id`, encoded exactly like the entity itself.
    fn to_bson(&self) -> Result<Bson> {
        Ok(bson::to_bson(self)?)
    }

    fn from_bson(value: Bson) -> Result<Self> {
        Ok(bson::from_bson(value)?)
    }

}

impl EntityId for ObjectId {

    fn is_default(&self) -> bool {
        self.bytes() == [0u8; 12]
    }

    fn generate() -> Option<Self> {
        Some(ObjectId::new())
    }

}

impl EntityId for Uuid {

    fn is_default(&self) -> bool {
        self.is_nil()
    }

    fn generate() -> Option<Self> {
        Some(Uuid::new_v4())
    }

}

impl EntityId for String {

    fn is_default(&self) -> bool {
        self.is_empty()
    }

    fn generate() -> Option<Self> {
        Some(ObjectId::new().to_hex())
    }

}

impl EntityId for i64 {

    fn is_default(&self) -> bool {
        *self == 0
    }

    fn generate() -> Option<Self> {
        None
    }

}

/// A typed document stored in its own collection.
///
/// The identifier must serialize as `_id`:
///
/// ```
/// use bson::oid::ObjectId;
/// use serde::{Deserialize, Serialize};
/// use docweave_core::Entity;
///
/// #[derive(Serialize, Deserialize)]
/// struct Author {
///     #[serde(rename = "_id")]
///     id: ObjectId,
///     name: String,
/// }
///
/// impl Entity for Author {
///     type Id = ObjectId;
///
///     fn id(&self) -> &ObjectId { &self.id }
///     fn set_id(&mut self, id: ObjectId) { self.id = id; }
/// }
///
/// assert_eq!(Author::collection_name(), "Author");
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: EntityId;

    fn id(&self) -> &Self::Id;

    fn set_id(&mut self, id: Self::Id);

    /// Defaults to the type name without its module path.
    fn collection_name() -> Cow<'static, str> {
        Cow::Owned(default_collection_name::<Self>())
    }

    /// File entities own binary chunks stored in the chunk collection.
    fn is_file_entity() -> bool {
        false
    }

    /// Declares the relationships this entity takes part in.
    fn relations(_relations: &mut Relations<Self>) {}

}

fn default_collection_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_string()
}

#[cfg(test)]
mod tests {
    use bson::oid::ObjectId;
    use bson::Bson;
    use uuid::Uuid;
    use super::{default_collection_name, EntityId};

    mod models {
        pub struct Author;
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn test_default_collection_name() {
        assert_eq!(default_collection_name::<models::Author>(), "Author");
        assert_eq!(default_collection_name::<models::Wrapper<models::Author>>(), "Wrapper");
    }

    #[test]
    fn test_default_ids() {
        assert!(ObjectId::from_bytes([0; 12]).is_default());
        assert!(!ObjectId::new().is_default());
        assert!(Uuid::nil().is_default());
        assert!(String::new().is_default());
        assert!(0_i64.is_default());
        assert!(i64::generate().is_none());
        assert_eq!(String::generate().map(|s| s.len()), Some(24));
    }

    #[test]
    fn test_id_to_bson() {
        let oid = ObjectId::new();
        assert_eq!(oid.to_bson().unwrap(), Bson::ObjectId(oid));
        assert_eq!(42_i64.to_bson().unwrap(), Bson::Int64(42));
        assert_eq!(String::from("a").to_bson().unwrap(), Bson::String("a".into()));
        assert_eq!(i64::from_bson(Bson::Int64(7)).unwrap(), 7);
    }
}
