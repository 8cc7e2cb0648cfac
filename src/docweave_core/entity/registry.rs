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


use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use log::debug;
use crate::entity::Entity;
use crate::relation::{RelationDescriptor, Relations, Side};
use crate::{Error, Result};

/// Everything the engine needs to know about one entity type.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub collection: String,
    pub is_file: bool,
    pub relations: Vec<Arc<RelationDescriptor>>,
}

impl EntityInfo {

    pub fn relation(&self, property: &str, side: Side) -> Option<&Arc<RelationDescriptor>> {
        self.relations
            .iter()
            .find(|rel| rel.property == property && rel.side == side)
    }

}

fn registry() -> &'static RwLock<HashMap<TypeId, Arc<EntityInfo>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<TypeId, Arc<EntityInfo>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The metadata of `T`, built the first time it is asked for.
///
/// Concurrent first calls may both build the value; only one is kept and
/// every caller observes the same `Arc`.
pub fn info<T: Entity>() -> Result<Arc<EntityInfo>> {
    let type_id = TypeId::of::<T>();
    {
        let map = registry().read()?;
        if let Some(info) = map.get(&type_id) {
            return Ok(info.clone());
        }
    }

    let built = Arc::new(build::<T>()?);

    let mut map = registry().write()?;
    let info = map.entry(type_id).or_insert(built).clone();
    Ok(info)
}

fn build<T: Entity>() -> Result<EntityInfo> {
    let collection = T::collection_name().into_owned();
    validate_collection_name(&collection)?;

    let mut relations = Relations::<T>::new(collection.clone());
    T::relations(&mut relations);
    let relations = relations.finish()?;

    debug!("registered entity '{}' with {} relationship(s)", collection, relations.len());

    Ok(EntityInfo {
        collection,
        is_file: T::is_file_entity(),
        relations,
    })
}

/// Rejects names that can not be told apart inside a join collection name.
pub fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.starts_with("system.")
        || name.contains(|c: char| matches!(c, '~' | '(' | ')' | '$' | '\0')) {
        return Err(Error::IllegalCollectionName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::sync::Arc;
    use bson::oid::ObjectId;
    use serde::{Deserialize, Serialize};
    use crate::entity::{info, validate_collection_name, Entity};
    use crate::relation::{Cardinality, Relations, Side};
    use crate::Error;

    #[derive(Serialize, Deserialize)]
    struct Shelf {
        #[serde(rename = "_id")]
        id: ObjectId,
    }

    #[derive(Serialize, Deserialize)]
    struct Volume {
        #[serde(rename = "_id")]
        id: ObjectId,
    }

    impl Entity for Shelf {
        type Id = ObjectId;

        fn id(&self) -> &ObjectId { &self.id }

        fn set_id(&mut self, id: ObjectId) { self.id = id; }

        fn relations(relations: &mut Relations<Self>) {
            relations.one_to_many::<Volume>("Volumes");
        }
    }

    impl Entity for Volume {
        type Id = ObjectId;

        fn id(&self) -> &ObjectId { &self.id }

        fn set_id(&mut self, id: ObjectId) { self.id = id; }

        fn collection_name() -> Cow<'static, str> {
            Cow::Borrowed("volumes")
        }
    }

    #[derive(Serialize, Deserialize)]
    struct Broken {
        #[serde(rename = "_id")]
        id: ObjectId,
    }

    impl Entity for Broken {
        type Id = ObjectId;

        fn id(&self) -> &ObjectId { &self.id }

        fn set_id(&mut self, id: ObjectId) { self.id = id; }

        fn collection_name() -> Cow<'static, str> {
            Cow::Borrowed("a~b")
        }
    }

    #[test]
    fn test_info_is_cached() {
        let first = info::<Shelf>().unwrap();
        let second = info::<Shelf>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.collection, "Shelf");

        let rel = first.relation("Volumes", Side::Owner).unwrap();
        assert_eq!(rel.cardinality, Cardinality::OneToMany);
        assert_eq!(rel.join_collection, "~Shelf~volumes(Volumes)");
        assert!(first.relation("Volumes", Side::Inverse).is_none());
    }

    #[test]
    fn test_concurrent_first_use() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| info::<Volume>().unwrap()))
            .collect();
        let infos: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for info in &infos[1..] {
            assert!(Arc::ptr_eq(&infos[0], info));
        }
    }

    #[test]
    fn test_illegal_name() {
        assert!(matches!(info::<Broken>(), Err(Error::IllegalCollectionName(_))));
        assert!(validate_collection_name("system.users").is_err());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("$cmd").is_err());
        assert!(validate_collection_name("Books").is_ok());
    }
}
