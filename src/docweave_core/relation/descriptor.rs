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


use std::marker::PhantomData;
use std::sync::Arc;
use crate::entity::{validate_collection_name, Entity};
use crate::relation::naming::join_collection_name;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// A child has at most one parent.
    OneToMany,
    ManyToMany,
}

/// Which end of the join collection a descriptor is declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The declaring entity is the parent and may mutate the relationship.
    Owner,
    /// The declaring entity is the child; read only.
    Inverse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    /// Property name on the declaring entity.
    pub property: String,
    pub parent_collection: String,
    pub child_collection: String,
    pub cardinality: Cardinality,
    pub side: Side,
    pub join_collection: String,
}

impl RelationDescriptor {

    /// The collection on the other end.
    pub fn related_collection(&self) -> &str {
        match self.side {
            Side::Owner => &self.child_collection,
            Side::Inverse => &self.parent_collection,
        }
    }

}

fn check_property(property: &str) -> Result<()> {
    if property.is_empty() || !property.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(Error::InvalidExpression(format!("illegal relationship property '{}'", property)));
    }
    Ok(())
}

/// Collects the relationships declared by `T`.
///
/// Errors are remembered and reported once the declaration is finished, so
/// `Entity::relations` stays a plain chain of calls.
pub struct Relations<T> {
    collection: String,
    descriptors: Vec<RelationDescriptor>,
    error: Option<Error>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Entity> Relations<T> {

    pub(crate) fn new(collection: String) -> Relations<T> {
        Relations {
            collection,
            descriptors: Vec::new(),
            error: None,
            _phantom: PhantomData,
        }
    }

    /// `T` owns many `C`; each `C` belongs to at most one `T`.
    pub fn one_to_many<C: Entity>(&mut self, property: &str) -> &mut Self {
        self.declare::<C>(property, property, Cardinality::OneToMany, Side::Owner)
    }

    /// `T` owns a many-to-many relationship with `C`.
    pub fn many_to_many<C: Entity>(&mut self, property: &str) -> &mut Self {
        self.declare::<C>(property, property, Cardinality::ManyToMany, Side::Owner)
    }

    /// The read side of `O::owner_property`, a many-to-many declared on `O`.
    pub fn many_to_many_inverse<O: Entity>(&mut self, property: &str, owner_property: &str) -> &mut Self {
        self.declare::<O>(property, owner_property, Cardinality::ManyToMany, Side::Inverse)
    }

    /// Navigation from a child to its parent in `P::owner_property`, a
    /// one-to-many declared on `P`.
    pub fn parent_of<P: Entity>(&mut self, property: &str, owner_property: &str) -> &mut Self {
        self.declare::<P>(property, owner_property, Cardinality::OneToMany, Side::Inverse)
    }

    fn declare<O: Entity>(
        &mut self,
        property: &str,
        owner_property: &str,
        cardinality: Cardinality,
        side: Side,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        match self.descriptor::<O>(property, owner_property, cardinality, side) {
            Ok(descriptor) => self.descriptors.push(descriptor),
            Err(err) => self.error = Some(err),
        }
        self
    }

    fn descriptor<O: Entity>(
        &self,
        property: &str,
        owner_property: &str,
        cardinality: Cardinality,
        side: Side,
    ) -> Result<RelationDescriptor> {
        check_property(property)?;
        check_property(owner_property)?;

        let other = O::collection_name().into_owned();
        validate_collection_name(&other)?;

        let (parent_collection, child_collection) = match side {
            Side::Owner => (self.collection.clone(), other),
            Side::Inverse => (other, self.collection.clone()),
        };

        if self.descriptors.iter().any(|d| d.property == property && d.side == side) {
            return Err(Error::InvalidExpression(format!(
                "relationship '{}' is declared twice on '{}'",
                property, self.collection
            )));
        }

        let join_collection = join_collection_name(&parent_collection, &child_collection, owner_property);
        Ok(RelationDescriptor {
            property: property.to_string(),
            parent_collection,
            child_collection,
            cardinality,
            side,
            join_collection,
        })
    }

    pub(crate) fn finish(self) -> Result<Vec<Arc<RelationDescriptor>>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(self.descriptors.into_iter().map(Arc::new).collect())
    }

}

#[cfg(test)]
mod tests {
    use bson::oid::ObjectId;
    use serde::{Deserialize, Serialize};
    use crate::entity::Entity;
    use crate::relation::{Cardinality, Relations, Side};

    #[derive(Serialize, Deserialize)]
    struct Writer {
        #[serde(rename = "_id")]
        id: ObjectId,
    }

    #[derive(Serialize, Deserialize)]
    struct Novel {
        #[serde(rename = "_id")]
        id: ObjectId,
    }

    impl Entity for Writer {
        type Id = ObjectId;
        fn id(&self) -> &ObjectId { &self.id }
        fn set_id(&mut self, id: ObjectId) { self.id = id; }
    }

    impl Entity for Novel {
        type Id = ObjectId;
        fn id(&self) -> &ObjectId { &self.id }
        fn set_id(&mut self, id: ObjectId) { self.id = id; }
    }

    #[test]
    fn test_owner_and_inverse_share_join_collection() {
        let mut owner = Relations::<Writer>::new("Writer".into());
        owner.many_to_many::<Novel>("Novels");
        let owner = owner.finish().unwrap();

        let mut inverse = Relations::<Novel>::new("Novel".into());
        inverse.many_to_many_inverse::<Writer>("Writers", "Novels");
        let inverse = inverse.finish().unwrap();

        assert_eq!(owner[0].join_collection, inverse[0].join_collection);
        assert_eq!(owner[0].join_collection, "~Writer~Novel(Novels)");

        assert_eq!(owner[0].side, Side::Owner);
        assert_eq!(owner[0].related_collection(), "Novel");

        assert_eq!(inverse[0].side, Side::Inverse);
        assert_eq!(inverse[0].cardinality, Cardinality::ManyToMany);
        assert_eq!(inverse[0].related_collection(), "Writer");
        assert_eq!(inverse[0].child_collection, "Novel");
    }

    #[test]
    fn test_two_relationships_between_same_types() {
        let mut relations = Relations::<Writer>::new("Writer".into());
        relations
            .one_to_many::<Novel>("Drafts")
            .one_to_many::<Novel>("Published");
        let relations = relations.finish().unwrap();
        assert_ne!(relations[0].join_collection, relations[1].join_collection);
    }

    #[test]
    fn test_duplicate_and_illegal_declarations() {
        let mut relations = Relations::<Writer>::new("Writer".into());
        relations
            .one_to_many::<Novel>("Novels")
            .many_to_many::<Novel>("Novels");
        assert!(relations.finish().is_err());

        let mut relations = Relations::<Writer>::new("Writer".into());
        relations.one_to_many::<Novel>("No vels");
        assert!(relations.finish().is_err());
    }
}
