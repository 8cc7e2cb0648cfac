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


use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use bson::{doc, Bson};
use crate::context::DbContext;
use crate::entity::{Entity, EntityId};
use crate::relation::{JoinCollection, JoinRecord, RelationDescriptor, Side};
use crate::results::DeleteResult;
use crate::Result;

mod sealed {
    pub trait Sealed {}
}

/// Marks which side of a relationship a [`Many`] handle was opened from.
pub trait RelationSide: sealed::Sealed + Send + Sync + 'static {
    const SIDE: Side;
}

/// The declaring side; may add and remove links.
pub struct Owner;

/// The read-only side.
pub struct Inverse;

impl sealed::Sealed for Owner {}
impl sealed::Sealed for Inverse {}

impl RelationSide for Owner {
    const SIDE: Side = Side::Owner;
}

impl RelationSide for Inverse {
    const SIDE: Side = Side::Inverse;
}

/// The `C` entities linked to one `P` entity.
///
/// Only handles opened on the owning side can change the links:
///
/// ```compile_fail
/// use docweave_core::Entity;
/// use docweave_core::relation::{Inverse, Many};
///
/// async fn link<C: Entity, P: Entity>(genres: &Many<C, P, Inverse>, id: &C::Id) {
///     genres.add(id).await.unwrap();
/// }
/// ```
pub struct Many<C: Entity, P: Entity, S: RelationSide = Owner> {
    ctx: DbContext,
    descriptor: Arc<RelationDescriptor>,
    parent_id: Bson,
    _phantom: PhantomData<fn() -> (C, P, S)>,
}

impl<C: Entity, P: Entity, S: RelationSide> Many<C, P, S> {

    pub(crate) fn new(ctx: DbContext, descriptor: Arc<RelationDescriptor>, parent_id: Bson) -> Self {
        debug_assert_eq!(descriptor.side, S::SIDE);
        Many {
            ctx,
            descriptor,
            parent_id,
            _phantom: PhantomData,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &RelationDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn parent_id(&self) -> &Bson {
        &self.parent_id
    }

    fn join(&self) -> JoinCollection<'_> {
        JoinCollection::new(
            self.ctx.store(),
            &self.descriptor.join_collection,
            self.descriptor.cardinality,
            self.ctx.session(),
        )
    }

    pub async fn join_records(&self) -> Result<Vec<JoinRecord>> {
        let join = self.join();
        match S::SIDE {
            Side::Owner => join.children_of(self.parent_id.clone()).await,
            Side::Inverse => join.parents_of(self.parent_id.clone()).await,
        }
    }

    fn related_value(record: JoinRecord) -> Bson {
        match S::SIDE {
            Side::Owner => record.child_id,
            Side::Inverse => record.parent_id,
        }
    }

    pub async fn child_ids(&self) -> Result<Vec<C::Id>> {
        self.join_records()
            .await?
            .into_iter()
            .map(|record| C::Id::from_bson(Self::related_value(record)))
            .collect()
    }

    /// Loads the linked entities. The context's global filter for `C`
    /// applies, so filtered-out entities are skipped.
    pub async fn children(&self) -> Result<Vec<C>> {
        let ids: Vec<Bson> = self.join_records()
            .await?
            .into_iter()
            .map(Self::related_value)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.ctx.find::<C>(doc! { "_id": { "$in": ids } }).await
    }

    pub async fn child_count(&self) -> Result<usize> {
        Ok(self.join_records().await?.len())
    }

}

impl<C: Entity, P: Entity> Many<C, P, Owner> {

    pub async fn add(&self, child: &C::Id) -> Result<()> {
        self.join().add(self.parent_id.clone(), child.to_bson()?).await
    }

    /// Adds the children one after another; stops at the first failure.
    pub async fn add_many(&self, children: &[C::Id]) -> Result<()> {
        let join = self.join();
        for child in children {
            join.add(self.parent_id.clone(), child.to_bson()?).await?;
        }
        Ok(())
    }

    pub async fn remove(&self, child: &C::Id) -> Result<DeleteResult> {
        self.join().remove(self.parent_id.clone(), child.to_bson()?).await
    }

    pub async fn remove_many(&self, children: &[C::Id]) -> Result<DeleteResult> {
        let children = children
            .iter()
            .map(EntityId::to_bson)
            .collect::<Result<Vec<_>>>()?;
        self.join().remove_many(self.parent_id.clone(), children).await
    }

}

impl<C: Entity, P: Entity, S: RelationSide> fmt::Debug for Many<C, P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Many")
            .field("join_collection", &self.descriptor.join_collection)
            .field("side", &S::SIDE)
            .field("parent_id", &self.parent_id)
            .finish()
    }
}
