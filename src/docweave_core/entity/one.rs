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
use serde::{Deserialize, Serialize};
use crate::context::DbContext;
use crate::entity::{Entity, EntityId};
use crate::Result;

/// A reference to a single related entity, stored as its bare id.
///
/// An unset reference serializes as `null`.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct One<T: Entity> {
    id: Option<T::Id>,
}

impl<T: Entity> One<T> {

    pub fn new(id: T::Id) -> One<T> {
        One { id: Some(id) }
    }

    pub fn none() -> One<T> {
        One { id: None }
    }

    pub fn of(entity: &T) -> One<T> {
        One::new(entity.id().clone())
    }

    #[inline]
    pub fn id(&self) -> Option<&T::Id> {
        self.id.as_ref()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.id.as_ref().is_some_and(|id| !id.is_default())
    }

    /// Loads the referenced entity, honoring the context's global filter.
    pub async fn to_entity(&self, ctx: &DbContext) -> Result<Option<T>> {
        match &self.id {
            Some(id) if !id.is_default() => ctx.find_by_id::<T>(id).await,
            _ => Ok(None),
        }
    }

}

impl<T: Entity> Clone for One<T> {
    fn clone(&self) -> Self {
        One { id: self.id.clone() }
    }
}

impl<T: Entity> Default for One<T> {
    fn default() -> Self {
        One::none()
    }
}

impl<T: Entity> PartialEq for One<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: Entity> fmt::Debug for One<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "One({:?})", id),
            None => write!(f, "One(null)"),
        }
    }
}
