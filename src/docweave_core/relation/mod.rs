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


//! Relationships backed by join collections.
//!
//! A join collection is named `~{parent}~{child}({property})` and holds one
//! [`JoinRecord`] per linked pair. The parent is always the side that
//! declares the relationship as its owner.

mod descriptor;
mod join;
mod many;
mod naming;

pub use descriptor::{Cardinality, RelationDescriptor, Relations, Side};
pub use join::{JoinCollection, JoinRecord, CHILD_ID, PARENT_ID};
pub use many::{Inverse, Many, Owner, RelationSide};
pub use naming::{join_collection_name, join_pattern, JoinName};
