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


/// `~{parent}~{child}({property})`
pub fn join_collection_name(parent: &str, child: &str, property: &str) -> String {
    format!("~{}~{}({})", parent, child, property)
}

/// A pattern matching every join collection whose parent or child segment
/// is exactly `collection`.
///
/// A collection named `Book` never matches `~Bookshelf~Item(Items)`.
pub fn join_pattern(collection: &str) -> String {
    let name = regex::escape(collection);
    format!(r"^~(?:{name}~[^~()]+|[^~()]+~{name})\([^()]*\)$", name = name)
}

/// The segments of a join collection name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinName<'a> {
    pub parent: &'a str,
    pub child: &'a str,
    pub property: &'a str,
}

impl<'a> JoinName<'a> {

    pub fn parse(name: &'a str) -> Option<JoinName<'a>> {
        let rest = name.strip_prefix('~')?;
        let (parent, rest) = rest.split_once('~')?;
        let rest = rest.strip_suffix(')')?;
        let (child, property) = rest.split_once('(')?;

        if parent.is_empty() || child.is_empty() || property.contains(|c: char| matches!(c, '(' | ')' | '~')) {
            return None;
        }

        Some(JoinName {
            parent,
            child,
            property,
        })
    }

    #[inline]
    pub fn is_parent(&self, collection: &str) -> bool {
        self.parent == collection
    }

    #[inline]
    pub fn is_child(&self, collection: &str) -> bool {
        self.child == collection
    }

}
