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


/// Where a registered global filter goes relative to the caller's filter
/// inside the generated `$and`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPosition {
    #[default]
    Prepend,
    Append,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub global_filter_position: FilterPosition,
    /// Collection holding the chunks of file entities.
    pub chunk_collection: String,
}

impl Config {

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

}

impl Default for Config {

    fn default() -> Self {
        Config {
            global_filter_position: FilterPosition::Prepend,
            chunk_collection: "[BINARY_CHUNKS]".to_string(),
        }
    }

}

#[derive(Default)]
pub struct ConfigBuilder {
    global_filter_position: Option<FilterPosition>,
    chunk_collection: Option<String>,
}

impl ConfigBuilder {

    pub fn global_filter_position(mut self, position: FilterPosition) -> Self {
        self.global_filter_position = Some(position);
        self
    }

    pub fn chunk_collection(mut self, name: impl Into<String>) -> Self {
        self.chunk_collection = Some(name.into());
        self
    }

    pub fn build(self) -> Config {
        let default = Config::default();
        Config {
            global_filter_position: self.global_filter_position.unwrap_or(default.global_filter_position),
            chunk_collection: self.chunk_collection.unwrap_or(default.chunk_collection),
        }
    }

}
