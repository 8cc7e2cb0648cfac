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

use bson::ser::Error as BsonErr;
use std::fmt;
use std::sync::PoisonError;
use thiserror::Error;

#[derive(Debug)]
pub struct RelationNotFoundError {
    pub entity: String,  // collection name of the declaring entity
    pub property: String,
    pub side: &'static str,
}

impl fmt::Display for RelationNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' declares no {} relationship named '{}'",
            self.entity, self.side, self.property
        )
    }
}

impl From<RelationNotFoundError> for Error {
    fn from(value: RelationNotFoundError) -> Self {
        Error::RelationNotFound(Box::new(value))
    }
}

#[derive(Debug)]
pub struct RegexError {
    pub error: String,
    pub expression: String,
}

impl From<RegexError> for Error {
    fn from(value: RegexError) -> Self {
        Error::RegexError(Box::new(value))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid navigation expression: {0}")]
    InvalidExpression(String),
    #[error("unresolved template tokens: [{}]", .0.join(","))]
    UnresolvedToken(Vec<String>),
    #[error("the template is not a pipeline, it must begin with [ and end with ]")]
    NotAnArray,
    #[error("not a document fragment, it must begin with {{ and end with }}: {0}")]
    NotAnObject(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("the operation was cancelled")]
    Cancelled,
    #[error("collection name '{0}' is illegal")]
    IllegalCollectionName(String),
    #[error("{0}")]
    RelationNotFound(Box<RelationNotFoundError>),
    #[error("an id is required to save '{0}', its id type can not be generated")]
    IdRequired(&'static str),
    #[error("no transaction started")]
    NoTransactionStarted,
    #[error("start transaction in another transaction")]
    StartTransactionInAnotherTransaction,
    #[error("the mutex is poisoned")]
    LockError,
    #[error("bson error: {0}")]
    BsonErr(Box<BsonErr>),
    #[error("bson de error: {0}")]
    BsonDeErr(Box<bson::de::Error>),
    #[error("json error: {0}")]
    JsonErr(String),
    #[error("failed to compile regex expression: {}, expression: {}", .0.error, .0.expression)]
    RegexError(Box<RegexError>),
    #[error("store error: {0}")]
    Store(String),
}

impl From<bson::de::Error> for Error {
    fn from(error: bson::de::Error) -> Self {
        Error::BsonDeErr(Box::new(error))
    }
}

impl From<BsonErr> for Error {
    fn from(error: BsonErr) -> Self {
        Error::BsonErr(Box::new(error))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::JsonErr(error.to_string())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::LockError
    }
}
