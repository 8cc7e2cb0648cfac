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

//! Token substitution over raw query, update and pipeline text.
//!
//! A template body carries `<token>` placeholders. Every token in the body
//! must be registered and every registration must appear in the body,
//! otherwise [`Template::render`] fails with [`Error::UnresolvedToken`].
//!
//! ```
//! use docweave_core::{path, Template};
//!
//! struct Book;
//!
//! let query = Template::<Book>::new(r#"{ "<AuthorID>": "<author_id>" }"#)
//!     .path(&path!(Book => AuthorID)).unwrap()
//!     .tag("author_id", "abc")
//!     .render()
//!     .unwrap();
//! assert_eq!(query, r#"{ "AuthorID": "abc" }"#);
//! ```

use std::marker::PhantomData;
use std::sync::OnceLock;
use bson::{Bson, Document};
use indexmap::{IndexMap, IndexSet};
use regex::{Captures, Regex};
use crate::path::{self, Expr};
use crate::{Error, Result};

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"<([A-Za-z0-9_.$\[\]]+)>").expect("token pattern is valid")
    })
}

/// A query text with pending token substitutions.
///
/// `I` is the shape navigated by [`path`](Template::path) and the positional
/// helpers; `R` is the shape of documents produced by a reshaping pipeline,
/// navigated by [`path_of_result`](Template::path_of_result).
pub struct Template<I = (), R = I> {
    body: String,
    values: IndexMap<String, String>,
    _phantom: PhantomData<fn() -> (I, R)>,
}

impl<I, R> Template<I, R> {

    pub fn new(body: impl Into<String>) -> Self {
        Template {
            body: body.into().trim().to_string(),
            values: IndexMap::new(),
            _phantom: PhantomData,
        }
    }

    /// Same as [`Template::new`]; the body is expected to be a JSON array.
    pub fn pipeline(body: impl Into<String>) -> Self {
        Template::new(body)
    }

    #[inline]
    pub fn body(&self) -> &str {
        &self.body
    }

    fn register(mut self, key: String, value: String) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Replaces `<name>` with `value`.
    pub fn tag(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.register(name.into(), value.into())
    }

    /// Replaces `<Rating>` with `Rating`.
    pub fn property(self, expr: &Expr<I>) -> Result<Self> {
        let name = path::property(expr)?;
        Ok(self.register(name.clone(), name))
    }

    /// Replaces `<Rating>` with the dotted path, e.g. `Books.Reviews.Rating`.
    pub fn path(self, expr: &Expr<I>) -> Result<Self> {
        let compiled = path::compile(expr)?;
        Ok(self.register(compiled.property, compiled.dotted))
    }

    /// [`Template::path`] for the result shape of a pipeline.
    pub fn path_of_result(self, expr: &Expr<R>) -> Result<Self> {
        let compiled = path::compile(expr)?;
        Ok(self.register(compiled.property, compiled.dotted))
    }

    /// Replaces `<b.Rating>` for `elements(1, Rating)`.
    pub fn elements<E>(self, index: usize, expr: &Expr<E>) -> Result<Self> {
        let value = path::elements(index, expr)?;
        Ok(self.register(value.clone(), value))
    }

    /// Replaces `<Name>` with the dotted path of an array element member,
    /// e.g. `Author.Name`, keyed by the last member like [`Template::path`].
    pub fn elements_path<E>(self, expr: &Expr<E>) -> Result<Self> {
        let compiled = path::compile(expr)?;
        Ok(self.register(compiled.property, path::elements_path(expr)?))
    }

    /// Replaces `<Books.$[a].Rating>`.
    pub fn pos_filtered(self, expr: &Expr<I>) -> Result<Self> {
        let value = path::pos_filtered(expr)?;
        Ok(self.register(value.clone(), value))
    }

    /// Replaces `<Books.$[].Rating>`.
    pub fn pos_all(self, expr: &Expr<I>) -> Result<Self> {
        let value = path::pos_all(expr)?;
        Ok(self.register(value.clone(), value))
    }

    /// Replaces `<Books.$.Rating>`.
    pub fn pos_first(self, expr: &Expr<I>) -> Result<Self> {
        let value = path::pos_first(expr)?;
        Ok(self.register(value.clone(), value))
    }

    /// Appends one stage to a pipeline body.
    pub fn append_stage(mut self, stage: &str) -> Result<Self> {
        if !(self.body.starts_with('[') && self.body.ends_with(']')) {
            return Err(Error::NotAnArray);
        }
        let stage = stage.trim();
        if !(stage.starts_with('{') && stage.ends_with('}')) {
            return Err(Error::NotAnObject(stage.to_string()));
        }

        let end = self.body.len() - 1;
        let is_empty = self.body[1..end].trim().is_empty();
        let mut body = String::with_capacity(self.body.len() + stage.len() + 2);
        body.push_str(self.body[..end].trim_end());
        if !is_empty {
            body.push(',');
        }
        body.push_str(stage);
        body.push(']');
        self.body = body;

        Ok(self)
    }

    fn body_tokens(&self) -> IndexSet<&str> {
        token_regex()
            .captures_iter(&self.body)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Every missing and every extra token, formatted as `<token>`.
    pub fn unresolved(&self) -> Vec<String> {
        let body_tokens = self.body_tokens();
        let missing = body_tokens
            .iter()
            .filter(|token| !self.values.contains_key(**token))
            .map(|token| format!("<{}>", token));
        let extra = self.values
            .keys()
            .filter(|key| !body_tokens.contains(key.as_str()))
            .map(|key| format!("<{}>", key));
        missing.chain(extra).collect()
    }

    /// Substitutes every token in one pass.
    ///
    /// Replacement values are never scanned again, so a value that happens
    /// to look like a token is emitted verbatim.
    pub fn render(&self) -> Result<String> {
        let unresolved = self.unresolved();
        if !unresolved.is_empty() {
            return Err(Error::UnresolvedToken(unresolved));
        }

        let rendered = token_regex().replace_all(&self.body, |caps: &Captures| {
            // exhaustiveness was checked above
            self.values.get(&caps[1]).cloned().unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }

    /// Renders and parses the text as a single (extended JSON) document.
    pub fn to_document(&self) -> Result<Document> {
        match parse_json(&self.render()?)? {
            Bson::Document(doc) => Ok(doc),
            other => Err(Error::NotAnObject(other.to_string())),
        }
    }

    /// Renders and parses the text as a pipeline of stage documents.
    pub fn to_pipeline(&self) -> Result<Vec<Document>> {
        let stages = match parse_json(&self.render()?)? {
            Bson::Array(stages) => stages,
            _ => return Err(Error::NotAnArray),
        };
        stages
            .into_iter()
            .map(|stage| match stage {
                Bson::Document(doc) => Ok(doc),
                other => Err(Error::NotAnObject(other.to_string())),
            })
            .collect()
    }

}

fn parse_json(text: &str) -> Result<Bson> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    Bson::try_from(value).map_err(|err| Error::JsonErr(err.to_string()))
}
