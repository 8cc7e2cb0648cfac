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

use crate::path::{Expr, IndexArg, Step};
use crate::{Error, Result};

/// Every rendering of one navigation expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPath {
    /// `Books.Reviews.Rating`
    pub dotted: String,
    /// `Books.$[a].Reviews.$[b].Rating`
    pub pos_filtered: String,
    /// `Books.$.Reviews.Rating`
    pub pos_first: String,
    /// `Books.$[].Reviews.$[].Rating`
    pub pos_all: String,
    /// `Rating`
    pub property: String,
    /// Number of index operations in the expression.
    pub placeholders: usize,
}

/// Converts a zero-based position into an array-filter identifier.
///
/// The letters form a bijective base-26 numeral: `a..z`, then `aa..zz`,
/// then `aaa`.
pub fn identifier(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::with_capacity(2);
    loop {
        letters.push((b'a' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn check_member(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidExpression("empty member name".into()));
    }
    if name.contains(|c: char| matches!(c, '.' | '$' | '<' | '>' | '[' | ']')) {
        return Err(Error::InvalidExpression(format!("member name '{}' contains a path character", name)));
    }
    Ok(())
}

fn check_index(arg: &IndexArg) -> Result<()> {
    match arg {
        IndexArg::Literal(i) if *i >= 0 => Ok(()),
        IndexArg::Literal(i) => {
            Err(Error::InvalidExpression(format!("index {} is negative", i)))
        }
        IndexArg::Variable(source) => {
            Err(Error::InvalidExpression(format!("index '{}' is not a literal", source)))
        }
    }
}

/// Walks the expression once and emits all path forms.
pub fn compile<T>(expr: &Expr<T>) -> Result<CompiledPath> {
    let steps = expr.steps();
    if steps.is_empty() {
        return Err(Error::InvalidExpression("a bare parameter does not navigate into any member".into()));
    }

    let mut dotted: Vec<&str> = Vec::with_capacity(steps.len());
    let mut pos_filtered: Vec<String> = Vec::with_capacity(steps.len());
    let mut pos_first: Vec<&str> = Vec::with_capacity(steps.len());
    let mut pos_all: Vec<&str> = Vec::with_capacity(steps.len());
    let mut property: Option<&str> = None;
    let mut placeholders = 0usize;

    for step in steps {
        match step {
            Step::Member(name) => {
                check_member(name)?;
                dotted.push(name);
                pos_filtered.push(name.clone());
                pos_first.push(name);
                pos_all.push(name);
                property = Some(name.as_str());
            }
            Step::Index(arg) => {
                if property.is_none() {
                    return Err(Error::InvalidExpression("an index must follow a member access".into()));
                }
                check_index(arg)?;

                pos_filtered.push(format!("$[{}]", identifier(placeholders)));
                pos_all.push("$[]");
                // only one `$` is allowed per update path
                if placeholders == 0 {
                    pos_first.push("$");
                }
                placeholders += 1;
            }
        }
    }

    let property = property
        .ok_or_else(|| Error::InvalidExpression("no member access".into()))?
        .to_string();

    Ok(CompiledPath {
        dotted: dotted.join("."),
        pos_filtered: pos_filtered.join("."),
        pos_first: pos_first.join("."),
        pos_all: pos_all.join("."),
        property,
        placeholders,
    })
}

pub fn dotted<T>(expr: &Expr<T>) -> Result<String> {
    Ok(compile(expr)?.dotted)
}

pub fn pos_filtered<T>(expr: &Expr<T>) -> Result<String> {
    Ok(compile(expr)?.pos_filtered)
}

pub fn pos_first<T>(expr: &Expr<T>) -> Result<String> {
    Ok(compile(expr)?.pos_first)
}

pub fn pos_all<T>(expr: &Expr<T>) -> Result<String> {
    Ok(compile(expr)?.pos_all)
}

pub fn property<T>(expr: &Expr<T>) -> Result<String> {
    Ok(compile(expr)?.property)
}

/// The path of a member inside the array element bound to the
/// `index`-th filter identifier: `elements(1, Rating)` gives `b.Rating`.
pub fn elements<T>(index: usize, expr: &Expr<T>) -> Result<String> {
    let compiled = compile(expr)?;
    Ok(format!("{}.{}", identifier(index), compiled.dotted))
}

/// The dotted path of a member inside an array element, without the
/// identifier prefix of [`elements`].
pub fn elements_path<T>(expr: &Expr<T>) -> Result<String> {
    dotted(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    struct Author;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier(0), "a");
        assert_eq!(identifier(1), "b");
        assert_eq!(identifier(25), "z");
        assert_eq!(identifier(26), "aa");
        assert_eq!(identifier(27), "ab");
        assert_eq!(identifier(51), "az");
        assert_eq!(identifier(52), "ba");
        assert_eq!(identifier(701), "zz");
        assert_eq!(identifier(702), "aaa");
    }

    #[test]
    fn test_identifier_at_usize_max() {
        let max = identifier(usize::MAX);
        assert!(!max.is_empty());
        assert!(max.chars().all(|c| c.is_ascii_lowercase()));
        assert_ne!(max, identifier(usize::MAX - 1));

        let path = elements(usize::MAX, &path!(Author => Rating)).unwrap();
        assert_eq!(path, format!("{}.Rating", max));
    }

    #[test]
    fn test_compile_all_forms() {
        let compiled = compile(&path!(Author => Books[1].Reviews[0].Rating)).unwrap();
        assert_eq!(compiled.dotted, "Books.Reviews.Rating");
        assert_eq!(compiled.pos_filtered, "Books.$[a].Reviews.$[b].Rating");
        assert_eq!(compiled.pos_first, "Books.$.Reviews.Rating");
        assert_eq!(compiled.pos_all, "Books.$[].Reviews.$[].Rating");
        assert_eq!(compiled.property, "Rating");
        assert_eq!(compiled.placeholders, 2);
    }

    #[test]
    fn test_trailing_index() {
        let compiled = compile(&path!(Author => Tags[3])).unwrap();
        assert_eq!(compiled.dotted, "Tags");
        assert_eq!(compiled.pos_filtered, "Tags.$[a]");
        assert_eq!(compiled.pos_first, "Tags.$");
        assert_eq!(compiled.property, "Tags");
    }

    #[test]
    fn test_rejects_member_with_dot() {
        let expr = Expr::<Author>::root().field("Books.Title");
        assert!(matches!(compile(&expr), Err(Error::InvalidExpression(_))));
    }

    #[test]
    fn test_consecutive_indices() {
        let compiled = compile(&path!(Author => Matrix[0][1].Value)).unwrap();
        assert_eq!(compiled.dotted, "Matrix.Value");
        assert_eq!(compiled.pos_filtered, "Matrix.$[a].$[b].Value");
        assert_eq!(compiled.pos_first, "Matrix.$.Value");
        assert_eq!(elements_path(&path!(Author => Matrix[0][1].Value)).unwrap(), "Matrix.Value");
    }

    #[test]
    fn test_leading_index_is_invalid() {
        let expr = Expr::<Author>::root().at(0).field("Name");
        assert!(matches!(compile(&expr), Err(Error::InvalidExpression(_))));
    }
}
