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

/// The argument of an indexing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexArg {
    /// `Reviews[0]`
    Literal(i64),
    /// `Reviews[i]`, kept only so the compiler can reject it.
    Variable(String),
}

/// One node of a navigation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Member(String),
    Index(IndexArg),
}

impl Step {

    pub fn member(name: impl Into<String>) -> Step {
        Step::Member(name.into())
    }

    pub fn index(value: i64) -> Step {
        Step::Index(IndexArg::Literal(value))
    }

    pub fn variable(source: impl Into<String>) -> Step {
        Step::Index(IndexArg::Variable(source.into()))
    }

}

/// A navigation expression rooted at a parameter of shape `T`.
///
/// `Expr::<T>::root()` is the bare parameter (`x => x`); every `field` and
/// `at` call appends one node. The [`path!`](crate::path!) macro builds the
/// same value from `Type => A[0].B` syntax.
pub struct Expr<T> {
    steps: Vec<Step>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Expr<T> {

    pub fn root() -> Expr<T> {
        Expr::from_steps(Vec::new())
    }

    pub fn from_steps(steps: Vec<Step>) -> Expr<T> {
        Expr {
            steps,
            _phantom: PhantomData,
        }
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.steps.push(Step::member(name));
        self
    }

    pub fn at(mut self, index: i64) -> Self {
        self.steps.push(Step::index(index));
        self
    }

    pub fn at_var(mut self, source: impl Into<String>) -> Self {
        self.steps.push(Step::variable(source));
        self
    }

    #[inline]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Expr::from_steps(self.steps.clone())
    }
}

impl<T> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x => x")?;
        for step in &self.steps {
            match step {
                Step::Member(name) => write!(f, ".{}", name)?,
                Step::Index(IndexArg::Literal(i)) => write!(f, "[{}]", i)?,
                Step::Index(IndexArg::Variable(v)) => write!(f, "[{}]", v)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::path::{Expr, IndexArg, Step};

    struct Author;

    #[test]
    fn test_builder_and_macro_agree() {
        let built = Expr::<Author>::root().field("Books").at(1).field("Title");
        let from_macro = crate::path!(Author => Books[1].Title);
        assert_eq!(built.steps(), from_macro.steps());
    }

    #[test]
    fn test_macro_keeps_variable_index() {
        let expr = crate::path!(Author => Books[i].Title);
        assert_eq!(expr.steps()[1], Step::Index(IndexArg::Variable("i".into())));
    }

    #[test]
    fn test_debug_format() {
        let expr = crate::path!(Author => Books[2].Reviews[0].Rating);
        assert_eq!(format!("{:?}", expr), "x => x.Books[2].Reviews[0].Rating");
        assert!(crate::path!(Author).is_root());
    }
}
