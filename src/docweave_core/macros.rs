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

/// Builds an [`Expr`](crate::path::Expr) from member-access syntax.
///
/// ```
/// use docweave_core::{path, path::dotted};
///
/// struct Author;
///
/// let expr = path!(Author => Books[1].Reviews[0].Rating);
/// assert_eq!(dotted(&expr).unwrap(), "Books.Reviews.Rating");
/// ```
///
/// A bracketed literal is an index; anything else inside brackets is kept
/// as a variable index and rejected when the expression is compiled.
#[macro_export]
macro_rules! path {
    ($ty:ty => $($rest:tt)+) => {{
        let mut steps: ::std::vec::Vec<$crate::path::Step> = ::std::vec::Vec::new();
        $crate::__path_steps!(steps; $($rest)+);
        $crate::path::Expr::<$ty>::from_steps(steps)
    }};
    ($ty:ty) => {
        $crate::path::Expr::<$ty>::root()
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __path_steps {
    ($steps:ident;) => {};
    ($steps:ident; . $($rest:tt)*) => {
        $crate::__path_steps!($steps; $($rest)*);
    };
    ($steps:ident; $field:ident $($rest:tt)*) => {
        $steps.push($crate::path::Step::member(stringify!($field)));
        $crate::__path_steps!($steps; $($rest)*);
    };
    ($steps:ident; [$idx:literal] $($rest:tt)*) => {
        $steps.push($crate::path::Step::index($idx));
        $crate::__path_steps!($steps; $($rest)*);
    };
    ($steps:ident; [$($idx:tt)+] $($rest:tt)*) => {
        $steps.push($crate::path::Step::variable(stringify!($($idx)+)));
        $crate::__path_steps!($steps; $($rest)*);
    };
}
