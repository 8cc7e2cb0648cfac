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


use std::cmp::Ordering;
use std::collections::HashSet;
use bson::{Bson, Document};
use crate::utils::{value_cmp, value_eq, value_key, values_at_path};
use crate::{Error, Result};

/// A set of values with constant-time membership for scalars.
pub(crate) struct ValueSet {
    keys: HashSet<Vec<u8>>,
    others: Vec<Bson>,
}

impl ValueSet {

    fn compile(values: &[Bson]) -> ValueSet {
        let mut keys = HashSet::with_capacity(values.len());
        let mut others = Vec::new();
        for value in values {
            match value_key(value) {
                Some(key) => {
                    keys.insert(key);
                }
                None => others.push(value.clone()),
            }
        }
        ValueSet { keys, others }
    }

    fn contains(&self, value: &Bson) -> bool {
        match value_key(value) {
            Some(key) => self.keys.contains(&key),
            None => self.others.iter().any(|other| value_eq(other, value)),
        }
    }

}

pub(crate) enum Condition {
    Eq(Bson),
    Ne(Bson),
    In(ValueSet),
    Nin(ValueSet),
    Exists(bool),
    Cmp(Ordering, bool, Bson),
}

impl Condition {

    fn test(&self, candidates: &[&Bson]) -> bool {
        match self {
            Condition::Eq(expected) => candidates.iter().any(|c| value_eq(c, expected)),
            Condition::Ne(expected) => !candidates.iter().any(|c| value_eq(c, expected)),
            Condition::In(set) => candidates.iter().any(|c| set.contains(c)),
            Condition::Nin(set) => !candidates.iter().any(|c| set.contains(c)),
            Condition::Exists(expected) => !candidates.is_empty() == *expected,
            Condition::Cmp(ordering, or_equal, operand) => candidates.iter().any(|c| {
                // only same-kind values are ordered, as in the document store
                if c.element_type() != operand.element_type() && !(is_number(c) && is_number(operand)) {
                    return false;
                }
                match value_cmp(c, operand) {
                    Some(Ordering::Equal) => *or_equal,
                    Some(actual) => actual == *ordering,
                    None => false,
                }
            }),
        }
    }

}

fn is_number(value: &Bson) -> bool {
    matches!(value, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
}

/// A compiled query filter.
///
/// Supports `$and`, `$or`, `$nor` and the field operators `$eq`, `$ne`,
/// `$in`, `$nin`, `$exists`, `$gt`, `$gte`, `$lt`, `$lte` over dotted
/// paths. Anything else is rejected when the filter is compiled.
pub(crate) enum Matcher {
    And(Vec<Matcher>),
    Or(Vec<Matcher>),
    Nor(Vec<Matcher>),
    Field {
        path: Vec<String>,
        conditions: Vec<Condition>,
    },
}

impl Matcher {

    pub(crate) fn compile(filter: &Document) -> Result<Matcher> {
        let mut clauses = Vec::with_capacity(filter.len());
        for (key, value) in filter {
            let clause = match key.as_str() {
                "$and" => Matcher::And(Matcher::compile_list(key, value)?),
                "$or" => Matcher::Or(Matcher::compile_list(key, value)?),
                "$nor" => Matcher::Nor(Matcher::compile_list(key, value)?),
                op if op.starts_with('$') => {
                    return Err(Error::NotSupported(format!("top-level operator '{}'", op)));
                }
                field => Matcher::Field {
                    path: field.split('.').map(String::from).collect(),
                    conditions: compile_conditions(value)?,
                },
            };
            clauses.push(clause);
        }
        Ok(Matcher::And(clauses))
    }

    fn compile_list(op: &str, value: &Bson) -> Result<Vec<Matcher>> {
        let items = match value {
            Bson::Array(items) if !items.is_empty() => items,
            _ => return Err(Error::NotSupported(format!("'{}' expects a non-empty array", op))),
        };
        items
            .iter()
            .map(|item| match item {
                Bson::Document(doc) => Matcher::compile(doc),
                _ => Err(Error::NotSupported(format!("'{}' expects documents", op))),
            })
            .collect()
    }

    pub(crate) fn matches(&self, doc: &Document) -> bool {
        match self {
            Matcher::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Matcher::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
            Matcher::Nor(clauses) => !clauses.iter().any(|c| c.matches(doc)),
            Matcher::Field { path, conditions } => {
                let path: Vec<&str> = path.iter().map(String::as_str).collect();
                let candidates = values_at_path(doc, &path);
                conditions.iter().all(|c| c.test(&candidates))
            }
        }
    }

}

fn is_operator_document(doc: &Document) -> bool {
    doc.keys().next().map_or(false, |key| key.starts_with('$'))
}

fn compile_conditions(value: &Bson) -> Result<Vec<Condition>> {
    let doc = match value {
        Bson::Document(doc) if is_operator_document(doc) => doc,
        other => return Ok(vec![Condition::Eq(other.clone())]),
    };

    let mut conditions = Vec::with_capacity(doc.len());
    for (op, operand) in doc {
        let condition = match op.as_str() {
            "$eq" => Condition::Eq(operand.clone()),
            "$ne" => Condition::Ne(operand.clone()),
            "$in" => Condition::In(ValueSet::compile(expect_array(op, operand)?)),
            "$nin" => Condition::Nin(ValueSet::compile(expect_array(op, operand)?)),
            "$exists" => Condition::Exists(truthy(operand)),
            "$gt" => Condition::Cmp(Ordering::Greater, false, operand.clone()),
            "$gte" => Condition::Cmp(Ordering::Greater, true, operand.clone()),
            "$lt" => Condition::Cmp(Ordering::Less, false, operand.clone()),
            "$lte" => Condition::Cmp(Ordering::Less, true, operand.clone()),
            _ => return Err(Error::NotSupported(format!("field operator '{}'", op))),
        };
        conditions.push(condition);
    }
    Ok(conditions)
}

fn expect_array<'a>(op: &str, operand: &'a Bson) -> Result<&'a [Bson]> {
    match operand {
        Bson::Array(items) => Ok(items),
        _ => Err(Error::NotSupported(format!("'{}' expects an array", op))),
    }
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(d) => *d != 0.0,
        Bson::Null => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use bson::oid::ObjectId;
    use crate::store::memory::Matcher;
    use crate::Error;

    fn check(filter: bson::Document, doc: bson::Document) -> bool {
        Matcher::compile(&filter).unwrap().matches(&doc)
    }

    #[test]
    fn test_equality_and_in() {
        let oid = ObjectId::new();
        assert!(check(doc! { "_id": oid }, doc! { "_id": oid }));
        assert!(check(doc! { "_id": { "$in": [1_i64, 2_i64] } }, doc! { "_id": 2 }));
        assert!(!check(doc! { "_id": { "$in": [1_i64, 2_i64] } }, doc! { "_id": 3 }));
        assert!(check(doc! { "_id": { "$nin": [1_i64] } }, doc! { "_id": 3 }));
    }

    #[test]
    fn test_or_over_join_fields() {
        let filter = doc! {
            "$or": [
                { "ParentID": { "$in": ["a"] } },
                { "ChildID": { "$in": ["a"] } },
            ],
        };
        assert!(check(filter.clone(), doc! { "ParentID": "x", "ChildID": "a" }));
        assert!(!check(filter, doc! { "ParentID": "x", "ChildID": "y" }));
    }

    #[test]
    fn test_array_fan_out_and_comparison() {
        let doc = doc! { "Reviews": [ { "Rating": 2 }, { "Rating": 5 } ], "Tags": ["a", "b"] };
        assert!(check(doc! { "Reviews.Rating": { "$gte": 5 } }, doc.clone()));
        assert!(!check(doc! { "Reviews.Rating": { "$gt": 5 } }, doc.clone()));
        assert!(check(doc! { "Tags": "b" }, doc.clone()));
        assert!(check(doc! { "Missing": { "$exists": false } }, doc));
    }

    #[test]
    fn test_unknown_operator() {
        let result = Matcher::compile(&doc! { "a": { "$where": "1" } });
        assert!(matches!(result, Err(Error::NotSupported(_))));
    }
}
