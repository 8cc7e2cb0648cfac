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


use bson::spec::ElementType as BsonElementType;
use bson::{Bson, Document};
use std::cmp::Ordering;

/// Compares two values of comparable types.
///
/// Numbers compare across `Int32`, `Int64` and `Double`. Values of
/// different, non-numeric types order by element type; `None` is returned
/// for same-typed values that have no ordering (documents, arrays).
pub(crate) fn value_cmp(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (a, b) {
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        (Bson::DateTime(d1), Bson::DateTime(d2)) => Some(d1.cmp(d2)),
        (Bson::Boolean(b1), Bson::Boolean(b2)) => Some(b1.cmp(b2)),
        (Bson::Int64(i1), Bson::Int64(i2)) => Some(i1.cmp(i2)),
        (Bson::Int32(i1), Bson::Int32(i2)) => Some(i1.cmp(i2)),
        (Bson::Int64(i1), Bson::Int32(i2)) => Some(i1.cmp(&(*i2 as i64))),
        (Bson::Int32(i1), Bson::Int64(i2)) => Some((*i1 as i64).cmp(i2)),
        (Bson::Double(d1), Bson::Double(d2)) => Some(d1.total_cmp(d2)),
        (Bson::Double(d1), Bson::Int32(i2)) => Some(d1.total_cmp(&(*i2 as f64))),
        (Bson::Double(d1), Bson::Int64(i2)) => Some(d1.total_cmp(&(*i2 as f64))),
        (Bson::Int32(i1), Bson::Double(d2)) => Some((*i1 as f64).total_cmp(d2)),
        (Bson::Int64(i1), Bson::Double(d2)) => Some((*i1 as f64).total_cmp(d2)),
        (Bson::Binary(b1), Bson::Binary(b2)) => Some(b1.bytes.cmp(&b2.bytes)),
        (Bson::String(s1), Bson::String(s2)) => Some(s1.cmp(s2)),
        (Bson::ObjectId(oid1), Bson::ObjectId(oid2)) => Some(oid1.cmp(oid2)),
        _ => {
            let a_type = a.element_type() as u8;
            let b_type = b.element_type() as u8;
            if a_type != b_type {
                return Some(a_type.cmp(&b_type));
            }
            None
        }
    }
}

/// Equality with numeric normalization, `Int32(1) == Int64(1) == Double(1.0)`.
pub(crate) fn value_eq(a: &Bson, b: &Bson) -> bool {
    match (a, b) {
        (Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_), Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => {
            value_cmp(a, b) == Some(Ordering::Equal)
        }
        _ => a == b,
    }
}

/// A hashable key for scalar values.
///
/// Equal values under [`value_eq`] produce equal keys. Integral doubles
/// share the key of the matching integer. Documents, arrays and other
/// composite values have no key.
pub(crate) fn value_key(value: &Bson) -> Option<Vec<u8>> {
    let mut key = Vec::with_capacity(16);
    match value {
        Bson::Int32(i) => push_int(&mut key, *i as i64),
        Bson::Int64(i) => push_int(&mut key, *i),
        Bson::Double(d) if d.fract() == 0.0 && d.abs() < 9.0e15 => push_int(&mut key, *d as i64),
        Bson::Double(d) => {
            key.push(BsonElementType::Double as u8);
            key.extend_from_slice(&d.to_be_bytes());
        }
        Bson::String(s) => {
            key.push(BsonElementType::String as u8);
            key.extend_from_slice(s.as_bytes());
        }
        Bson::ObjectId(oid) => {
            key.push(BsonElementType::ObjectId as u8);
            key.extend_from_slice(&oid.bytes());
        }
        Bson::Binary(bin) => {
            key.push(BsonElementType::Binary as u8);
            key.push(u8::from(bin.subtype));
            key.extend_from_slice(&bin.bytes);
        }
        Bson::Boolean(b) => {
            key.push(BsonElementType::Boolean as u8);
            key.push(*b as u8);
        }
        Bson::Null => key.push(BsonElementType::Null as u8),
        Bson::DateTime(dt) => {
            key.push(BsonElementType::DateTime as u8);
            key.extend_from_slice(&dt.timestamp_millis().to_be_bytes());
        }
        _ => return None,
    }
    Some(key)
}

fn push_int(key: &mut Vec<u8>, value: i64) {
    key.push(BsonElementType::Int64 as u8);
    key.extend_from_slice(&value.to_be_bytes());
}

/// Every value reachable through a dotted path.
///
/// Arrays of documents fan out the way a document store resolves
/// `Reviews.Rating`; an array at the end of the path yields itself and
/// each of its elements.
pub(crate) fn values_at_path<'a>(doc: &'a Document, path: &[&str]) -> Vec<&'a Bson> {
    let mut result = Vec::new();
    if let Some((first, rest)) = path.split_first() {
        if let Some(value) = doc.get(*first) {
            collect_values(value, rest, &mut result);
        }
    }
    result
}

fn collect_values<'a>(value: &'a Bson, path: &[&str], out: &mut Vec<&'a Bson>) {
    if path.is_empty() {
        out.push(value);
        if let Bson::Array(items) = value {
            out.extend(items.iter());
        }
        return;
    }
    match value {
        Bson::Document(doc) => {
            if let Some(next) = doc.get(path[0]) {
                collect_values(next, &path[1..], out);
            }
        }
        Bson::Array(items) => {
            for item in items {
                if let Bson::Document(_) = item {
                    collect_values(item, path, out);
                }
            }
        }
        _ => (),
    }
}

#[cfg(test)]
mod tests {
    use super::{value_cmp, value_eq, value_key, values_at_path};
    use bson::oid::ObjectId;
    use bson::{doc, Bson};
    use std::cmp::Ordering;

    #[test]
    fn test_value_cmp() {
        assert_eq!(value_cmp(&Bson::Int32(2), &Bson::Int64(3)), Some(Ordering::Less));
        assert_eq!(value_cmp(&Bson::Int64(2), &Bson::Int32(1)), Some(Ordering::Greater));
        assert_eq!(value_cmp(&Bson::Double(1.0), &Bson::Int64(1)), Some(Ordering::Equal));
        assert_eq!(value_cmp(&doc! {}.into(), &doc! {}.into()), None);
    }

    #[test]
    fn test_value_key_normalizes_numbers() {
        assert_eq!(value_key(&Bson::Int32(7)), value_key(&Bson::Int64(7)));
        assert_eq!(value_key(&Bson::Double(7.0)), value_key(&Bson::Int64(7)));
        assert_ne!(value_key(&Bson::Int64(7)), value_key(&Bson::String("7".into())));
        assert!(value_key(&Bson::Array(vec![])).is_none());
        assert!(value_eq(&Bson::Int32(7), &Bson::Double(7.0)));

        let oid = ObjectId::new();
        assert_eq!(value_key(&Bson::ObjectId(oid)), value_key(&Bson::ObjectId(oid)));
    }

    #[test]
    fn test_values_at_path() {
        let doc = doc! {
            "Books": [
                { "Reviews": [ { "Rating": 4 }, { "Rating": 5 } ] },
                { "Reviews": [ { "Rating": 1 } ] },
            ],
            "Name": "Vincent",
        };
        let ratings = values_at_path(&doc, &["Books", "Reviews", "Rating"]);
        assert_eq!(ratings, vec![&Bson::Int32(4), &Bson::Int32(5), &Bson::Int32(1)]);
        assert_eq!(values_at_path(&doc, &["Name"]), vec![&Bson::String("Vincent".into())]);
        assert!(values_at_path(&doc, &["Missing"]).is_empty());
    }
}
