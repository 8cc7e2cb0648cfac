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


use bson::Bson;
use docweave_core::{path, Error, Template};

mod common;

use common::{Book, Review};

#[test]
fn test_render_is_repeatable() {
    let template = Template::<Book>::new(r#"{ "<title>": "<value>" }"#)
        .path(&path!(Book => title)).unwrap()
        .tag("value", "Dune");
    let first = template.render().unwrap();
    let second = template.render().unwrap();
    assert_eq!(first, r#"{ "title": "Dune" }"#);
    assert_eq!(first, second);
}

#[test]
fn test_every_unresolved_token_is_reported() {
    let template = Template::<Book>::new(r#"{ "<title>": "<value>", "<rating>": 1 }"#)
        .path(&path!(Book => title)).unwrap()
        .tag("unused", "x");
    match template.render() {
        Err(Error::UnresolvedToken(tokens)) => {
            assert_eq!(tokens, vec!["<value>", "<rating>", "<unused>"]);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    let message = template.render().unwrap_err().to_string();
    assert!(message.contains("<value>"));
    assert!(message.contains("<unused>"));
}

#[test]
fn test_update_with_array_filters() {
    let update = Template::<Book>::new(r#"{ "$set": { "<reviews.$[a].rating>": 5 } }"#)
        .pos_filtered(&path!(Book => reviews[0].rating)).unwrap()
        .to_document()
        .unwrap();
    let set = update.get_document("$set").unwrap();
    assert!(set.contains_key("reviews.$[a].rating"));

    let filter = Template::<Book>::new(r#"{ "<a.rating>": { "$lt": 3 } }"#)
        .elements(0, &path!(Review => rating)).unwrap()
        .to_document()
        .unwrap();
    assert!(filter.contains_key("a.rating"));
}

#[test]
fn test_pipeline_with_result_shape() {
    struct Summary;

    let pipeline = Template::<Book, Summary>::pipeline(r#"[{ "$group": { "_id": "$<title>", "<count>": { "$sum": 1 } } }]"#)
        .path(&path!(Book => title)).unwrap()
        .path_of_result(&path!(Summary => count)).unwrap()
        .append_stage(r#"{ "$sort": { "<count>": -1 } }"#).unwrap()
        .to_pipeline()
        .unwrap();

    assert_eq!(pipeline.len(), 2);
    let group = pipeline[0].get_document("$group").unwrap();
    assert_eq!(group.get("_id"), Some(&Bson::String("$title".into())));
    assert!(group.contains_key("count"));
    assert!(pipeline[1].get_document("$sort").unwrap().contains_key("count"));
}

#[test]
fn test_shape_errors() {
    let result = Template::<()>::new("{}").to_pipeline();
    assert!(matches!(result, Err(Error::NotAnArray)));

    let result = Template::<()>::new("[1]").to_document();
    assert!(matches!(result, Err(Error::NotAnObject(_))));
}
