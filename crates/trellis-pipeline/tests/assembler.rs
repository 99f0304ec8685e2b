mod common;

use bson::{Bson, doc, oid::ObjectId};
use trellis_pipeline::Assembler;
use trellis_query::{MatchExpr, MatchOp, Query};

use common::{fields, registry};

#[test]
fn pipeline_restricts_to_the_requested_fields() {
    let registry = registry();
    let assembler = Assembler::new(&registry);
    let stages = assembler
        .pipeline("User", &Query::new(), &fields(&["name"]))
        .unwrap();
    assert_eq!(stages, vec![doc! { "$project": { "_id": true, "name": true } }]);
}

#[test]
fn count_is_the_read_pipeline_plus_a_count_stage() {
    let registry = registry();
    let assembler = Assembler::new(&registry);
    let query = Query::new().pre(MatchExpr::new().and("name", MatchOp::Eq, "Ada"));
    let stages = assembler.count("User", &query).unwrap();
    assert_eq!(
        stages,
        vec![
            doc! { "$match": { "name": { "$eq": "Ada" } } },
            doc! { "$count": "count" },
        ]
    );
}

#[test]
fn count_without_filters_is_count_alone() {
    let registry = registry();
    let assembler = Assembler::new(&registry);
    let stages = assembler.count("User", &Query::new()).unwrap();
    assert_eq!(stages, vec![doc! { "$count": "count" }]);
}

#[test]
fn count_resolves_joins_but_never_projects() {
    let registry = registry();
    let assembler = Assembler::new(&registry);
    let stages = assembler.count("Account", &Query::new()).unwrap();
    assert!(stages.iter().any(|s| s.contains_key("$lookup")));
    assert!(stages.iter().all(|s| !s.contains_key("$project")));
    assert_eq!(stages.last().unwrap(), &doc! { "$count": "count" });
}

#[test]
fn primary_id_filter_casts_to_object_id() {
    let registry = registry();
    let assembler = Assembler::new(&registry);
    let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
    let filter = assembler
        .primary_id_filter("User", id.to_hex())
        .unwrap();
    assert_eq!(filter, doc! { "_id": { "$eq": id } });
}

#[test]
fn primary_id_match_targets_the_declared_key() {
    let registry = registry();
    let assembler = Assembler::new(&registry);
    let expr = assembler.primary_id_match("Account", "abc").unwrap();
    assert_eq!(expr.conditions.len(), 1);
    assert_eq!(expr.conditions[0].path, "id");
    assert_eq!(expr.conditions[0].op, MatchOp::Eq);
    assert_eq!(expr.conditions[0].value, Bson::String("abc".into()));
}

#[test]
fn primary_id_match_requires_a_primary_key() {
    let registry = registry();
    let assembler = Assembler::new(&registry);
    assert!(assembler.primary_id_match("AccountSettings", "abc").is_err());
}
