use schemaviz_core::{category::Category, source::TypeSource};
use schemaviz_parser::{error::ErrorCode, parse};

const SCHEMA: &str = r#"
define

# people and organisations
person sub entity,
    owns name @key,
    owns email,
    plays employment:employee;

company sub entity,
    owns name,
    plays employment:employer;

name sub attribute, value string;
email sub attribute, value string, regex "^.+@.+$";

employment sub relation,
    owns start-date,
    relates employee,
    relates employer;

start-date sub attribute, value datetime;
"#;

fn codes(source: &str) -> Vec<ErrorCode> {
    parse(source)
        .expect_err("schema should be rejected")
        .diagnostics()
        .iter()
        .filter_map(|d| d.code())
        .collect()
}

#[test]
fn test_parse_full_schema() {
    let schema = parse(SCHEMA).unwrap();

    let entity_root = schema.category_root(Category::Entity).unwrap();
    let entities: Vec<_> = schema
        .direct_subtypes(&entity_root)
        .unwrap()
        .iter()
        .map(|t| schema.type_label(t).unwrap().unwrap())
        .collect();
    assert_eq!(entities, vec!["person", "company"]);

    let employment = schema.find_type("employment").unwrap();
    let roles: Vec<_> = schema
        .declared_roles(&employment)
        .unwrap()
        .iter()
        .map(|r| schema.role_label(r).unwrap().unwrap())
        .collect();
    assert_eq!(roles, vec!["employee", "employer"]);

    let owned = schema.owned_attributes(&employment).unwrap();
    assert_eq!(owned, vec![schema.find_type("start-date").unwrap()]);
}

#[test]
fn test_empty_schema() {
    let schema = parse("define\n# nothing yet\n").unwrap();

    assert_eq!(schema.type_count(), 3);
}

#[test]
fn test_lexer_errors_stop_the_pipeline() {
    assert_eq!(codes("person sub entity; $ name sub attribute;"), vec![ErrorCode::E002]);
}

#[test]
fn test_syntax_errors_are_collected() {
    assert_eq!(
        codes("person sub entity owns name;\ncompany sub entity, plays;"),
        vec![ErrorCode::E100, ErrorCode::E100]
    );
}

#[test]
fn test_resolution_errors_are_collected() {
    assert_eq!(
        codes("person sub entity, owns name;\nname sub attribute;\nteam sub group;"),
        vec![ErrorCode::E200]
    );
}

#[test]
fn test_diagnostic_spans_point_into_source() {
    let source = "person sub entity, owns nickname;";
    let err = parse(source).unwrap_err();
    let label = &err.diagnostics()[0].labels()[0];

    assert_eq!(
        &source[label.span().start()..label.span().end()],
        "nickname"
    );
}
