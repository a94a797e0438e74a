//! Property-based tests for pattern matching and the term dictionary using proptest

use oxirs_quadstore::codec;
use oxirs_quadstore::{
    CollectionName, Context, Entity, Iri, Literal, Object, QuadPattern, QuadStore, Statement,
};
use proptest::prelude::*;

/// IRIs from a small vocabulary, so generated statements collide often
fn iri_strategy() -> impl Strategy<Value = Iri> {
    (0u8..4).prop_map(|n| Iri::new(format!("http://example.org/r{n}")).unwrap())
}

fn literal_strategy() -> impl Strategy<Value = Literal> {
    prop_oneof![
        prop::string::string_regex("[a-zA-Z0-9 .,!?\"@^<>-]{0,12}")
            .unwrap()
            .prop_map(Literal::string),
        (
            prop::string::string_regex("[a-zA-Z0-9 @\"]{0,8}").unwrap(),
            prop::string::string_regex("[a-z]{2}(-[A-Z]{2})?").unwrap()
        )
            .prop_map(|(value, tag)| Literal::lang(value, tag).unwrap()),
        any::<bool>().prop_map(Literal::Boolean),
        any::<i64>().prop_map(Literal::Long),
        any::<f64>().prop_map(Literal::Double),
        (prop::string::string_regex("[a-z0-9\"]{0,8}").unwrap(), iri_strategy())
            .prop_map(|(value, datatype)| Literal::typed(value, datatype)),
    ]
}

fn object_strategy() -> impl Strategy<Value = Object> {
    prop_oneof![
        iri_strategy().prop_map(Object::from),
        (0u8..3).prop_map(|n| Object::from(Literal::Long(n as i64))),
        (0u8..2).prop_map(|n| Object::from(Literal::string(format!("v{n}")))),
    ]
}

fn context_strategy() -> impl Strategy<Value = Context> {
    prop_oneof![
        Just(Context::Default),
        (0u8..2).prop_map(|n| Context::named(Iri::new(format!("http://example.org/g{n}")).unwrap())),
    ]
}

fn statement_strategy() -> impl Strategy<Value = Statement> {
    (iri_strategy(), iri_strategy(), object_strategy(), context_strategy())
        .prop_map(|(s, p, o, c)| Statement::new(s, p, o, c))
}

fn pattern_strategy() -> impl Strategy<Value = QuadPattern> {
    (
        prop::option::of(iri_strategy()),
        prop::option::of(iri_strategy()),
        prop::option::of(object_strategy()),
        prop::option::of(context_strategy()),
    )
        .prop_map(|(s, p, o, c)| QuadPattern {
            subject: s.map(Entity::from),
            predicate: p.map(Into::into),
            object: o,
            context: c,
        })
}

fn sorted(mut statements: Vec<Statement>) -> Vec<Statement> {
    statements.sort_by_key(|s| s.to_string());
    statements.dedup();
    statements
}

proptest! {
    #[test]
    fn prop_literal_encoding_round_trips(literal in literal_strategy()) {
        let encoded = codec::encode_literal(&literal);
        let decoded = codec::decode_literal(&encoded).unwrap();
        prop_assert_eq!(decoded, literal);
    }

    #[test]
    fn prop_match_pattern_equals_naive_filter(
        statements in prop::collection::vec(statement_strategy(), 0..24),
        removals in prop::collection::vec(statement_strategy(), 0..8),
        pattern in pattern_strategy(),
    ) {
        let store = QuadStore::in_memory();
        let data = CollectionName::new("data").unwrap();
        let mut tx = store.write().unwrap();
        tx.create_collection(&data).unwrap();
        for statement in &statements {
            tx.add_statement(&data, statement).unwrap();
        }
        for statement in &removals {
            tx.remove_statement(&data, statement).unwrap();
        }
        tx.commit().unwrap();

        let expected_all: Vec<Statement> = sorted(
            statements.into_iter().filter(|s| !removals.contains(s)).collect(),
        );

        let read = store.read().unwrap();
        let all = sorted(read.all_statements(&data).unwrap().collect::<Result<_, _>>().unwrap());
        prop_assert_eq!(&all, &expected_all);

        let expected: Vec<Statement> = all.iter().filter(|s| pattern.matches(s)).cloned().collect();
        let actual = sorted(read.match_pattern(&data, &pattern).unwrap().collect::<Result<_, _>>().unwrap());
        prop_assert_eq!(actual, expected.clone());
        prop_assert_eq!(read.count(&data, &pattern).unwrap(), expected.len());
    }
}
