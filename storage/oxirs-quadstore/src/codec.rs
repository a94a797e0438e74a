//! Canonical byte encoding of terms
//!
//! Every term kind has one Turtle-shaped UTF-8 form:
//!
//! | Kind | Form |
//! |------|------|
//! | IRI | `<value>` |
//! | Anonymous entity | `_:N` |
//! | String literal | `"value"` |
//! | Language literal | `"value"@tag` |
//! | Typed literal | `"value"^^<datatype>` |
//! | Boolean literal | `true` / `false` |
//! | Long literal | `-42` |
//! | Double literal | `1.5e0` |
//!
//! Quoted forms end in three distinct characters (`"`, a tag character, `>`),
//! and neither language tags nor IRIs may contain the separator that precedes
//! them, so decoding with a reverse search is unambiguous.

use crate::error::{Result, StoreError};
use crate::model::{AnonymousEntity, Entity, Iri, Literal, Object, Predicate, Term};

/// Statement position a term is encoded for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermRole {
    /// Subject position
    Subject,
    /// Predicate position
    Predicate,
    /// Object position
    Object,
    /// Context position
    Context,
}

impl TermRole {
    fn name(self) -> &'static str {
        match self {
            TermRole::Subject => "subject",
            TermRole::Predicate => "predicate",
            TermRole::Object => "object",
            TermRole::Context => "context",
        }
    }
}

/// Encode an entity (IRI or anonymous node)
pub fn encode_entity(entity: &Entity) -> Vec<u8> {
    entity.to_string().into_bytes()
}

/// Encode a predicate
pub fn encode_predicate(predicate: &Predicate) -> Vec<u8> {
    predicate.to_string().into_bytes()
}

/// Encode a literal
pub fn encode_literal(literal: &Literal) -> Vec<u8> {
    literal.to_string().into_bytes()
}

/// Encode an object; literals and entities live in different dictionaries,
/// which the caller picks from the object kind
pub fn encode_object(object: &Object) -> Vec<u8> {
    match object {
        Object::Entity(entity) => encode_entity(entity),
        Object::Literal(literal) => encode_literal(literal),
    }
}

/// Encode a role-less term for a given position, rejecting illegal kinds
pub fn encode_term_as(role: TermRole, term: &Term) -> Result<Vec<u8>> {
    match (role, term) {
        (TermRole::Predicate, Term::Iri(iri)) => Ok(iri.to_string().into_bytes()),
        (TermRole::Predicate, other) => Err(unsupported(other, role)),
        (TermRole::Subject | TermRole::Context, Term::Literal(_)) => Err(unsupported(term, role)),
        (_, term) => Ok(term.to_string().into_bytes()),
    }
}

fn unsupported(term: &Term, role: TermRole) -> StoreError {
    StoreError::UnsupportedTermKind {
        kind: term.kind(),
        position: role.name(),
    }
}

fn as_utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| StoreError::InvalidTermEncoding(format!("not UTF-8: {e}")))
}

fn invalid(what: &str, encoded: &str) -> StoreError {
    StoreError::InvalidTermEncoding(format!("{what}: {encoded:?}"))
}

/// Decode an entity
pub fn decode_entity(bytes: &[u8]) -> Result<Entity> {
    let encoded = as_utf8(bytes)?;
    if let Some(iri) = strip_iri(encoded) {
        return Ok(Entity::Iri(iri_from_stored(iri, encoded)?));
    }
    if let Some(counter) = encoded.strip_prefix("_:") {
        let id = counter
            .parse::<u64>()
            .map_err(|_| invalid("anonymous entity", encoded))?;
        return Ok(Entity::Anonymous(AnonymousEntity::new(id)));
    }
    Err(invalid("entity", encoded))
}

/// Decode a predicate
pub fn decode_predicate(bytes: &[u8]) -> Result<Predicate> {
    let encoded = as_utf8(bytes)?;
    match strip_iri(encoded) {
        Some(iri) => Ok(Predicate::new(iri_from_stored(iri, encoded)?)),
        None => Err(invalid("predicate", encoded)),
    }
}

/// Decode a literal
pub fn decode_literal(bytes: &[u8]) -> Result<Literal> {
    let encoded = as_utf8(bytes)?;
    if encoded.starts_with('"') && encoded.len() >= 2 {
        return decode_quoted_literal(encoded);
    }
    match encoded {
        "true" => return Ok(Literal::Boolean(true)),
        "false" => return Ok(Literal::Boolean(false)),
        _ => {}
    }
    if let Ok(value) = encoded.parse::<i64>() {
        return Ok(Literal::Long(value));
    }
    if is_double_form(encoded) {
        if let Ok(value) = encoded.parse::<f64>() {
            return Ok(Literal::Double(value));
        }
    }
    Err(invalid("literal", encoded))
}

fn is_double_form(encoded: &str) -> bool {
    encoded.contains('e') || matches!(encoded, "NaN" | "inf" | "-inf")
}

fn decode_quoted_literal(encoded: &str) -> Result<Literal> {
    if encoded.ends_with('"') {
        return Ok(Literal::String(encoded[1..encoded.len() - 1].to_string()));
    }
    if encoded.ends_with('>') {
        let split = encoded
            .rfind("\"^^<")
            .filter(|at| *at >= 1)
            .ok_or_else(|| invalid("typed literal", encoded))?;
        let datatype = &encoded[split + 4..encoded.len() - 1];
        return Ok(Literal::Typed {
            value: encoded[1..split].to_string(),
            datatype: iri_from_stored(datatype, encoded)?,
        });
    }
    let at = encoded
        .rfind('@')
        .ok_or_else(|| invalid("literal", encoded))?;
    let lang_tag = &encoded[at + 1..];
    if at < 2 || !encoded[..at].ends_with('"') || !crate::model::term::is_valid_lang_tag(lang_tag)
    {
        return Err(invalid("language literal", encoded));
    }
    Ok(Literal::Lang {
        value: encoded[1..at - 1].to_string(),
        lang_tag: lang_tag.to_string(),
    })
}

/// Decode an object stored in the node dictionary
pub fn decode_object_entity(bytes: &[u8]) -> Result<Object> {
    decode_entity(bytes).map(Object::Entity)
}

/// Decode an object stored in the literal dictionary
pub fn decode_object_literal(bytes: &[u8]) -> Result<Object> {
    decode_literal(bytes).map(Object::Literal)
}

fn strip_iri(encoded: &str) -> Option<&str> {
    encoded.strip_prefix('<')?.strip_suffix('>')
}

fn iri_from_stored(value: &str, encoded: &str) -> Result<Iri> {
    Iri::new(value).map_err(|_| invalid("IRI", encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(value: &str) -> Iri {
        Iri::new(value).unwrap()
    }

    #[test]
    fn test_entity_round_trip() -> Result<()> {
        for entity in [
            Entity::Iri(iri("http://example.org/person/1")),
            Entity::anonymous(1),
            Entity::anonymous(u64::MAX),
        ] {
            assert_eq!(decode_entity(&encode_entity(&entity))?, entity);
        }
        Ok(())
    }

    #[test]
    fn test_literal_round_trip() -> Result<()> {
        let literals = vec![
            Literal::string("Alex"),
            Literal::string(""),
            Literal::string("quote \" inside"),
            Literal::string("ends with quote\""),
            Literal::string("looks like \"x\"@en"),
            Literal::lang("chat", "fr")?,
            Literal::lang("mail@host", "en-GB")?,
            Literal::lang("", "de")?,
            Literal::typed("2024-01-01", iri("http://www.w3.org/2001/XMLSchema#date")),
            Literal::typed("a\"^^<b>", iri("http://example.org/dt")),
            Literal::Boolean(true),
            Literal::Boolean(false),
            Literal::Long(0),
            Literal::Long(-42),
            Literal::Long(i64::MIN),
            Literal::Long(i64::MAX),
            Literal::Double(1.5),
            Literal::Double(-0.0),
            Literal::Double(1e300),
            Literal::Double(f64::NAN),
            Literal::Double(-f64::NAN),
            Literal::Double(f64::INFINITY),
            Literal::Double(f64::NEG_INFINITY),
        ];
        for literal in literals {
            let encoded = encode_literal(&literal);
            assert_eq!(decode_literal(&encoded)?, literal, "{literal}");
        }
        Ok(())
    }

    #[test]
    fn test_predicate_round_trip() -> Result<()> {
        let predicate = Predicate::iri("http://xmlns.com/foaf/0.1/name")?;
        assert_eq!(decode_predicate(&encode_predicate(&predicate))?, predicate);
        Ok(())
    }

    #[test]
    fn test_invalid_encodings() {
        assert!(matches!(
            decode_entity(b"plain"),
            Err(StoreError::InvalidTermEncoding(_))
        ));
        assert!(matches!(
            decode_entity(b"_:abc"),
            Err(StoreError::InvalidTermEncoding(_))
        ));
        assert!(matches!(
            decode_predicate(b"_:1"),
            Err(StoreError::InvalidTermEncoding(_))
        ));
        assert!(matches!(
            decode_literal(b"maybe"),
            Err(StoreError::InvalidTermEncoding(_))
        ));
        assert!(matches!(
            decode_literal(b"\"x\"@"),
            Err(StoreError::InvalidTermEncoding(_))
        ));
        assert!(matches!(
            decode_literal(&[0xff, 0xfe]),
            Err(StoreError::InvalidTermEncoding(_))
        ));
    }

    #[test]
    fn test_encode_term_as_rejects_illegal_positions() {
        let literal = Term::Literal(Literal::string("x"));
        let anonymous = Term::Anonymous(AnonymousEntity::new(2));
        assert!(matches!(
            encode_term_as(TermRole::Subject, &literal),
            Err(StoreError::UnsupportedTermKind { .. })
        ));
        assert!(matches!(
            encode_term_as(TermRole::Context, &literal),
            Err(StoreError::UnsupportedTermKind { .. })
        ));
        assert!(matches!(
            encode_term_as(TermRole::Predicate, &anonymous),
            Err(StoreError::UnsupportedTermKind { .. })
        ));
        assert_eq!(
            encode_term_as(TermRole::Object, &literal).unwrap(),
            b"\"x\"".to_vec()
        );
        assert_eq!(
            encode_term_as(TermRole::Subject, &anonymous).unwrap(),
            b"_:2".to_vec()
        );
    }
}
