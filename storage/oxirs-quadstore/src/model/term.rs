//! RDF term types, one closed sum type per statement role

use crate::error::{Result, StoreError};
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

/// XSD datatype IRIs carried by the specialised literal variants
pub mod xsd {
    /// `xsd:string`
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    /// `xsd:boolean`
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    /// `xsd:long`
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
    /// `xsd:double`
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    /// `rdf:langString`
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

/// An IRI reference
///
/// Construction rejects values that could not appear inside an N-Triples
/// `IRIREF`, which keeps the canonical `<value>` encoding unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri(String);

impl Iri {
    /// Create a new IRI, validating its characters
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(StoreError::InvalidTerm("IRI must not be empty".to_string()));
        }
        if let Some(c) = value.chars().find(|c| !is_iri_char(*c)) {
            return Err(StoreError::InvalidTerm(format!(
                "IRI {value:?} contains forbidden character {c:?}"
            )));
        }
        Ok(Iri(value))
    }

    /// The IRI as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the IRI into its string value
    pub fn into_string(self) -> String {
        self.0
    }
}

fn is_iri_char(c: char) -> bool {
    !matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
        && !c.is_whitespace()
        && !c.is_control()
}

impl Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// An anonymous entity minted by a collection's entity counter
///
/// Id `0` is reserved for the default context and is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnonymousEntity(u64);

impl AnonymousEntity {
    /// Wrap a raw counter value. Validity is checked against the collection
    /// when the entity is written.
    pub const fn new(id: u64) -> Self {
        AnonymousEntity(id)
    }

    /// The raw counter value
    pub const fn id(&self) -> u64 {
        self.0
    }
}

impl Display for AnonymousEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// A resource that can occupy the subject or context position
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    /// Externally named resource
    Iri(Iri),
    /// Collection-scoped anonymous node
    Anonymous(AnonymousEntity),
}

impl Entity {
    /// Convenience constructor for an IRI entity
    pub fn iri(value: impl Into<String>) -> Result<Self> {
        Ok(Entity::Iri(Iri::new(value)?))
    }

    /// Convenience constructor for an anonymous entity
    pub const fn anonymous(id: u64) -> Self {
        Entity::Anonymous(AnonymousEntity::new(id))
    }
}

impl From<Iri> for Entity {
    fn from(iri: Iri) -> Self {
        Entity::Iri(iri)
    }
}

impl From<AnonymousEntity> for Entity {
    fn from(entity: AnonymousEntity) -> Self {
        Entity::Anonymous(entity)
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Iri(iri) => iri.fmt(f),
            Entity::Anonymous(entity) => entity.fmt(f),
        }
    }
}

/// A named relation; always an IRI
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Predicate(Iri);

impl Predicate {
    /// Create a predicate from an IRI
    pub fn new(iri: Iri) -> Self {
        Predicate(iri)
    }

    /// Convenience constructor validating the IRI
    pub fn iri(value: impl Into<String>) -> Result<Self> {
        Ok(Predicate(Iri::new(value)?))
    }

    /// The underlying IRI
    pub fn as_iri(&self) -> &Iri {
        &self.0
    }
}

impl From<Iri> for Predicate {
    fn from(iri: Iri) -> Self {
        Predicate(iri)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Literal value
///
/// Equality is structural. `Double` values compare by bit pattern so that
/// the type can be used as a hash key, except that every NaN is one value.
#[derive(Debug, Clone)]
pub enum Literal {
    /// Language-tagged string
    Lang {
        /// Lexical value
        value: String,
        /// BCP47 language tag
        lang_tag: String,
    },
    /// `xsd:string`
    String(String),
    /// `xsd:boolean`
    Boolean(bool),
    /// `xsd:long`
    Long(i64),
    /// `xsd:double`
    Double(f64),
    /// Any other datatype
    Typed {
        /// Lexical value
        value: String,
        /// Datatype IRI
        datatype: Iri,
    },
}

impl Literal {
    /// Plain string literal
    pub fn string(value: impl Into<String>) -> Self {
        Literal::String(value.into())
    }

    /// Language-tagged literal; the tag must match `[A-Za-z]+(-[A-Za-z0-9]+)*`
    pub fn lang(value: impl Into<String>, lang_tag: impl Into<String>) -> Result<Self> {
        let lang_tag = lang_tag.into();
        if !is_valid_lang_tag(&lang_tag) {
            return Err(StoreError::InvalidTerm(format!(
                "invalid language tag {lang_tag:?}"
            )));
        }
        Ok(Literal::Lang {
            value: value.into(),
            lang_tag,
        })
    }

    /// Literal with an explicit datatype
    pub fn typed(value: impl Into<String>, datatype: Iri) -> Self {
        Literal::Typed {
            value: value.into(),
            datatype,
        }
    }

    /// The datatype IRI of this literal
    pub fn datatype(&self) -> &str {
        match self {
            Literal::Lang { .. } => xsd::LANG_STRING,
            Literal::String(_) => xsd::STRING,
            Literal::Boolean(_) => xsd::BOOLEAN,
            Literal::Long(_) => xsd::LONG,
            Literal::Double(_) => xsd::DOUBLE,
            Literal::Typed { datatype, .. } => datatype.as_str(),
        }
    }
}

pub(crate) fn is_valid_lang_tag(tag: &str) -> bool {
    let mut parts = tag.split('-');
    let primary_ok = parts
        .next()
        .is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphabetic()));
    primary_ok && parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Literal::Lang { value, lang_tag },
                Literal::Lang {
                    value: other_value,
                    lang_tag: other_tag,
                },
            ) => value == other_value && lang_tag == other_tag,
            (Literal::String(a), Literal::String(b)) => a == b,
            (Literal::Boolean(a), Literal::Boolean(b)) => a == b,
            (Literal::Long(a), Literal::Long(b)) => a == b,
            (Literal::Double(a), Literal::Double(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            (
                Literal::Typed { value, datatype },
                Literal::Typed {
                    value: other_value,
                    datatype: other_datatype,
                },
            ) => value == other_value && datatype == other_datatype,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Literal::Lang { value, lang_tag } => {
                value.hash(state);
                lang_tag.hash(state);
            }
            Literal::String(value) => value.hash(state),
            Literal::Boolean(value) => value.hash(state),
            Literal::Long(value) => value.hash(state),
            Literal::Double(value) if value.is_nan() => f64::NAN.to_bits().hash(state),
            Literal::Double(value) => value.to_bits().hash(state),
            Literal::Typed { value, datatype } => {
                value.hash(state);
                datatype.hash(state);
            }
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Lang { value, lang_tag } => write!(f, "\"{value}\"@{lang_tag}"),
            Literal::String(value) => write!(f, "\"{value}\""),
            Literal::Boolean(value) => write!(f, "{value}"),
            Literal::Long(value) => write!(f, "{value}"),
            Literal::Double(value) => write!(f, "{value:e}"),
            Literal::Typed { value, datatype } => write!(f, "\"{value}\"^^{datatype}"),
        }
    }
}

/// Anything that can occupy the object position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
    /// Reference to an entity
    Entity(Entity),
    /// Literal value
    Literal(Literal),
}

impl From<Entity> for Object {
    fn from(entity: Entity) -> Self {
        Object::Entity(entity)
    }
}

impl From<Iri> for Object {
    fn from(iri: Iri) -> Self {
        Object::Entity(Entity::Iri(iri))
    }
}

impl From<Literal> for Object {
    fn from(literal: Literal) -> Self {
        Object::Literal(literal)
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Entity(entity) => entity.fmt(f),
            Object::Literal(literal) => literal.fmt(f),
        }
    }
}

/// The graph a statement belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Context {
    /// The default graph, stored as id `0`
    #[default]
    Default,
    /// A named graph
    Named(Entity),
}

impl Context {
    /// Named graph identified by an IRI
    pub fn named(entity: impl Into<Entity>) -> Self {
        Context::Named(entity.into())
    }

    /// Whether this is the default graph
    pub fn is_default(&self) -> bool {
        matches!(self, Context::Default)
    }
}

impl Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Default => f.write_str("DEFAULT"),
            Context::Named(entity) => entity.fmt(f),
        }
    }
}

/// A role-less term as produced by parsers and query front ends
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// IRI
    Iri(Iri),
    /// Anonymous entity
    Anonymous(AnonymousEntity),
    /// Literal
    Literal(Literal),
}

impl Term {
    /// Human readable kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Term::Iri(_) => "IRI",
            Term::Anonymous(_) => "anonymous entity",
            Term::Literal(_) => "literal",
        }
    }

    /// Convert into a subject, rejecting literals
    pub fn into_subject(self) -> Result<Entity> {
        self.into_entity("subject")
    }

    /// Convert into a named context, rejecting literals
    pub fn into_context(self) -> Result<Context> {
        self.into_entity("context").map(Context::Named)
    }

    /// Convert into a predicate; only IRIs are accepted
    pub fn into_predicate(self) -> Result<Predicate> {
        match self {
            Term::Iri(iri) => Ok(Predicate(iri)),
            other => Err(StoreError::UnsupportedTermKind {
                kind: other.kind(),
                position: "predicate",
            }),
        }
    }

    /// Convert into an object; every kind is accepted
    pub fn into_object(self) -> Object {
        match self {
            Term::Iri(iri) => Object::Entity(Entity::Iri(iri)),
            Term::Anonymous(entity) => Object::Entity(Entity::Anonymous(entity)),
            Term::Literal(literal) => Object::Literal(literal),
        }
    }

    fn into_entity(self, position: &'static str) -> Result<Entity> {
        match self {
            Term::Iri(iri) => Ok(Entity::Iri(iri)),
            Term::Anonymous(entity) => Ok(Entity::Anonymous(entity)),
            Term::Literal(_) => Err(StoreError::UnsupportedTermKind {
                kind: "literal",
                position,
            }),
        }
    }
}

impl From<Entity> for Term {
    fn from(entity: Entity) -> Self {
        match entity {
            Entity::Iri(iri) => Term::Iri(iri),
            Entity::Anonymous(entity) => Term::Anonymous(entity),
        }
    }
}

impl From<Predicate> for Term {
    fn from(predicate: Predicate) -> Self {
        Term::Iri(predicate.0)
    }
}

impl From<Object> for Term {
    fn from(object: Object) -> Self {
        match object {
            Object::Entity(entity) => entity.into(),
            Object::Literal(literal) => Term::Literal(literal),
        }
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

impl TryFrom<Term> for Entity {
    type Error = StoreError;

    fn try_from(term: Term) -> Result<Self> {
        term.into_subject()
    }
}

impl TryFrom<Term> for Predicate {
    type Error = StoreError;

    fn try_from(term: Term) -> Result<Self> {
        term.into_predicate()
    }
}

impl TryFrom<Term> for Context {
    type Error = StoreError;

    fn try_from(term: Term) -> Result<Self> {
        term.into_context()
    }
}

impl From<Term> for Object {
    fn from(term: Term) -> Self {
        term.into_object()
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => iri.fmt(f),
            Term::Anonymous(entity) => entity.fmt(f),
            Term::Literal(literal) => literal.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iri_validation() {
        assert!(Iri::new("http://example.org/a").is_ok());
        assert!(Iri::new("").is_err());
        assert!(Iri::new("http://example.org/a b").is_err());
        assert!(Iri::new("http://example.org/<a>").is_err());
    }

    #[test]
    fn test_lang_tag_validation() {
        assert!(Literal::lang("hello", "en").is_ok());
        assert!(Literal::lang("hello", "en-GB").is_ok());
        assert!(Literal::lang("hallo", "de-1996").is_ok());
        assert!(Literal::lang("x", "").is_err());
        assert!(Literal::lang("x", "en@x").is_err());
        assert!(Literal::lang("x", "en-").is_err());
        assert!(Literal::lang("x", "1en").is_err());
    }

    #[test]
    fn test_double_literal_equality_is_bitwise() {
        assert_eq!(Literal::Double(f64::NAN), Literal::Double(f64::NAN));
        assert_ne!(Literal::Double(0.0), Literal::Double(-0.0));
        assert_eq!(Literal::Double(1.5), Literal::Double(1.5));
    }

    #[test]
    fn test_all_nan_doubles_are_one_value() {
        use std::collections::hash_map::DefaultHasher;

        fn hash_of(literal: &Literal) -> u64 {
            let mut hasher = DefaultHasher::new();
            literal.hash(&mut hasher);
            hasher.finish()
        }

        let negative = Literal::Double(-f64::NAN);
        let payload = Literal::Double(f64::from_bits(0x7ff8_0000_0000_0001));
        assert_eq!(negative, Literal::Double(f64::NAN));
        assert_eq!(payload, Literal::Double(f64::NAN));
        assert_eq!(hash_of(&negative), hash_of(&Literal::Double(f64::NAN)));
        assert_eq!(hash_of(&payload), hash_of(&Literal::Double(f64::NAN)));
        assert_ne!(negative, Literal::Double(f64::INFINITY));
    }

    #[test]
    fn test_term_roles() {
        let literal = Term::Literal(Literal::string("x"));
        assert!(matches!(
            literal.clone().into_subject(),
            Err(StoreError::UnsupportedTermKind { position: "subject", .. })
        ));
        assert!(matches!(
            literal.clone().into_context(),
            Err(StoreError::UnsupportedTermKind { position: "context", .. })
        ));
        assert!(matches!(
            Term::Anonymous(AnonymousEntity::new(3)).into_predicate(),
            Err(StoreError::UnsupportedTermKind { position: "predicate", .. })
        ));
        assert_eq!(literal.into_object(), Object::Literal(Literal::string("x")));
    }

    #[test]
    fn test_display_forms() {
        let iri = Iri::new("http://example.org/a").unwrap();
        assert_eq!(iri.to_string(), "<http://example.org/a>");
        assert_eq!(AnonymousEntity::new(7).to_string(), "_:7");
        assert_eq!(Literal::string("Alex").to_string(), "\"Alex\"");
        assert_eq!(Literal::lang("chat", "fr").unwrap().to_string(), "\"chat\"@fr");
        assert_eq!(Literal::Long(-42).to_string(), "-42");
        assert_eq!(Literal::Double(1.5).to_string(), "1.5e0");
        assert_eq!(
            Literal::typed("2024-01-01", Iri::new("http://www.w3.org/2001/XMLSchema#date").unwrap())
                .to_string(),
            "\"2024-01-01\"^^<http://www.w3.org/2001/XMLSchema#date>"
        );
    }
}
