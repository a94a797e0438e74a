//! Value types exposed to callers: terms, statements and patterns

pub mod statement;
pub mod term;

pub use statement::{QuadPattern, Statement};
pub use term::{xsd, AnonymousEntity, Context, Entity, Iri, Literal, Object, Predicate, Term};
