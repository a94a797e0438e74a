//! Statements (quads) and the patterns used to match them

use super::term::{Context, Entity, Object, Predicate, Term};
use crate::error::Result;
use std::fmt::{self, Display};

/// A `(subject, predicate, object, context)` quad
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    /// Subject entity
    pub subject: Entity,
    /// Predicate
    pub predicate: Predicate,
    /// Object
    pub object: Object,
    /// Graph the statement belongs to
    pub context: Context,
}

impl Statement {
    /// Create a new statement
    pub fn new(
        subject: impl Into<Entity>,
        predicate: impl Into<Predicate>,
        object: impl Into<Object>,
        context: Context,
    ) -> Self {
        Statement {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            context,
        }
    }

    /// Build a statement from role-less terms; `None` context is the default graph
    pub fn from_terms(
        subject: Term,
        predicate: Term,
        object: Term,
        context: Option<Term>,
    ) -> Result<Self> {
        Ok(Statement {
            subject: subject.into_subject()?,
            predicate: predicate.into_predicate()?,
            object: object.into_object(),
            context: match context {
                Some(term) => term.into_context()?,
                None => Context::Default,
            },
        })
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        match &self.context {
            Context::Default => f.write_str(" ."),
            Context::Named(graph) => write!(f, " {graph} ."),
        }
    }
}

/// Quad pattern; `None` fields are wildcards
///
/// A bound context of [`Context::Default`] matches only statements in the
/// default graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadPattern {
    /// Bound subject
    pub subject: Option<Entity>,
    /// Bound predicate
    pub predicate: Option<Predicate>,
    /// Bound object
    pub object: Option<Object>,
    /// Bound context
    pub context: Option<Context>,
}

impl QuadPattern {
    /// Pattern with every field unbound
    pub fn any() -> Self {
        QuadPattern::default()
    }

    /// Bind the subject
    pub fn with_subject(mut self, subject: impl Into<Entity>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Bind the predicate
    pub fn with_predicate(mut self, predicate: impl Into<Predicate>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    /// Bind the object
    pub fn with_object(mut self, object: impl Into<Object>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Bind the context
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Whether a materialised statement satisfies this pattern
    pub fn matches(&self, statement: &Statement) -> bool {
        self.subject.as_ref().map_or(true, |s| *s == statement.subject)
            && self
                .predicate
                .as_ref()
                .map_or(true, |p| *p == statement.predicate)
            && self.object.as_ref().map_or(true, |o| *o == statement.object)
            && self.context.as_ref().map_or(true, |c| *c == statement.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Iri, Literal};

    #[test]
    fn test_statement_from_terms() -> Result<()> {
        let statement = Statement::from_terms(
            Term::Iri(Iri::new("http://x/7")?),
            Term::Iri(Iri::new("http://x/name")?),
            Term::Literal(Literal::string("Alex")),
            None,
        )?;
        assert_eq!(statement.context, Context::Default);
        assert_eq!(
            statement.to_string(),
            "<http://x/7> <http://x/name> \"Alex\" ."
        );

        let bad = Statement::from_terms(
            Term::Literal(Literal::string("Alex")),
            Term::Iri(Iri::new("http://x/name")?),
            Term::Literal(Literal::string("Alex")),
            None,
        );
        assert!(bad.is_err());
        Ok(())
    }

    #[test]
    fn test_pattern_matches() -> Result<()> {
        let statement = Statement::new(
            Entity::iri("http://x/7")?,
            Predicate::iri("http://x/name")?,
            Literal::string("Alex"),
            Context::named(Entity::iri("http://g")?),
        );
        assert!(QuadPattern::any().matches(&statement));
        assert!(QuadPattern::any()
            .with_context(Context::named(Entity::iri("http://g")?))
            .matches(&statement));
        assert!(!QuadPattern::any()
            .with_context(Context::Default)
            .matches(&statement));
        assert!(!QuadPattern::any()
            .with_object(Literal::string("Bob"))
            .matches(&statement));
        Ok(())
    }
}
