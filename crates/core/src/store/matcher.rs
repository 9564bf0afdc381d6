// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Matcher trees for selecting store contents.
//!
//! A matcher is a boolean predicate over store entities. Evaluating a
//! matcher against an entity of an incompatible kind is an error; the
//! logical operators treat such errors as no-match, while a top-level
//! evaluation surfaces them.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::store::entity::{EntityKind, ObjRef};
use crate::time::Timestamp;

/// Predicate on a name: literal case-insensitive equality and/or a
/// case-insensitive regex. When both are present, both must match. An
/// empty predicate matches everything.
#[derive(Debug, Clone, Default)]
pub struct NamePattern {
    literal: Option<String>,
    regex: Option<Regex>,
}

impl NamePattern {
    pub fn new(literal: Option<&str>, regex: Option<&str>) -> Result<Self, regex::Error> {
        let regex = match regex {
            Some(pattern) => Some(RegexBuilder::new(pattern).case_insensitive(true).build()?),
            None => None,
        };
        Ok(NamePattern { literal: literal.map(str::to_string), regex })
    }

    /// Predicate matching everything.
    pub fn any() -> Self {
        NamePattern::default()
    }

    pub fn literal(name: &str) -> Self {
        NamePattern { literal: Some(name.to_string()), regex: None }
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        NamePattern::new(None, Some(pattern))
    }

    pub fn matches(&self, name: &str) -> bool {
        if let Some(literal) = &self.literal {
            if !literal.eq_ignore_ascii_case(name) {
                return false;
            }
        }
        if let Some(regex) = &self.regex {
            if !regex.is_match(name) {
                return false;
            }
        }
        true
    }
}

/// Matches attributes by name and by the unquoted string form of their
/// value.
#[derive(Debug, Clone, Default)]
pub struct AttrMatcher {
    pub name: NamePattern,
    pub value: NamePattern,
}

impl AttrMatcher {
    fn matches(&self, attr: &crate::store::entity::Attribute) -> bool {
        self.name.matches(&attr.name) && self.value.matches(&attr.value.unquoted())
    }
}

/// Matches services by name, optionally requiring at least one matching
/// attribute.
#[derive(Debug, Clone, Default)]
pub struct ServiceMatcher {
    pub name: NamePattern,
    pub attr: Option<AttrMatcher>,
}

impl ServiceMatcher {
    fn matches(&self, service: &crate::store::entity::Service) -> bool {
        if !self.name.matches(&service.name) {
            return false;
        }
        match &self.attr {
            None => true,
            Some(attr) => service.attributes.values().any(|a| attr.matches(a)),
        }
    }
}

/// Matches hosts by name, optionally requiring at least one matching
/// service and/or at least one matching host attribute.
#[derive(Debug, Clone, Default)]
pub struct HostMatcher {
    pub name: NamePattern,
    pub service: Option<ServiceMatcher>,
    pub attr: Option<AttrMatcher>,
}

impl HostMatcher {
    fn matches(&self, host: &crate::store::entity::Host) -> bool {
        if !self.name.matches(&host.name) {
            return false;
        }
        if let Some(service) = &self.service {
            if !host.services.values().any(|s| service.matches(s)) {
                return false;
            }
        }
        match &self.attr {
            None => true,
            Some(attr) => host.attributes.values().any(|a| attr.matches(a)),
        }
    }
}

/// Entity field a [`FieldMatcher`] compares against.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Name(String),
    LastUpdate(Timestamp),
}

/// Comparison operator for field matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl CmpOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ge => ordering != Ordering::Less,
            CmpOp::Gt => ordering == Ordering::Greater,
        }
    }
}

/// Compares an entity field against a constant. Applies to every entity
/// kind; this is the shape parsed query filters arrive in.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatcher {
    pub field: Field,
    pub op: CmpOp,
}

impl FieldMatcher {
    fn matches(&self, obj: ObjRef<'_>) -> bool {
        let ordering = match &self.field {
            Field::Name(name) => {
                obj.name().to_lowercase().cmp(&name.to_lowercase())
            }
            Field::LastUpdate(ts) => obj.last_update().cmp(ts),
        };
        self.op.accepts(ordering)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("cannot apply a {matcher} matcher to a {obj}")]
    TypeMismatch { matcher: EntityKind, obj: EntityKind },
}

/// A matcher tree.
#[derive(Debug, Clone)]
pub enum Matcher {
    Host(HostMatcher),
    Service(ServiceMatcher),
    Attr(AttrMatcher),
    Field(FieldMatcher),
    And(Box<Matcher>, Box<Matcher>),
    Or(Box<Matcher>, Box<Matcher>),
}

impl Matcher {
    pub fn and(left: Matcher, right: Matcher) -> Matcher {
        Matcher::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Matcher, right: Matcher) -> Matcher {
        Matcher::Or(Box::new(left), Box::new(right))
    }

    pub fn field(field: Field, op: CmpOp) -> Matcher {
        Matcher::Field(FieldMatcher { field, op })
    }

    /// Evaluate this matcher against an entity.
    pub fn evaluate(&self, obj: ObjRef<'_>) -> Result<bool, MatchError> {
        match self {
            Matcher::And(left, right) => {
                // Lazy evaluation; a type error on either side is no-match.
                Ok(left.evaluate(obj).unwrap_or(false) && right.evaluate(obj).unwrap_or(false))
            }
            Matcher::Or(left, right) => {
                Ok(left.evaluate(obj).unwrap_or(false) || right.evaluate(obj).unwrap_or(false))
            }
            Matcher::Field(m) => Ok(m.matches(obj)),
            Matcher::Host(m) => match obj {
                ObjRef::Host(host) => Ok(m.matches(host)),
                _ => Err(MatchError::TypeMismatch { matcher: EntityKind::Host, obj: obj.kind() }),
            },
            Matcher::Service(m) => match obj {
                ObjRef::Service(service) => Ok(m.matches(service)),
                _ => {
                    Err(MatchError::TypeMismatch { matcher: EntityKind::Service, obj: obj.kind() })
                }
            },
            Matcher::Attr(m) => match obj {
                ObjRef::Attribute(attr) => Ok(m.matches(attr)),
                _ => Err(MatchError::TypeMismatch {
                    matcher: EntityKind::Attribute,
                    obj: obj.kind(),
                }),
            },
        }
    }

    /// Null-safe evaluation: a missing matcher matches everything, and an
    /// evaluation error counts as no-match.
    pub fn accepts(matcher: Option<&Matcher>, obj: ObjRef<'_>) -> bool {
        matcher.map_or(true, |m| m.evaluate(obj).unwrap_or(false))
    }
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
