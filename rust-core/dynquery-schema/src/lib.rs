// SPDX-License-Identifier: PMPL-1.0-or-later
//! DynQuery Schema
//!
//! Statically declared type metadata for the DynQuery filter compiler.
//! The compiler never inspects domain types at runtime; it asks a
//! [`SchemaProvider`] how a property of a named type is classified, and the
//! provider answers from an immutable table built once at startup.

pub mod error;
pub mod provider;
pub mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use error::SchemaError;
pub use provider::SchemaProvider;
pub use registry::{
    PropertyDefinition, SchemaDefinition, SchemaRegistry, SchemaRegistryBuilder, TypeBuilder,
    TypeDefinition,
};

/// Scalar kinds with a built-in literal conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Integer,
    Long,
    Decimal,
    Boolean,
    Double,
    Float,
    Short,
    Byte,
    Char,
    Date,
    DateTime,
}

impl ScalarKind {
    /// Every scalar kind in declaration order.
    pub const ALL: [ScalarKind; 12] = [
        ScalarKind::String,
        ScalarKind::Integer,
        ScalarKind::Long,
        ScalarKind::Decimal,
        ScalarKind::Boolean,
        ScalarKind::Double,
        ScalarKind::Float,
        ScalarKind::Short,
        ScalarKind::Byte,
        ScalarKind::Char,
        ScalarKind::Date,
        ScalarKind::DateTime,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Long => "long",
            ScalarKind::Decimal => "decimal",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Double => "double",
            ScalarKind::Float => "float",
            ScalarKind::Short => "short",
            ScalarKind::Byte => "byte",
            ScalarKind::Char => "char",
            ScalarKind::Date => "date",
            ScalarKind::DateTime => "date_time",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        ScalarKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lowered)
            .ok_or_else(|| format!("unknown scalar kind: {}", s))
    }
}

/// A declared property type.
///
/// `Named` types are looked up in the schema: aggregates become joins,
/// value types are walked inline, anything else is a terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Scalar(ScalarKind),
    Named(String),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    /// The registry name for `Named`, `None` otherwise.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(kind) => write!(f, "{}", kind),
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::List(inner) => write!(f, "list<{}>", inner),
        }
    }
}

/// How a registered named type is tagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeClass {
    /// Has its own identity; reaching it requires a join.
    Aggregate,
    /// Embedded inline in its owner; no join.
    Value,
    /// Closed set of string constants; behaves as a scalar.
    Enumeration { variants: Vec<String> },
}

impl TypeClass {
    /// Whether a path may continue through a property of this class.
    pub fn is_traversable(&self) -> bool {
        matches!(self, TypeClass::Aggregate | TypeClass::Value)
    }
}

/// Classification of a single property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Scalar,
    ValueType,
    SingleAssociation,
    CollectionAssociation,
}

/// What the schema knows about one property of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub declared_type: TypeRef,
    pub kind: PropertyKind,
    /// Present only for [`PropertyKind::CollectionAssociation`].
    pub element_type: Option<TypeRef>,
}

/// Canonical alias of a type: its simple name with the first letter lower-cased.
///
/// Qualified names are cut at the last `.` or `::`, so `crm::Person` and
/// `com.acme.Person` both yield `person`.
pub fn canonical_alias(type_name: &str) -> String {
    let simple = type_name
        .rsplit("::")
        .next()
        .and_then(|s| s.rsplit('.').next())
        .unwrap_or(type_name);

    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_alias_simple_name() {
        assert_eq!(canonical_alias("Person"), "person");
        assert_eq!(canonical_alias("OrderLine"), "orderLine");
    }

    #[test]
    fn test_canonical_alias_qualified_names() {
        assert_eq!(canonical_alias("com.acme.Person"), "person");
        assert_eq!(canonical_alias("crm::model::Person"), "person");
    }

    #[test]
    fn test_canonical_alias_empty() {
        assert_eq!(canonical_alias(""), "");
    }

    #[test]
    fn test_scalar_kind_display_roundtrip() {
        for kind in ScalarKind::ALL {
            let parsed: ScalarKind = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn test_scalar_kind_case_insensitive_parse() {
        assert_eq!("LONG".parse::<ScalarKind>().unwrap(), ScalarKind::Long);
        assert_eq!("Date_Time".parse::<ScalarKind>().unwrap(), ScalarKind::DateTime);
        assert!("uuid".parse::<ScalarKind>().is_err());
    }

    #[test]
    fn test_type_ref_serde_shape() {
        let ty = TypeRef::list(TypeRef::named("Order"));
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, r#"{"list":{"named":"Order"}}"#);

        let parsed: TypeRef = serde_json::from_str(r#"{"scalar":"date_time"}"#).unwrap();
        assert_eq!(parsed, TypeRef::Scalar(ScalarKind::DateTime));
    }

    #[test]
    fn test_type_ref_display() {
        assert_eq!(TypeRef::Scalar(ScalarKind::Long).to_string(), "long");
        assert_eq!(
            TypeRef::list(TypeRef::Scalar(ScalarKind::String)).to_string(),
            "list<string>"
        );
    }

    #[test]
    fn test_enumeration_not_traversable() {
        let class = TypeClass::Enumeration {
            variants: vec!["ACTIVE".to_string()],
        };
        assert!(!class.is_traversable());
        assert!(TypeClass::Aggregate.is_traversable());
        assert!(TypeClass::Value.is_traversable());
    }
}
