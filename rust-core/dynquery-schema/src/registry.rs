// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Immutable schema registry.
//!
//! The registry is the explicit classification table the compiler walks
//! instead of scanning domain types. It is assembled once, either through
//! [`SchemaRegistry::builder`] or from a declarative JSON document via
//! [`SchemaRegistry::from_json`], and never changes afterwards.
//!
//! Property classification is computed at build time:
//!
//! | Declared type                     | Kind                      |
//! |-----------------------------------|---------------------------|
//! | `scalar`                          | `Scalar`                  |
//! | `named` → registered aggregate    | `SingleAssociation`       |
//! | `named` → registered value type   | `ValueType`               |
//! | `named` → enumeration / unknown   | `Scalar`                  |
//! | `list`                            | `CollectionAssociation`   |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SchemaError;
use crate::provider::SchemaProvider;
use crate::{PropertyDescriptor, PropertyKind, ScalarKind, TypeClass, TypeRef};

// ---------------------------------------------------------------------------
// Declarative definition
// ---------------------------------------------------------------------------

/// Serializable schema table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub types: Vec<TypeDefinition>,
}

/// One named type and its properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    pub class: TypeClass,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

/// One declared property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Built, read-only schema table.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    classes: HashMap<String, TypeClass>,
    properties: HashMap<String, HashMap<String, PropertyDescriptor>>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Parse a JSON schema table and build a registry from it.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let definition: SchemaDefinition = serde_json::from_str(json)?;
        Self::from_definition(definition)
    }

    /// Validate a definition and classify every property.
    pub fn from_definition(definition: SchemaDefinition) -> Result<Self, SchemaError> {
        let mut classes = HashMap::with_capacity(definition.types.len());
        for ty in &definition.types {
            if ty.name.trim().is_empty() {
                return Err(SchemaError::EmptyName("type name".to_string()));
            }
            if classes.insert(ty.name.clone(), ty.class.clone()).is_some() {
                return Err(SchemaError::DuplicateType(ty.name.clone()));
            }
        }

        let mut properties = HashMap::with_capacity(definition.types.len());
        for ty in definition.types {
            let mut described: HashMap<String, PropertyDescriptor> =
                HashMap::with_capacity(ty.properties.len());
            for prop in ty.properties {
                if prop.name.trim().is_empty() {
                    return Err(SchemaError::EmptyName(format!(
                        "property name on type '{}'",
                        ty.name
                    )));
                }
                if described.contains_key(&prop.name) {
                    return Err(SchemaError::DuplicateProperty {
                        owner: ty.name.clone(),
                        property: prop.name,
                    });
                }
                let descriptor = classify(prop.name.clone(), prop.ty, &classes);
                described.insert(prop.name, descriptor);
            }
            properties.insert(ty.name, described);
        }

        debug!(types = classes.len(), "Schema registry built");

        Ok(Self {
            classes,
            properties,
        })
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterate over registered enumeration types and their variants.
    pub fn enumerations(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.classes.iter().filter_map(|(name, class)| match class {
            TypeClass::Enumeration { variants } => Some((name.as_str(), variants.as_slice())),
            _ => None,
        })
    }
}

fn classify(
    name: String,
    declared_type: TypeRef,
    classes: &HashMap<String, TypeClass>,
) -> PropertyDescriptor {
    let (kind, element_type) = match &declared_type {
        TypeRef::Scalar(_) => (PropertyKind::Scalar, None),
        TypeRef::List(inner) => (PropertyKind::CollectionAssociation, Some((**inner).clone())),
        TypeRef::Named(type_name) => match classes.get(type_name) {
            Some(TypeClass::Aggregate) => (PropertyKind::SingleAssociation, None),
            Some(TypeClass::Value) => (PropertyKind::ValueType, None),
            Some(TypeClass::Enumeration { .. }) | None => (PropertyKind::Scalar, None),
        },
    };

    PropertyDescriptor {
        name,
        declared_type,
        kind,
        element_type,
    }
}

impl SchemaProvider for SchemaRegistry {
    fn describe(&self, owner: &str, property: &str) -> Option<PropertyDescriptor> {
        self.properties.get(owner)?.get(property).cloned()
    }

    fn type_class(&self, type_name: &str) -> Option<TypeClass> {
        self.classes.get(type_name).cloned()
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Fluent construction of a [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    types: Vec<TypeDefinition>,
}

impl SchemaRegistryBuilder {
    /// Declare an aggregate type.
    pub fn aggregate(self, name: &str, props: impl FnOnce(TypeBuilder) -> TypeBuilder) -> Self {
        self.declare(name, TypeClass::Aggregate, props)
    }

    /// Declare an embedded value type.
    pub fn value(self, name: &str, props: impl FnOnce(TypeBuilder) -> TypeBuilder) -> Self {
        self.declare(name, TypeClass::Value, props)
    }

    /// Declare an enumeration with its constants.
    pub fn enumeration<I, S>(mut self, name: &str, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.push(TypeDefinition {
            name: name.to_string(),
            class: TypeClass::Enumeration {
                variants: variants.into_iter().map(Into::into).collect(),
            },
            properties: Vec::new(),
        });
        self
    }

    fn declare(
        mut self,
        name: &str,
        class: TypeClass,
        props: impl FnOnce(TypeBuilder) -> TypeBuilder,
    ) -> Self {
        let built = props(TypeBuilder::default());
        self.types.push(TypeDefinition {
            name: name.to_string(),
            class,
            properties: built.properties,
        });
        self
    }

    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        SchemaRegistry::from_definition(SchemaDefinition { types: self.types })
    }
}

/// Property list of one type under construction.
#[derive(Debug, Default)]
pub struct TypeBuilder {
    properties: Vec<PropertyDefinition>,
}

impl TypeBuilder {
    pub fn property(mut self, name: &str, ty: TypeRef) -> Self {
        self.properties.push(PropertyDefinition {
            name: name.to_string(),
            ty,
        });
        self
    }

    pub fn scalar(self, name: &str, kind: ScalarKind) -> Self {
        self.property(name, TypeRef::Scalar(kind))
    }

    /// Property whose type is another named type (aggregate, value or enumeration).
    pub fn named(self, name: &str, type_name: &str) -> Self {
        self.property(name, TypeRef::named(type_name))
    }

    /// Collection of another named type.
    pub fn collection(self, name: &str, element_type: &str) -> Self {
        self.property(name, TypeRef::list(TypeRef::named(element_type)))
    }

    /// Collection of scalars.
    pub fn scalar_list(self, name: &str, kind: ScalarKind) -> Self {
        self.property(name, TypeRef::list(TypeRef::Scalar(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .aggregate("Person", |t| {
                t.scalar("name", ScalarKind::String)
                    .named("address", "Address")
                    .named("employer", "Company")
                    .collection("orders", "Order")
                    .scalar_list("tags", ScalarKind::String)
                    .named("status", "Status")
                    .named("metadata", "Blob")
            })
            .value("Address", |t| t.scalar("city", ScalarKind::String))
            .aggregate("Company", |t| t.scalar("name", ScalarKind::String))
            .aggregate("Order", |t| t.scalar("total", ScalarKind::Decimal))
            .enumeration("Status", ["ACTIVE", "INACTIVE"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_classification_table() {
        let registry = sample_registry();
        let kind = |prop: &str| registry.describe("Person", prop).unwrap().kind;

        assert_eq!(kind("name"), PropertyKind::Scalar);
        assert_eq!(kind("address"), PropertyKind::ValueType);
        assert_eq!(kind("employer"), PropertyKind::SingleAssociation);
        assert_eq!(kind("orders"), PropertyKind::CollectionAssociation);
        assert_eq!(kind("tags"), PropertyKind::CollectionAssociation);
        assert_eq!(kind("status"), PropertyKind::Scalar);
        // Unregistered named types are terminals.
        assert_eq!(kind("metadata"), PropertyKind::Scalar);
    }

    #[test]
    fn test_element_type_only_for_collections() {
        let registry = sample_registry();
        let orders = registry.describe("Person", "orders").unwrap();
        assert_eq!(orders.element_type, Some(TypeRef::named("Order")));

        let employer = registry.describe("Person", "employer").unwrap();
        assert!(employer.element_type.is_none());
    }

    #[test]
    fn test_unknown_owner_or_property() {
        let registry = sample_registry();
        assert!(registry.describe("Person", "bogus").is_none());
        assert!(registry.describe("Ghost", "name").is_none());
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let result = SchemaRegistry::builder()
            .aggregate("Person", |t| t)
            .value("Person", |t| t)
            .build();
        assert!(matches!(result, Err(SchemaError::DuplicateType(name)) if name == "Person"));
    }

    #[test]
    fn test_duplicate_property_rejected() {
        let result = SchemaRegistry::builder()
            .aggregate("Person", |t| {
                t.scalar("name", ScalarKind::String)
                    .scalar("name", ScalarKind::Long)
            })
            .build();
        assert!(matches!(
            result,
            Err(SchemaError::DuplicateProperty { ref owner, ref property })
                if owner == "Person" && property == "name"
        ));
    }

    #[test]
    fn test_empty_type_name_rejected() {
        let result = SchemaRegistry::builder().aggregate(" ", |t| t).build();
        assert!(matches!(result, Err(SchemaError::EmptyName(_))));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "types": [
                {
                    "name": "Person",
                    "class": "aggregate",
                    "properties": [
                        { "name": "age", "type": { "scalar": "integer" } },
                        { "name": "address", "type": { "named": "Address" } },
                        { "name": "orders", "type": { "list": { "named": "Order" } } }
                    ]
                },
                { "name": "Address", "class": "value" },
                { "name": "Order", "class": "aggregate" },
                { "name": "Status", "class": { "enumeration": { "variants": ["A", "B"] } } }
            ]
        }"#;

        let registry = SchemaRegistry::from_json(json).unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.describe("Person", "address").unwrap().kind,
            PropertyKind::ValueType
        );
        assert_eq!(
            registry.describe("Person", "orders").unwrap().kind,
            PropertyKind::CollectionAssociation
        );
        assert_eq!(registry.type_class("Order"), Some(TypeClass::Aggregate));

        let enums: Vec<_> = registry.enumerations().collect();
        assert_eq!(enums.len(), 1);
        assert_eq!(enums[0].0, "Status");
    }

    #[test]
    fn test_from_json_malformed() {
        let result = SchemaRegistry::from_json(r#"{"types": [{"name": "X"}]}"#);
        assert!(matches!(result, Err(SchemaError::Parse(_))));
    }

    #[test]
    fn test_provider_through_arc() {
        let registry = std::sync::Arc::new(sample_registry());
        fn lookup<P: SchemaProvider>(provider: P) -> Option<PropertyDescriptor> {
            provider.describe("Order", "total")
        }
        assert!(lookup(registry.clone()).is_some());
        assert!(lookup(&*registry).is_some());
    }
}
