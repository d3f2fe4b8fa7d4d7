// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Path resolution.
//!
//! Walks a dotted filter key through the schema, starting at the root type.
//! Every association crossed becomes a [`PathSegment`] with a deterministic
//! alias (`person` → `person_orders` → `person_orders_lines`), so the same
//! traversal always lands on the same alias and joins can be de-duplicated
//! by alias alone.
//!
//! Embedded value types are walked inline: they do not change the alias, and
//! their property names are carried as a prefix until the next join or the
//! terminal property (`person.address.city` targets `person` / `address.city`).
//!
//! The first scalar (or non-traversable) property ends the walk; it and every
//! token after it form the terminal property name.

use serde::{Deserialize, Serialize};

use dynquery_schema::{canonical_alias, PropertyKind, SchemaProvider, TypeRef};

use crate::error::PathError;

/// How a segment was reached from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Single,
    Collection,
    Embedded,
}

impl RelationKind {
    pub fn requires_join(self) -> bool {
        matches!(self, RelationKind::Single | RelationKind::Collection)
    }
}

/// One traversal step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub property_name: String,
    /// Property chain from `parent_alias` to this segment, including any
    /// embedded properties crossed since the last join.
    pub property_path: String,
    /// Type the walk continues in (the element type for collections).
    pub declared_type: TypeRef,
    pub relation_kind: RelationKind,
    pub parent_alias: String,
    /// Equal to `parent_alias` for embedded segments.
    pub alias: String,
}

/// A fully resolved filter key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPath {
    pub root_alias: String,
    pub segments: Vec<PathSegment>,
    pub terminal_property: String,
    pub terminal_type: TypeRef,
}

impl ResolvedPath {
    /// Alias owning the terminal property, and the terminal property
    /// qualified by the embedded segments after the last join.
    pub fn target(&self) -> (&str, String) {
        let mut alias = self.root_alias.as_str();
        let mut prefix: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if segment.relation_kind.requires_join() {
                alias = segment.alias.as_str();
                prefix.clear();
            } else {
                prefix.push(segment.property_name.as_str());
            }
        }
        prefix.push(self.terminal_property.as_str());
        (alias, prefix.join("."))
    }

    /// Segments that need a join, in traversal order.
    pub fn join_segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments
            .iter()
            .filter(|s| s.relation_kind.requires_join())
    }
}

/// Resolve `key` against `root_type`.
pub fn resolve<S>(schema: &S, root_type: &str, key: &str) -> Result<ResolvedPath, PathError>
where
    S: SchemaProvider + ?Sized,
{
    let tokens: Vec<&str> = key
        .split('.')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let root_alias = canonical_alias(root_type);
    let mut current_type = root_type.to_string();
    let mut current_alias = root_alias.clone();
    // Embedded properties crossed since the last join.
    let mut embedded: Vec<&str> = Vec::new();
    let mut segments = Vec::new();

    for (idx, token) in tokens.iter().copied().enumerate() {
        let descriptor =
            schema
                .describe(&current_type, token)
                .ok_or_else(|| PathError::UnknownProperty {
                    owner: current_type.clone(),
                    property: token.to_string(),
                })?;

        let step = match descriptor.kind {
            PropertyKind::CollectionAssociation => descriptor
                .element_type
                .as_ref()
                .and_then(TypeRef::type_name)
                .filter(|name| {
                    schema
                        .type_class(name)
                        .is_some_and(|class| class.is_traversable())
                })
                .map(|name| (RelationKind::Collection, name.to_string())),
            PropertyKind::SingleAssociation => descriptor
                .declared_type
                .type_name()
                .map(|name| (RelationKind::Single, name.to_string())),
            PropertyKind::ValueType => descriptor
                .declared_type
                .type_name()
                .map(|name| (RelationKind::Embedded, name.to_string())),
            PropertyKind::Scalar => None,
        };

        let Some((relation_kind, next_type)) = step else {
            return Ok(ResolvedPath {
                root_alias,
                segments,
                terminal_property: tokens[idx..].join("."),
                terminal_type: descriptor.declared_type,
            });
        };

        embedded.push(token);
        let property_path = embedded.join(".");
        let alias = if relation_kind.requires_join() {
            format!("{}_{}", current_alias, embedded.join("_"))
        } else {
            current_alias.clone()
        };

        segments.push(PathSegment {
            property_name: token.to_string(),
            property_path,
            declared_type: TypeRef::Named(next_type.clone()),
            relation_kind,
            parent_alias: current_alias.clone(),
            alias: alias.clone(),
        });

        if relation_kind.requires_join() {
            current_alias = alias;
            embedded.clear();
        }
        current_type = next_type;
    }

    Err(PathError::NoTerminalProperty {
        key: key.to_string(),
    })
}
