// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compiled predicate tree and join set.
//!
//! These are the two outputs handed to the execution layer. Both render
//! through `Display` for logging, e.g.
//! `anyOf(person.status EQ ['ACTIVE'], person_orders.total GT [10])`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use dynquery_schema::TypeRef;

use crate::error::CompileError;
use crate::grammar::OperatorKind;
use crate::path::{PathSegment, RelationKind, ResolvedPath};
use crate::value::{write_list, TypedValue};

/// Top-level boolean connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CombinatorKind {
    #[default]
    AllOf,
    AnyOf,
}

impl CombinatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CombinatorKind::AllOf => "allOf",
            CombinatorKind::AnyOf => "anyOf",
        }
    }
}

impl fmt::Display for CombinatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CombinatorKind {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("allof") {
            Ok(CombinatorKind::AllOf)
        } else if s.eq_ignore_ascii_case("anyof") {
            Ok(CombinatorKind::AnyOf)
        } else {
            Err(CompileError::UnknownCombinator(s.to_string()))
        }
    }
}

/// One filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicPredicate {
    pub path: ResolvedPath,
    pub operator: OperatorKind,
    pub values: Vec<TypedValue>,
}

impl AtomicPredicate {
    pub fn terminal_property(&self) -> &str {
        &self.path.terminal_property
    }

    pub fn terminal_type(&self) -> &TypeRef {
        &self.path.terminal_type
    }

    /// Operand of a set-membership predicate.
    pub fn list_values(&self) -> Option<&[TypedValue]> {
        match self.values.as_slice() {
            [single] => single.as_list(),
            _ => None,
        }
    }
}

impl fmt::Display for AtomicPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (alias, property) = self.path.target();
        write!(f, "{}.{} {} ", alias, property, self.operator)?;
        match self.list_values() {
            Some(items) => write_list(f, items),
            None => write_list(f, &self.values),
        }
    }
}

/// Atomic predicates under one combinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateTree {
    pub combinator: CombinatorKind,
    pub predicates: Vec<AtomicPredicate>,
}

impl PredicateTree {
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Truth value of an empty tree: `AllOf` is vacuously true, `AnyOf`
    /// vacuously false. `None` when the tree has predicates.
    pub fn vacuous_truth(&self) -> Option<bool> {
        if !self.is_empty() {
            return None;
        }
        Some(self.combinator == CombinatorKind::AllOf)
    }
}

impl fmt::Display for PredicateTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.combinator)?;
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", predicate)?;
        }
        f.write_str(")")
    }
}

/// Join relation as seen by the execution layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Single,
    Collection,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Single => f.write_str("single"),
            JoinKind::Collection => f.write_str("collection"),
        }
    }
}

/// One required relation traversal, unique by `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinSpec {
    pub alias: String,
    pub relation_kind: JoinKind,
    pub parent_alias: String,
    /// Property on `parent_alias`; dotted when it sits inside an embedded value.
    pub property_name: String,
}

impl JoinSpec {
    /// The join a segment implies. Embedded segments imply none.
    pub fn from_segment(segment: &PathSegment) -> Option<JoinSpec> {
        let relation_kind = match segment.relation_kind {
            RelationKind::Single => JoinKind::Single,
            RelationKind::Collection => JoinKind::Collection,
            RelationKind::Embedded => return None,
        };
        Some(JoinSpec {
            alias: segment.alias.clone(),
            relation_kind,
            parent_alias: segment.parent_alias.clone(),
            property_name: segment.property_path.clone(),
        })
    }
}

impl fmt::Display for JoinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} join {}.{} as {}",
            self.relation_kind, self.parent_alias, self.property_name, self.alias
        )
    }
}

/// Result of one compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledFilter {
    pub tree: PredicateTree,
    /// In discovery order.
    pub joins: Vec<JoinSpec>,
    /// Entries dropped under [`ErrorPolicy::SkipInvalid`](crate::ErrorPolicy::SkipInvalid).
    #[serde(skip)]
    pub diagnostics: Vec<CompileError>,
}

impl CompiledFilter {
    pub fn join(&self, alias: &str) -> Option<&JoinSpec> {
        self.joins.iter().find(|join| join.alias == alias)
    }
}
