// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compiler error types.
//!
//! Each stage has its own error; [`CompileError`] wraps them together with
//! the raw key (and value) of the entry that failed.

use thiserror::Error;

use crate::grammar::{Arity, OperatorKind};

/// Failures while walking a dotted key through the schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("unknown property '{property}' on type '{owner}'")]
    UnknownProperty { owner: String, property: String },

    #[error("path '{key}' has no terminal property; the final property must be a simple field")]
    NoTerminalProperty { key: String },
}

/// Failures while parsing an `OPERATOR(args)` expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("invalid predicate or cannot find operator: {expression}")]
    MissingOperator { expression: String },

    #[error("invalid predicate or no closing parenthesis at the end: {expression}")]
    MissingClosingParen { expression: String },

    #[error("invalid operator '{operator}' for predicate: {expression}")]
    UnknownOperator { operator: String, expression: String },
}

/// Failures while converting a raw argument to the terminal type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("cannot convert '{value}' to {target}: {reason}")]
    InvalidLiteral {
        value: String,
        target: String,
        reason: String,
    },

    #[error("no converter registered for type {target} (value '{value}')")]
    NoConverter { value: String, target: String },
}

/// Any failure that aborts (or, under a skip policy, drops) a filter entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("filter key '{key}': {source}")]
    Path {
        key: String,
        #[source]
        source: PathError,
    },

    #[error("filter '{key}={value}': {source}")]
    Grammar {
        key: String,
        value: String,
        #[source]
        source: GrammarError,
    },

    #[error("filter '{key}={value}': {source}")]
    Coercion {
        key: String,
        value: String,
        #[source]
        source: CoercionError,
    },

    #[error("filter '{key}={value}': operator {operator} expects {expected} argument(s), got {actual}")]
    Arity {
        key: String,
        value: String,
        operator: OperatorKind,
        expected: Arity,
        actual: usize,
    },

    #[error("filter key '{key}': alias '{alias}' already joins {existing}, cannot also join {requested}")]
    AliasConflict {
        key: String,
        alias: String,
        existing: String,
        requested: String,
    },

    #[error("unknown combinator '{0}' (expected allOf or anyOf)")]
    UnknownCombinator(String),

    #[error("unknown root type: {0}")]
    UnknownRootType(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CompileError {
    /// The raw filter key this error was raised for, if it concerns a single entry.
    pub fn key(&self) -> Option<&str> {
        match self {
            CompileError::Path { key, .. }
            | CompileError::Grammar { key, .. }
            | CompileError::Coercion { key, .. }
            | CompileError::Arity { key, .. }
            | CompileError::AliasConflict { key, .. } => Some(key),
            CompileError::UnknownCombinator(_)
            | CompileError::UnknownRootType(_)
            | CompileError::InvalidConfig(_) => None,
        }
    }
}
