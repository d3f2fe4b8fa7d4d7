// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compiler configuration.
//!
//! Defaults:
//! - combinator_key: `type`
//! - empty_any_of: match all (an empty disjunction collapses to the empty conjunction)
//! - error_policy: abort on the first malformed entry
//! - structural_fallback: on (named types without a converter are read as JSON)

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// What an `AnyOf` filter with no predicates compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyAnyOf {
    /// Collapse to an empty `AllOf`, which matches everything.
    #[default]
    MatchAll,
    /// Keep the empty `AnyOf`, which matches nothing.
    MatchNone,
}

/// How malformed filter entries are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// The first failing entry aborts compilation.
    #[default]
    Abort,
    /// Failing entries are dropped and reported as diagnostics.
    SkipInvalid,
}

/// Configuration for the filter compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Reserved parameter key selecting the combinator.
    pub combinator_key: String,
    pub empty_any_of: EmptyAnyOf,
    pub error_policy: ErrorPolicy,
    /// Convert named types without a registered converter structurally
    /// instead of failing.
    pub structural_fallback: bool,
}

impl CompilerConfig {
    pub fn validate(&self) -> Result<(), CompileError> {
        if self.combinator_key.trim().is_empty() {
            return Err(CompileError::InvalidConfig(
                "combinator_key must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            combinator_key: "type".to_string(),
            empty_any_of: EmptyAnyOf::MatchAll,
            error_policy: ErrorPolicy::Abort,
            structural_fallback: true,
        }
    }
}
