// SPDX-License-Identifier: PMPL-1.0-or-later
//! Schema registry error types.

use thiserror::Error;

/// Errors raised while building a [`SchemaRegistry`](crate::SchemaRegistry).
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("type declared twice: {0}")]
    DuplicateType(String),

    #[error("property '{property}' declared twice on type '{owner}'")]
    DuplicateProperty { owner: String, property: String },

    #[error("empty name: {0}")]
    EmptyName(String),

    #[error("malformed schema definition: {0}")]
    Parse(#[from] serde_json::Error),
}
