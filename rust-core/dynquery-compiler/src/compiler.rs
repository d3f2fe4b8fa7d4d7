// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Predicate and join assembly.
//!
//! [`FilterCompiler`] drives one pass over a [`QueryParameters`] map:
//!
//! 1. The combinator key selects `allOf` / `anyOf` and takes no further part.
//! 2. Entries with a blank key or value are skipped.
//! 3. Each remaining entry is resolved, parsed, arity-checked and coerced
//!    into an [`AtomicPredicate`].
//! 4. Every association crossed by a successful entry contributes a
//!    [`JoinSpec`], first occurrence per alias wins. An entry that would
//!    reuse an alias for a different relation is rejected.
//!
//! All accumulators are local to the call; a compiler can be shared across
//! threads and used concurrently.

use indexmap::IndexMap;
use tracing::{debug, instrument, trace, warn};

use dynquery_schema::{SchemaProvider, SchemaRegistry};

use crate::coerce::ValueCoercer;
use crate::config::{CompilerConfig, EmptyAnyOf, ErrorPolicy};
use crate::error::CompileError;
use crate::grammar;
use crate::params::QueryParameters;
use crate::path;
use crate::predicate::{
    AtomicPredicate, CombinatorKind, CompiledFilter, JoinSpec, PredicateTree,
};

/// Compiles filter maps against one schema.
#[derive(Debug, Clone)]
pub struct FilterCompiler<S> {
    schema: S,
    coercer: ValueCoercer,
    config: CompilerConfig,
}

impl<S: SchemaProvider> FilterCompiler<S> {
    /// A compiler with the default configuration. Enumerations come from
    /// the schema; no caller converters are registered.
    pub fn new(schema: S) -> Self {
        let config = CompilerConfig::default();
        Self {
            schema,
            coercer: ValueCoercer::new().with_structural_fallback(config.structural_fallback),
            config,
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Result<Self, CompileError> {
        config.validate()?;
        self.coercer = self
            .coercer
            .with_structural_fallback(config.structural_fallback);
        self.config = config;
        Ok(self)
    }

    /// Replace the value coercer. The configured structural fallback is
    /// applied on top of it.
    pub fn with_coercer(mut self, coercer: ValueCoercer) -> Self {
        self.coercer = coercer.with_structural_fallback(self.config.structural_fallback);
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Compile `params` against `root_type`.
    #[instrument(skip(self, params), fields(entries = params.len()))]
    pub fn compile(
        &self,
        root_type: &str,
        params: &QueryParameters,
    ) -> Result<CompiledFilter, CompileError> {
        if self.schema.type_class(root_type).is_none() {
            return Err(CompileError::UnknownRootType(root_type.to_string()));
        }

        let combinator = match params.get(&self.config.combinator_key) {
            Some(value) if !value.trim().is_empty() => value.trim().parse::<CombinatorKind>()?,
            _ => CombinatorKind::AllOf,
        };

        let mut predicates = Vec::new();
        let mut joins: IndexMap<String, JoinSpec> = IndexMap::new();
        let mut diagnostics = Vec::new();

        for (key, value) in params.iter() {
            if key == self.config.combinator_key {
                continue;
            }
            if key.trim().is_empty() || value.trim().is_empty() {
                trace!(key = %key, "skipping blank filter entry");
                continue;
            }

            let compiled = self
                .compile_entry(root_type, key, value)
                .and_then(|predicate| check_joins(&joins, key, &predicate).map(|()| predicate));
            let predicate = match compiled {
                Ok(predicate) => predicate,
                Err(err) => match self.config.error_policy {
                    ErrorPolicy::Abort => return Err(err),
                    ErrorPolicy::SkipInvalid => {
                        warn!(error = %err, "skipping invalid filter entry");
                        diagnostics.push(err);
                        continue;
                    }
                },
            };

            for join in predicate.path.join_segments().filter_map(JoinSpec::from_segment) {
                if !joins.contains_key(&join.alias) {
                    trace!(join = %join, "new join");
                    joins.insert(join.alias.clone(), join);
                }
            }
            trace!(predicate = %predicate, "compiled filter entry");
            predicates.push(predicate);
        }

        let combinator = if predicates.is_empty()
            && combinator == CombinatorKind::AnyOf
            && self.config.empty_any_of == EmptyAnyOf::MatchAll
        {
            CombinatorKind::AllOf
        } else {
            combinator
        };

        let tree = PredicateTree {
            combinator,
            predicates,
        };
        debug!(
            tree = %tree,
            joins = joins.len(),
            skipped = diagnostics.len(),
            "compiled filter"
        );

        Ok(CompiledFilter {
            tree,
            joins: joins.into_values().collect(),
            diagnostics,
        })
    }

    fn compile_entry(
        &self,
        root_type: &str,
        key: &str,
        value: &str,
    ) -> Result<AtomicPredicate, CompileError> {
        let resolved =
            path::resolve(&self.schema, root_type, key).map_err(|source| CompileError::Path {
                key: key.to_string(),
                source,
            })?;

        let parsed = grammar::parse(value).map_err(|source| CompileError::Grammar {
            key: key.to_string(),
            value: value.to_string(),
            source,
        })?;

        let expected = parsed.operator.arity();
        if !expected.accepts(parsed.args.len()) {
            return Err(CompileError::Arity {
                key: key.to_string(),
                value: value.to_string(),
                operator: parsed.operator,
                expected,
                actual: parsed.args.len(),
            });
        }

        let values = self
            .coercer
            .coerce(&self.schema, &resolved.terminal_type, parsed.operator, &parsed.args)
            .map_err(|source| CompileError::Coercion {
                key: key.to_string(),
                value: value.to_string(),
                source,
            })?;

        Ok(AtomicPredicate {
            path: resolved,
            operator: parsed.operator,
            values,
        })
    }
}

/// Reject an entry whose joins reuse a recorded alias for a different
/// relation. Distinct paths can derive the same alias (`a_b` and `a.b`).
fn check_joins(
    joins: &IndexMap<String, JoinSpec>,
    key: &str,
    predicate: &AtomicPredicate,
) -> Result<(), CompileError> {
    for join in predicate.path.join_segments().filter_map(JoinSpec::from_segment) {
        if let Some(existing) = joins.get(&join.alias) {
            if existing.parent_alias != join.parent_alias
                || existing.property_name != join.property_name
            {
                return Err(CompileError::AliasConflict {
                    key: key.to_string(),
                    alias: join.alias,
                    existing: format!("{}.{}", existing.parent_alias, existing.property_name),
                    requested: format!("{}.{}", join.parent_alias, join.property_name),
                });
            }
        }
    }
    Ok(())
}

impl FilterCompiler<SchemaRegistry> {
    /// A compiler owning `registry`, with enumeration converters for every
    /// enumeration it declares.
    pub fn from_registry(registry: SchemaRegistry) -> Self {
        let coercer = ValueCoercer::from_schema(&registry);
        Self::new(registry).with_coercer(coercer)
    }
}
