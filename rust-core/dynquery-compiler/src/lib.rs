// SPDX-License-Identifier: PMPL-1.0-or-later
//! DynQuery Compiler
//!
//! Compiles a flat map of dotted property paths to `OPERATOR(args)`
//! expressions into a predicate tree and the set of joins needed to
//! evaluate it:
//!
//! ```text
//! {type: anyOf, status: EQ(ACTIVE), orders.total: GT(10)}
//!   => anyOf(person.status EQ ['ACTIVE'], person_orders.total GT [10])
//!      collection join person.orders as person_orders
//! ```
//!
//! Executing the result, sorting and pagination belong to the caller.

pub mod coerce;
pub mod compiler;
pub mod config;
pub mod error;
pub mod grammar;
pub mod params;
pub mod path;
pub mod predicate;
pub mod value;

pub use coerce::{ConvertFn, Converter, ValueCoercer};
pub use compiler::FilterCompiler;
pub use config::{CompilerConfig, EmptyAnyOf, ErrorPolicy};
pub use error::{CoercionError, CompileError, GrammarError, PathError};
pub use grammar::{Arity, OperatorClass, OperatorKind, ParsedExpression};
pub use params::QueryParameters;
pub use path::{PathSegment, RelationKind, ResolvedPath};
pub use predicate::{
    AtomicPredicate, CombinatorKind, CompiledFilter, JoinKind, JoinSpec, PredicateTree,
};
pub use value::TypedValue;

use dynquery_schema::SchemaProvider;

/// Compile `params` with the default configuration. Enumerations declared
/// in `schema` are checked against their variants.
pub fn compile<S>(
    schema: &S,
    root_type: &str,
    params: &QueryParameters,
) -> Result<CompiledFilter, CompileError>
where
    S: SchemaProvider + ?Sized,
{
    FilterCompiler::new(schema).compile(root_type, params)
}
