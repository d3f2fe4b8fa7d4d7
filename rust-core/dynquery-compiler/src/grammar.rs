// SPDX-License-Identifier: PMPL-1.0-or-later
//! Operator expression grammar.
//!
//! Filter values take the form `OPERATOR(arg1,arg2,...)`:
//!
//! ```text
//! expression := IDENT '(' arglist? ')'
//! arglist    := arg (',' arg)*
//! ```
//!
//! `IDENT` is matched case-insensitively against the closed [`OperatorKind`]
//! set. Arguments are split on every comma; there is no escaping, so an
//! argument can never contain a comma. Trailing empty arguments are dropped,
//! which makes `IN(a,b,)` equivalent to `IN(a,b)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GrammarError;

/// How the arguments of an operator are shaped in the compiled predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorClass {
    /// One typed value per argument.
    Single,
    /// All arguments collapsed into one list value (set membership).
    List,
}

/// Number of raw arguments an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    Nullary,
    Unary,
    Binary,
    Variadic,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Nullary => count == 0,
            Arity::Unary => count == 1,
            Arity::Binary => count == 2,
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Nullary => write!(f, "exactly 0"),
            Arity::Unary => write!(f, "exactly 1"),
            Arity::Binary => write!(f, "exactly 2"),
            Arity::Variadic => write!(f, "any number of"),
        }
    }
}

/// The closed set of filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorKind {
    Eq,
    Ne,
    IsNull,
    IsNotNull,
    Between,
    Goe,
    Gt,
    Loe,
    Lt,
    /// Regular expression match.
    Matches,
    MatchesIc,
    StringIsEmpty,
    StartsWith,
    StartsWithIc,
    EqIgnoreCase,
    EndsWith,
    EndsWithIc,
    StringContains,
    StringContainsIc,
    /// SQL-style wildcard match.
    Like,
    LikeIc,
    /// Wildcard match with an explicit escape character as second argument.
    LikeEscape,
    LikeEscapeIc,
    In,
    NotIn,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 25] = [
        OperatorKind::Eq,
        OperatorKind::Ne,
        OperatorKind::IsNull,
        OperatorKind::IsNotNull,
        OperatorKind::Between,
        OperatorKind::Goe,
        OperatorKind::Gt,
        OperatorKind::Loe,
        OperatorKind::Lt,
        OperatorKind::Matches,
        OperatorKind::MatchesIc,
        OperatorKind::StringIsEmpty,
        OperatorKind::StartsWith,
        OperatorKind::StartsWithIc,
        OperatorKind::EqIgnoreCase,
        OperatorKind::EndsWith,
        OperatorKind::EndsWithIc,
        OperatorKind::StringContains,
        OperatorKind::StringContainsIc,
        OperatorKind::Like,
        OperatorKind::LikeIc,
        OperatorKind::LikeEscape,
        OperatorKind::LikeEscapeIc,
        OperatorKind::In,
        OperatorKind::NotIn,
    ];

    /// Wire name, as written in filter values.
    pub fn as_str(self) -> &'static str {
        match self {
            OperatorKind::Eq => "EQ",
            OperatorKind::Ne => "NE",
            OperatorKind::IsNull => "IS_NULL",
            OperatorKind::IsNotNull => "IS_NOT_NULL",
            OperatorKind::Between => "BETWEEN",
            OperatorKind::Goe => "GOE",
            OperatorKind::Gt => "GT",
            OperatorKind::Loe => "LOE",
            OperatorKind::Lt => "LT",
            OperatorKind::Matches => "MATCHES",
            OperatorKind::MatchesIc => "MATCHES_IC",
            OperatorKind::StringIsEmpty => "STRING_IS_EMPTY",
            OperatorKind::StartsWith => "STARTS_WITH",
            OperatorKind::StartsWithIc => "STARTS_WITH_IC",
            OperatorKind::EqIgnoreCase => "EQ_IGNORE_CASE",
            OperatorKind::EndsWith => "ENDS_WITH",
            OperatorKind::EndsWithIc => "ENDS_WITH_IC",
            OperatorKind::StringContains => "STRING_CONTAINS",
            OperatorKind::StringContainsIc => "STRING_CONTAINS_IC",
            OperatorKind::Like => "LIKE",
            OperatorKind::LikeIc => "LIKE_IC",
            OperatorKind::LikeEscape => "LIKE_ESCAPE",
            OperatorKind::LikeEscapeIc => "LIKE_ESCAPE_IC",
            OperatorKind::In => "IN",
            OperatorKind::NotIn => "NOT_IN",
        }
    }

    pub fn class(self) -> OperatorClass {
        match self {
            OperatorKind::In | OperatorKind::NotIn => OperatorClass::List,
            _ => OperatorClass::Single,
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            OperatorKind::IsNull | OperatorKind::IsNotNull | OperatorKind::StringIsEmpty => {
                Arity::Nullary
            }
            OperatorKind::Between | OperatorKind::LikeEscape | OperatorKind::LikeEscapeIc => {
                Arity::Binary
            }
            OperatorKind::In | OperatorKind::NotIn => Arity::Variadic,
            _ => Arity::Unary,
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperatorKind::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_uppercase())
    }
}

/// A parsed filter value. Arguments borrow from the raw expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression<'a> {
    pub operator: OperatorKind,
    pub args: Vec<&'a str>,
}

/// Parse `OPERATOR(arg1,arg2,...)`.
pub fn parse(raw: &str) -> Result<ParsedExpression<'_>, GrammarError> {
    let open = match raw.find('(') {
        Some(idx) if idx > 0 => idx,
        _ => {
            return Err(GrammarError::MissingOperator {
                expression: raw.to_string(),
            })
        }
    };

    if !raw.ends_with(')') {
        return Err(GrammarError::MissingClosingParen {
            expression: raw.to_string(),
        });
    }

    let operator: OperatorKind =
        raw[..open]
            .parse()
            .map_err(|operator| GrammarError::UnknownOperator {
                operator,
                expression: raw.to_string(),
            })?;

    // `raw` ends with ')' and '(' sits before it, so the body slice is in bounds.
    let body = &raw[open + 1..raw.len() - 1];
    let mut args: Vec<&str> = if body.is_empty() {
        Vec::new()
    } else {
        body.split(',').collect()
    };
    while args.last().is_some_and(|arg| arg.is_empty()) {
        args.pop();
    }

    Ok(ParsedExpression { operator, args })
}
