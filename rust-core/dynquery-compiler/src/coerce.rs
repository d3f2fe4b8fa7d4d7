// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Value coercion.
//!
//! Converts raw string arguments into [`TypedValue`]s matching the declared
//! type of the terminal property. Scalars use a built-in table; named types
//! go through a [`Converter`] registered under the type name, fall back to
//! the variants of an enumeration declared in the schema, and finally to
//! structural JSON conversion when that is enabled.
//!
//! Each argument converts independently and the result is de-duplicated in
//! first-seen order, so `IN(a,a,b)` yields `[a, b]`. List-class operators get
//! their values collapsed into a single [`TypedValue::List`]; everything else
//! keeps one value per distinct argument. Argument counts are not checked
//! here, the compiler does that against the operator's arity.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use dynquery_schema::{ScalarKind, SchemaProvider, SchemaRegistry, TypeClass, TypeRef};

use crate::error::CoercionError;
use crate::grammar::{OperatorClass, OperatorKind};
use crate::value::TypedValue;

/// Signature of a caller-supplied conversion. The error string becomes the
/// `reason` of [`CoercionError::InvalidLiteral`].
pub type ConvertFn = dyn Fn(&str) -> Result<TypedValue, String> + Send + Sync;

/// Conversion strategy for a named type.
#[derive(Clone)]
pub enum Converter {
    /// Exact match against a closed set of constants.
    Enumeration(Vec<String>),
    /// Structural conversion: the argument is read as a JSON literal, and
    /// kept as a JSON string when it is not one.
    Json,
    Custom(Arc<ConvertFn>),
}

impl Converter {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<TypedValue, String> + Send + Sync + 'static,
    {
        Converter::Custom(Arc::new(f))
    }

    fn convert(&self, type_name: &str, raw: &str) -> Result<TypedValue, CoercionError> {
        match self {
            Converter::Enumeration(variants) => enumeration_constant(type_name, variants, raw),
            Converter::Json => {
                let value = serde_json::from_str(raw)
                    .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
                Ok(TypedValue::Custom {
                    type_name: type_name.to_string(),
                    value,
                })
            }
            Converter::Custom(f) => f(raw).map_err(|reason| invalid(raw, type_name, reason)),
        }
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Converter::Enumeration(variants) => {
                f.debug_tuple("Enumeration").field(variants).finish()
            }
            Converter::Json => f.write_str("Json"),
            Converter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Registry of conversions from raw arguments to typed values.
#[derive(Debug, Clone, Default)]
pub struct ValueCoercer {
    converters: HashMap<String, Converter>,
    structural_fallback: bool,
}

impl ValueCoercer {
    /// A coercer with only the built-in scalar table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A coercer with an [`Converter::Enumeration`] for every enumeration
    /// type declared in `registry`.
    pub fn from_schema(registry: &SchemaRegistry) -> Self {
        let mut coercer = Self::new();
        for (name, variants) in registry.enumerations() {
            coercer.register(name, Converter::Enumeration(variants.to_vec()));
        }
        coercer
    }

    /// Register (or replace) the converter for a named type.
    pub fn register(&mut self, type_name: impl Into<String>, converter: Converter) -> &mut Self {
        self.converters.insert(type_name.into(), converter);
        self
    }

    pub fn with_converter(mut self, type_name: impl Into<String>, converter: Converter) -> Self {
        self.register(type_name, converter);
        self
    }

    /// Use [`Converter::Json`] for named types with no registered converter.
    pub fn with_structural_fallback(mut self, enabled: bool) -> Self {
        self.structural_fallback = enabled;
        self
    }

    pub fn structural_fallback(&self) -> bool {
        self.structural_fallback
    }

    /// Convert every argument and shape the result for `operator`.
    ///
    /// `schema` is consulted for named types with no registered converter,
    /// so enumerations declared there convert without extra setup.
    pub fn coerce<S>(
        &self,
        schema: &S,
        terminal_type: &TypeRef,
        operator: OperatorKind,
        raw_args: &[&str],
    ) -> Result<Vec<TypedValue>, CoercionError>
    where
        S: SchemaProvider + ?Sized,
    {
        let mut values: Vec<TypedValue> = Vec::with_capacity(raw_args.len());
        for raw in raw_args {
            let value = self.convert(schema, terminal_type, raw)?;
            if !values.iter().any(|seen| same_value(seen, &value)) {
                values.push(value);
            }
        }

        Ok(match operator.class() {
            OperatorClass::List => vec![TypedValue::List(values)],
            OperatorClass::Single => values,
        })
    }

    /// Convert one argument. Collections of scalars convert against their
    /// element type. Named types use, in order: a registered converter, the
    /// variants of a schema enumeration, then the structural fallback.
    pub fn convert<S>(&self, schema: &S, ty: &TypeRef, raw: &str) -> Result<TypedValue, CoercionError>
    where
        S: SchemaProvider + ?Sized,
    {
        match ty {
            TypeRef::Scalar(kind) => convert_scalar(*kind, raw),
            TypeRef::List(element) => self.convert(schema, element, raw),
            TypeRef::Named(name) => {
                if let Some(converter) = self.converters.get(name) {
                    return converter.convert(name, raw);
                }
                match schema.type_class(name) {
                    Some(TypeClass::Enumeration { variants }) => {
                        enumeration_constant(name, &variants, raw)
                    }
                    _ if self.structural_fallback => Converter::Json.convert(name, raw),
                    _ => Err(CoercionError::NoConverter {
                        value: raw.to_string(),
                        target: name.clone(),
                    }),
                }
            }
        }
    }
}

fn enumeration_constant(
    type_name: &str,
    variants: &[String],
    raw: &str,
) -> Result<TypedValue, CoercionError> {
    if variants.iter().any(|v| v == raw) {
        Ok(TypedValue::Custom {
            type_name: type_name.to_string(),
            value: serde_json::Value::String(raw.to_string()),
        })
    } else {
        Err(invalid(
            raw,
            type_name,
            format!("expected one of {}", variants.join(", ")),
        ))
    }
}

/// Duplicate check for argument de-duplication. Floats compare by bit
/// pattern so `NaN` matches itself, and decimals must also agree on scale
/// (`1.0` and `1.00` stay distinct).
fn same_value(a: &TypedValue, b: &TypedValue) -> bool {
    match (a, b) {
        (TypedValue::Double(x), TypedValue::Double(y)) => x.to_bits() == y.to_bits(),
        (TypedValue::Float(x), TypedValue::Float(y)) => x.to_bits() == y.to_bits(),
        (TypedValue::Decimal(x), TypedValue::Decimal(y)) => x == y && x.scale() == y.scale(),
        _ => a == b,
    }
}

fn invalid(raw: &str, target: &str, reason: impl Into<String>) -> CoercionError {
    CoercionError::InvalidLiteral {
        value: raw.to_string(),
        target: target.to_string(),
        reason: reason.into(),
    }
}

fn parse_with<T, F>(kind: ScalarKind, raw: &str, wrap: F) -> Result<TypedValue, CoercionError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: FnOnce(T) -> TypedValue,
{
    raw.parse::<T>()
        .map(wrap)
        .map_err(|e| invalid(raw, kind.name(), e.to_string()))
}

fn convert_scalar(kind: ScalarKind, raw: &str) -> Result<TypedValue, CoercionError> {
    match kind {
        ScalarKind::String => Ok(TypedValue::String(raw.to_string())),
        ScalarKind::Integer => parse_with(kind, raw, TypedValue::Integer),
        ScalarKind::Long => parse_with(kind, raw, TypedValue::Long),
        ScalarKind::Short => parse_with(kind, raw, TypedValue::Short),
        ScalarKind::Byte => parse_with(kind, raw, TypedValue::Byte),
        ScalarKind::Double => parse_with(kind, raw, TypedValue::Double),
        ScalarKind::Float => parse_with(kind, raw, TypedValue::Float),
        ScalarKind::Decimal => Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .map(TypedValue::Decimal)
            .map_err(|e| invalid(raw, kind.name(), e.to_string())),
        ScalarKind::Boolean => {
            if raw.eq_ignore_ascii_case("true") {
                Ok(TypedValue::Boolean(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Ok(TypedValue::Boolean(false))
            } else {
                Err(invalid(raw, kind.name(), "expected true or false"))
            }
        }
        ScalarKind::Char => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(TypedValue::Char(c)),
                _ => Err(invalid(raw, kind.name(), "expected exactly one character")),
            }
        }
        ScalarKind::Date => parse_with::<NaiveDate, _>(kind, raw, TypedValue::Date),
        ScalarKind::DateTime => DateTime::parse_from_rfc3339(raw)
            .map(|dt| TypedValue::DateTime(dt.with_timezone(&Utc)))
            .map_err(|e| invalid(raw, kind.name(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dynquery_schema::PropertyDescriptor;

    struct NoSchema;

    impl SchemaProvider for NoSchema {
        fn describe(&self, _owner: &str, _property: &str) -> Option<PropertyDescriptor> {
            None
        }

        fn type_class(&self, _type_name: &str) -> Option<TypeClass> {
            None
        }
    }

    fn scalar(kind: ScalarKind) -> TypeRef {
        TypeRef::Scalar(kind)
    }

    #[test]
    fn test_in_deduplicates_preserving_order() {
        let coercer = ValueCoercer::new();
        let values = coercer
            .coerce(&NoSchema, &scalar(ScalarKind::String), OperatorKind::In, &["a", "a", "b"])
            .unwrap();
        assert_eq!(
            values,
            vec![TypedValue::List(vec![
                TypedValue::String("a".to_string()),
                TypedValue::String("b".to_string()),
            ])]
        );
    }

    #[test]
    fn test_empty_in_is_one_empty_list() {
        let values = ValueCoercer::new()
            .coerce(&NoSchema, &scalar(ScalarKind::Long), OperatorKind::NotIn, &[])
            .unwrap();
        assert_eq!(values, vec![TypedValue::List(vec![])]);
    }

    #[test]
    fn test_between_integers() {
        let values = ValueCoercer::new()
            .coerce(&NoSchema, &scalar(ScalarKind::Integer), OperatorKind::Between, &["1", "10"])
            .unwrap();
        assert_eq!(values, vec![TypedValue::Integer(1), TypedValue::Integer(10)]);
    }

    #[test]
    fn test_nullary_has_no_values() {
        let values = ValueCoercer::new()
            .coerce(&NoSchema, &scalar(ScalarKind::String), OperatorKind::IsNull, &[])
            .unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_scalar_table() {
        let c = ValueCoercer::new();
        let conv = |kind, raw| c.convert(&NoSchema, &scalar(kind), raw).unwrap();

        assert_eq!(conv(ScalarKind::Long, "-9000000000"), TypedValue::Long(-9_000_000_000));
        assert_eq!(conv(ScalarKind::Short, "12"), TypedValue::Short(12));
        assert_eq!(conv(ScalarKind::Byte, "-7"), TypedValue::Byte(-7));
        assert_eq!(conv(ScalarKind::Double, "2.5"), TypedValue::Double(2.5));
        assert_eq!(conv(ScalarKind::Float, "0.5"), TypedValue::Float(0.5));
        assert_eq!(conv(ScalarKind::Boolean, "TRUE"), TypedValue::Boolean(true));
        assert_eq!(conv(ScalarKind::Boolean, "false"), TypedValue::Boolean(false));
        assert_eq!(conv(ScalarKind::Char, "x"), TypedValue::Char('x'));
        assert_eq!(
            conv(ScalarKind::Decimal, "19.99"),
            TypedValue::Decimal(Decimal::new(1999, 2))
        );
        assert_eq!(
            conv(ScalarKind::Decimal, "1e3"),
            TypedValue::Decimal(Decimal::from(1000))
        );
        assert_eq!(
            conv(ScalarKind::Date, "2026-02-28"),
            TypedValue::Date(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap())
        );
        assert_eq!(
            conv(ScalarKind::DateTime, "2026-02-28T12:30:00+02:00"),
            TypedValue::DateTime(Utc.with_ymd_and_hms(2026, 2, 28, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_literals_carry_value_and_target() {
        let c = ValueCoercer::new();
        let err = c.convert(&NoSchema, &scalar(ScalarKind::Integer), "ten").unwrap_err();
        assert!(matches!(
            err,
            CoercionError::InvalidLiteral { ref value, ref target, .. }
                if value == "ten" && target == "integer"
        ));

        assert!(c.convert(&NoSchema, &scalar(ScalarKind::Byte), "300").is_err());
        assert!(c.convert(&NoSchema, &scalar(ScalarKind::Boolean), "yes").is_err());
        assert!(c.convert(&NoSchema, &scalar(ScalarKind::Char), "").is_err());
        assert!(c.convert(&NoSchema, &scalar(ScalarKind::Char), "ab").is_err());
        assert!(c.convert(&NoSchema, &scalar(ScalarKind::Date), "31/01/2026").is_err());
        assert!(c.convert(&NoSchema, &scalar(ScalarKind::DateTime), "2026-01-31").is_err());
    }

    #[test]
    fn test_first_failure_aborts_coercion() {
        let result = ValueCoercer::new().coerce(
            &NoSchema,
            &scalar(ScalarKind::Long),
            OperatorKind::In,
            &["1", "x", "2"],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_scalar_collection_uses_element_type() {
        let tags = TypeRef::list(scalar(ScalarKind::Integer));
        let values = ValueCoercer::new()
            .coerce(&NoSchema, &tags, OperatorKind::Eq, &["5"])
            .unwrap();
        assert_eq!(values, vec![TypedValue::Integer(5)]);
    }

    #[test]
    fn test_named_type_without_converter() {
        let err = ValueCoercer::new()
            .convert(&NoSchema, &TypeRef::named("Money"), "12 EUR")
            .unwrap_err();
        assert_eq!(
            err,
            CoercionError::NoConverter {
                value: "12 EUR".to_string(),
                target: "Money".to_string(),
            }
        );
    }

    #[test]
    fn test_structural_fallback() {
        let coercer = ValueCoercer::new().with_structural_fallback(true);
        assert_eq!(
            coercer.convert(&NoSchema, &TypeRef::named("Level"), "3").unwrap(),
            TypedValue::Custom {
                type_name: "Level".to_string(),
                value: serde_json::json!(3),
            }
        );
        assert_eq!(
            coercer.convert(&NoSchema, &TypeRef::named("Level"), "high").unwrap(),
            TypedValue::Custom {
                type_name: "Level".to_string(),
                value: serde_json::json!("high"),
            }
        );
    }

    #[test]
    fn test_enumeration_converter() {
        let coercer = ValueCoercer::new().with_converter(
            "Status",
            Converter::Enumeration(vec!["ACTIVE".to_string(), "INACTIVE".to_string()]),
        );
        let status = TypeRef::named("Status");

        assert!(coercer.convert(&NoSchema, &status, "ACTIVE").is_ok());
        let err = coercer.convert(&NoSchema, &status, "active").unwrap_err();
        assert!(err.to_string().contains("expected one of ACTIVE, INACTIVE"));
    }

    #[test]
    fn test_from_schema_registers_enumerations() {
        let registry = SchemaRegistry::builder()
            .enumeration("Status", ["ACTIVE"])
            .build()
            .unwrap();
        let coercer = ValueCoercer::from_schema(&registry);
        assert!(coercer.convert(&NoSchema, &TypeRef::named("Status"), "ACTIVE").is_ok());
    }

    #[test]
    fn test_custom_converter() {
        let coercer = ValueCoercer::new().with_converter(
            "Cents",
            Converter::custom(|raw| {
                raw.strip_suffix('c')
                    .ok_or_else(|| "missing 'c' suffix".to_string())?
                    .parse::<i64>()
                    .map(TypedValue::Long)
                    .map_err(|e| e.to_string())
            }),
        );
        let cents = TypeRef::named("Cents");

        assert_eq!(coercer.convert(&NoSchema, &cents, "250c").unwrap(), TypedValue::Long(250));
        let err = coercer.convert(&NoSchema, &cents, "250").unwrap_err();
        assert!(matches!(err, CoercionError::InvalidLiteral { ref reason, .. } if reason == "missing 'c' suffix"));
    }

    #[test]
    fn test_nan_deduplicates_by_bit_pattern() {
        let values = ValueCoercer::new()
            .coerce(&NoSchema, &scalar(ScalarKind::Double), OperatorKind::In, &["NaN", "NaN", "1.5"])
            .unwrap();
        let items = values[0].as_list().unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], TypedValue::Double(v) if v.is_nan()));

        let floats = ValueCoercer::new()
            .coerce(&NoSchema, &scalar(ScalarKind::Float), OperatorKind::Eq, &["NaN", "NaN"])
            .unwrap();
        assert_eq!(floats.len(), 1);
    }

    #[test]
    fn test_decimals_with_different_scale_stay_distinct() {
        let values = ValueCoercer::new()
            .coerce(
                &NoSchema,
                &scalar(ScalarKind::Decimal),
                OperatorKind::In,
                &["1.0", "1.00", "1.0"],
            )
            .unwrap();
        assert_eq!(
            values,
            vec![TypedValue::List(vec![
                TypedValue::Decimal(Decimal::new(10, 1)),
                TypedValue::Decimal(Decimal::new(100, 2)),
            ])]
        );
    }

    #[test]
    fn test_schema_enumeration_without_registration() {
        let registry = SchemaRegistry::builder()
            .enumeration("Status", ["ACTIVE", "INACTIVE"])
            .build()
            .unwrap();
        let coercer = ValueCoercer::new();
        let status = TypeRef::named("Status");

        assert_eq!(
            coercer.convert(&registry, &status, "ACTIVE").unwrap(),
            TypedValue::Custom {
                type_name: "Status".to_string(),
                value: serde_json::json!("ACTIVE"),
            }
        );
        assert!(matches!(
            coercer.convert(&registry, &status, "GONE").unwrap_err(),
            CoercionError::InvalidLiteral { .. }
        ));
    }

    #[test]
    fn test_registered_converter_wins_over_schema_enumeration() {
        let registry = SchemaRegistry::builder()
            .enumeration("Status", ["ACTIVE"])
            .build()
            .unwrap();
        let coercer = ValueCoercer::new().with_converter(
            "Status",
            Converter::custom(|raw| Ok(TypedValue::String(raw.to_string()))),
        );
        assert_eq!(
            coercer.convert(&registry, &TypeRef::named("Status"), "anything").unwrap(),
            TypedValue::String("anything".to_string())
        );
    }
}
