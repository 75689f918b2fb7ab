//! Conversion of assembled runtime values into literal expressions.

use itertools::Itertools;
use num_bigint::{BigInt as BigIntValue, Sign};
use serde::{Deserialize, Serialize};
use swc_ecma_ast::{
    ArrayLit, BigInt, Bool, Expr, ExprOrSpread, Ident, KeyValueProp, Lit, Null,
    Number, ObjectLit, Prop, PropName, PropOrSpread, Str, UnaryExpr, UnaryOp,
};
use swc_ecma_quote::swc_common::DUMMY_SP;
use tr_core::{Error, Result, Value, ValueMap};

/// How `Value::Sequence` is written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SequenceMode {
    /// `[a, b]`
    #[default]
    Array,
    /// `{"0": a, "1": b}`, the layout older releases produced.
    IndexedObject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralSynthesizer {
    sequences: SequenceMode,
}

impl LiteralSynthesizer {
    pub fn new(sequences: SequenceMode) -> Self {
        Self { sequences }
    }

    pub fn synthesize(&self, value: &Value) -> Result<Box<Expr>> {
        let expr = match value {
            Value::Number(n) => number(*n),
            Value::BigInt(value) => bigint(value),
            Value::Bool(b) => Expr::Lit(Lit::Bool(Bool {
                span: DUMMY_SP,
                value: *b,
            })),
            Value::Text(text) => Expr::Lit(Lit::Str(string(text))),
            Value::Null => Expr::Lit(Lit::Null(Null { span: DUMMY_SP })),
            Value::Structure(map) => self.object(map.iter())?,
            Value::Sequence(items) => match self.sequences {
                SequenceMode::Array => Expr::Array(ArrayLit {
                    span: DUMMY_SP,
                    elems: items
                        .iter()
                        .map(|item| {
                            Ok(Some(ExprOrSpread {
                                spread: None,
                                expr: self.synthesize(item)?,
                            }))
                        })
                        .try_collect::<_, Vec<_>, Error>()?,
                }),
                SequenceMode::IndexedObject => {
                    let keys: Vec<String> = (0..items.len()).map(|i| i.to_string()).collect();
                    self.object(keys.iter().zip(items))?
                }
            },
            Value::Function(_) => return Err(Error::literal("function")),
            Value::Symbol(_) => return Err(Error::literal("symbol")),
            Value::Undefined => ident("undefined"),
        };
        Ok(Box::new(expr))
    }

    fn object<'v>(&self, entries: impl Iterator<Item = (&'v String, &'v Value)>) -> Result<Expr> {
        let props = entries
            .map(|(key, value)| {
                Ok(PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
                    key: PropName::Str(string(key)),
                    value: self.synthesize(value)?,
                }))))
            })
            .try_collect::<_, Vec<_>, Error>()?;
        Ok(Expr::Object(ObjectLit {
            span: DUMMY_SP,
            props,
        }))
    }
}

/// Literal for `value` with sequences written as array literals.
pub fn to_literal(value: &Value) -> Result<Box<Expr>> {
    LiteralSynthesizer::default().synthesize(value)
}

/// Reads a literal expression back into a value. Sequences are read from
/// array literals; index-keyed objects stay structures. Returns `None` for
/// anything that is not a plain literal.
pub fn read_literal(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Lit(Lit::Num(n)) => Some(Value::Number(n.value)),
        Expr::Lit(Lit::BigInt(b)) => Some(Value::BigInt((*b.value).clone())),
        Expr::Lit(Lit::Str(s)) => Some(Value::Text(s.value.to_string())),
        Expr::Lit(Lit::Bool(b)) => Some(Value::Bool(b.value)),
        Expr::Lit(Lit::Null(_)) => Some(Value::Null),
        Expr::Unary(UnaryExpr {
            op: UnaryOp::Minus,
            arg,
            ..
        }) => match read_literal(arg)? {
            Value::Number(n) => Some(Value::Number(-n)),
            Value::BigInt(value) if value.sign() != Sign::Minus => Some(Value::BigInt(-value)),
            _ => None,
        },
        Expr::Ident(ident) => match &*ident.sym {
            "undefined" => Some(Value::Undefined),
            "NaN" => Some(Value::Number(f64::NAN)),
            "Infinity" => Some(Value::Number(f64::INFINITY)),
            _ => None,
        },
        Expr::Paren(paren) => read_literal(&paren.expr),
        Expr::Array(array) => array
            .elems
            .iter()
            .map(|elem| match elem {
                Some(ExprOrSpread { spread: None, expr }) => read_literal(expr),
                Some(_) => None,
                None => Some(Value::Undefined),
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::Sequence),
        Expr::Object(object) => {
            let mut map = ValueMap::new();
            for prop in &object.props {
                let PropOrSpread::Prop(prop) = prop else {
                    return None;
                };
                let Prop::KeyValue(kv) = &**prop else {
                    return None;
                };
                let key = match &kv.key {
                    PropName::Str(s) => s.value.to_string(),
                    PropName::Ident(ident) => ident.sym.to_string(),
                    PropName::Num(n) => n.value.to_string(),
                    _ => return None,
                };
                map.insert(key, read_literal(&kv.value)?);
            }
            Some(Value::Structure(map))
        }
        _ => None,
    }
}

fn number(value: f64) -> Expr {
    if value.is_nan() {
        return ident("NaN");
    }
    if value < 0.0 {
        return Expr::Unary(UnaryExpr {
            span: DUMMY_SP,
            op: UnaryOp::Minus,
            arg: Box::new(number(-value)),
        });
    }
    if value.is_infinite() {
        return ident("Infinity");
    }
    Expr::Lit(Lit::Num(Number {
        span: DUMMY_SP,
        value,
        raw: None,
    }))
}

/// Negative values are written as unary minus, like numbers.
fn bigint(value: &BigIntValue) -> Expr {
    if value.sign() == Sign::Minus {
        return Expr::Unary(UnaryExpr {
            span: DUMMY_SP,
            op: UnaryOp::Minus,
            arg: Box::new(bigint(&-value)),
        });
    }
    Expr::Lit(Lit::BigInt(BigInt {
        span: DUMMY_SP,
        value: Box::new(value.clone()),
        raw: None,
    }))
}

fn string(value: &str) -> Str {
    Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    }
}

fn ident(name: &str) -> Expr {
    Expr::Ident(Ident::new(name.into(), DUMMY_SP))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema_options() -> Value {
        Value::from(json!({
            "schema": {
                "query": {
                    "type": "object",
                    "properties": { "foo": { "type": "number" } },
                    "additionalProperties": false
                },
                "params": { "type": "object", "required": ["bar"] },
                "body": { "minimum": -3, "maximum": 2.5, "nullable": null }
            }
        }))
    }

    #[test]
    fn structures_read_back_with_their_key_order() {
        let value = schema_options();
        let expr = to_literal(&value).unwrap();
        let read = read_literal(&expr).unwrap();
        assert_eq!(read, value);

        let keys: Vec<&String> = read.get("schema").unwrap().as_structure().unwrap().keys().collect();
        assert_eq!(keys, vec!["query", "params", "body"]);
    }

    #[test]
    fn negative_numbers_are_negated_literals() {
        let expr = to_literal(&Value::Number(-3.0)).unwrap();
        match &*expr {
            Expr::Unary(UnaryExpr { op, arg, .. }) => {
                assert_eq!(*op, UnaryOp::Minus);
                assert!(matches!(&**arg, Expr::Lit(Lit::Num(n)) if n.value == 3.0));
            }
            other => panic!("unexpected literal {other:?}"),
        }
    }

    #[test]
    fn bigints_keep_their_digits() {
        let big: BigIntValue = "123456789012345678901234567890".parse().unwrap();
        let expr = to_literal(&Value::BigInt(big.clone())).unwrap();
        assert!(matches!(&*expr, Expr::Lit(Lit::BigInt(b)) if *b.value == big));
        assert_eq!(read_literal(&expr), Some(Value::BigInt(big)));

        let negative = Value::BigInt(BigIntValue::from(-42));
        let expr = to_literal(&negative).unwrap();
        assert!(matches!(&*expr, Expr::Unary(UnaryExpr { op: UnaryOp::Minus, .. })));
        assert_eq!(read_literal(&expr), Some(negative));
    }

    #[test]
    fn undefined_becomes_an_identifier() {
        let expr = to_literal(&Value::Undefined).unwrap();
        assert!(matches!(&*expr, Expr::Ident(ident) if &*ident.sym == "undefined"));
    }

    #[test]
    fn functions_and_symbols_are_refused() {
        let nested = Value::structure([(
            "schema",
            Value::structure([("handler", Value::Function("handler".into()))]),
        )]);
        let err = to_literal(&nested).unwrap_err();
        assert_eq!(err.to_string(), "cannot serialize function");

        let err = to_literal(&Value::Symbol("tag".into())).unwrap_err();
        assert_eq!(err.to_string(), "cannot serialize symbol");
    }

    #[test]
    fn sequence_layout_follows_the_mode() {
        let value = Value::from(json!(["bar", "baz"]));

        let array = to_literal(&value).unwrap();
        assert!(matches!(&*array, Expr::Array(_)));
        assert_eq!(read_literal(&array), Some(value.clone()));

        let indexed = LiteralSynthesizer::new(SequenceMode::IndexedObject)
            .synthesize(&value)
            .unwrap();
        assert_eq!(
            read_literal(&indexed),
            Some(Value::structure([
                ("0", Value::text("bar")),
                ("1", Value::text("baz")),
            ]))
        );
    }

    #[test]
    fn sequence_mode_uses_kebab_case_names() {
        let mode: SequenceMode = serde_json::from_value(json!("indexed-object")).unwrap();
        assert_eq!(mode, SequenceMode::IndexedObject);
    }
}
