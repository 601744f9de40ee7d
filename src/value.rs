use std::fmt::Display;

use crate::{LoxInteger, LoxNumber};

/// A runtime representation of a Lox value.
///
/// Values own their contents so bindings can outlive the source text they were evaluated from.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A Lox number.
    Number(LoxNumber),

    /// An integral number.
    /// Programs never produce one (numeric literals are always floating point), it exists for hosts
    /// that hand values to the interpreter and behaves like a number everywhere.
    Integer(LoxInteger),

    /// A Lox string.
    String(String),

    /// A Lox boolean.
    Bool(bool),

    /// The Lox `nil` value.
    Nil,
}

impl Value {
    /// The value as a float, if it is numeric.
    pub fn as_number(&self) -> Option<LoxNumber> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Integer(i) => Some(*i as LoxNumber),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Integer(i) => *i != 0,
            Value::String(s) => !s.is_empty(),
        }
    }

    /// Equality is only ever true between values of the same kind, numbers compare by value.
    pub fn equals(&self, right: &Value) -> bool {
        use Value::*;
        match (self, right) {
            (Nil, Nil) => true,
            (String(a), String(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Number(a), Number(b)) => a == b,
            (Integer(i), Number(n)) | (Number(n), Integer(i)) => Self::integer_equals(*i, *n),
            _ => false,
        }
    }

    /// Exact comparison, an `f64` cast of the integer would round above 2^53.
    fn integer_equals(integer: LoxInteger, number: LoxNumber) -> bool {
        // 2^63, the first float past `i64::MAX`
        const INTEGER_END: LoxNumber = 9_223_372_036_854_775_808.0;

        number.fract() == 0.0
            && (-INTEGER_END..INTEGER_END).contains(&number)
            && number as LoxInteger == integer
    }

    pub fn add(&self, right: &Value) -> Option<Value> {
        match (self, right) {
            (Value::String(a), Value::String(b)) => Some(Value::String(format!("{a}{b}"))),
            _ => self.arithmetic(right, |a, b| a + b),
        }
    }

    pub fn sub(&self, right: &Value) -> Option<Value> {
        self.arithmetic(right, |a, b| a - b)
    }

    pub fn mul(&self, right: &Value) -> Option<Value> {
        self.arithmetic(right, |a, b| a * b)
    }

    /// IEEE-754 division, dividing by zero yields an infinity or NaN.
    pub fn div(&self, right: &Value) -> Option<Value> {
        self.arithmetic(right, |a, b| a / b)
    }

    pub fn greater_than(&self, right: &Value) -> Option<bool> {
        self.compare(right, |a, b| a > b)
    }

    pub fn greater_than_equal(&self, right: &Value) -> Option<bool> {
        self.compare(right, |a, b| a >= b)
    }

    pub fn less_than(&self, right: &Value) -> Option<bool> {
        self.compare(right, |a, b| a < b)
    }

    pub fn less_than_equal(&self, right: &Value) -> Option<bool> {
        self.compare(right, |a, b| a <= b)
    }

    pub fn negate(&self) -> Option<Value> {
        self.as_number().map(|n| Value::Number(-n))
    }

    fn arithmetic(
        &self,
        right: &Value,
        op: impl Fn(LoxNumber, LoxNumber) -> LoxNumber,
    ) -> Option<Value> {
        let (a, b) = (self.as_number()?, right.as_number()?);
        Some(Value::Number(op(a, b)))
    }

    fn compare(&self, right: &Value, op: impl Fn(LoxNumber, LoxNumber) -> bool) -> Option<bool> {
        let (a, b) = (self.as_number()?, right.as_number()?);
        Some(op(a, b))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Integer(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Nil => write!(f, "nil"),
        }
    }
}

impl From<LoxNumber> for Value {
    fn from(n: LoxNumber) -> Self {
        Value::Number(n)
    }
}

impl From<LoxInteger> for Value {
    fn from(i: LoxInteger) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(Value::from(true).is_truthy());
        assert!(!Value::from(0.0).is_truthy());
        assert!(Value::from(-0.5).is_truthy());
        assert!(!Value::from(0i64).is_truthy());
        assert!(Value::from(3i64).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
    }

    #[test]
    fn equality_is_typed() {
        assert!(Value::Nil.equals(&Value::Nil));
        assert!(Value::from(1.0).equals(&Value::from(1.0)));
        assert!(Value::from(1.0).equals(&Value::from(1i64)));
        assert!(Value::from("a").equals(&Value::from("a")));
        assert!(Value::from(true).equals(&Value::from(true)));

        assert!(!Value::from(1.0).equals(&Value::from("1")));
        assert!(!Value::from("nil").equals(&Value::Nil));
        assert!(!Value::Nil.equals(&Value::from(false)));
        assert!(!Value::from(0.0).equals(&Value::from(false)));
        assert!(!Value::from(LoxNumber::NAN).equals(&Value::from(LoxNumber::NAN)));
    }

    #[test]
    fn integers_and_numbers_compare_exactly() {
        let big = 1i64 << 53;
        assert!(Value::from(big).equals(&Value::from(big as LoxNumber)));
        assert!(!Value::from(big + 1).equals(&Value::from(big as LoxNumber)));
        assert!(!Value::from(big as LoxNumber).equals(&Value::from(big + 1)));

        assert!(Value::from(-3i64).equals(&Value::from(-3.0)));
        assert!(!Value::from(3i64).equals(&Value::from(3.5)));
        assert!(!Value::from(i64::MAX).equals(&Value::from(9_223_372_036_854_775_808.0)));
        assert!(Value::from(i64::MIN).equals(&Value::from(-9_223_372_036_854_775_808.0)));
        assert!(!Value::from(0i64).equals(&Value::from(LoxNumber::NAN)));
        assert!(!Value::from(i64::MAX).equals(&Value::from(LoxNumber::INFINITY)));
    }

    #[test]
    fn addition_needs_matching_kinds() {
        assert_eq!(Value::from(1.5).add(&Value::from(2.0)), Some(Value::Number(3.5)));
        assert_eq!(
            Value::from("a").add(&Value::from("b")),
            Some(Value::String("ab".into()))
        );
        assert_eq!(Value::from(2i64).add(&Value::from(0.5)), Some(Value::Number(2.5)));
        assert_eq!(Value::from("a").add(&Value::from(1.0)), None);
        assert_eq!(Value::from(true).add(&Value::from(1.0)), None);
        assert_eq!(Value::Nil.add(&Value::Nil), None);
    }

    #[test]
    fn arithmetic_follows_ieee_754() {
        assert_eq!(Value::from(7.0).sub(&Value::from(2.0)), Some(Value::Number(5.0)));
        assert_eq!(Value::from(3.0).mul(&Value::from(-2.0)), Some(Value::Number(-6.0)));
        assert_eq!(
            Value::from(1.0).div(&Value::from(0.0)),
            Some(Value::Number(LoxNumber::INFINITY))
        );
        assert!(matches!(
            Value::from(0.0).div(&Value::from(0.0)),
            Some(Value::Number(n)) if n.is_nan()
        ));
        assert_eq!(Value::from("6").div(&Value::from(2.0)), None);
    }

    #[test]
    fn comparisons_need_numbers() {
        assert_eq!(Value::from(2.0).greater_than(&Value::from(1.0)), Some(true));
        assert_eq!(Value::from(2.0).greater_than_equal(&Value::from(2.0)), Some(true));
        assert_eq!(Value::from(2.0).less_than(&Value::from(2.0)), Some(false));
        assert_eq!(Value::from(1i64).less_than_equal(&Value::from(1.5)), Some(true));
        assert_eq!(Value::from("a").less_than(&Value::from("b")), None);
    }

    #[test]
    fn negation() {
        assert_eq!(Value::from(4.0).negate(), Some(Value::Number(-4.0)));
        assert_eq!(Value::from(4i64).negate(), Some(Value::Number(-4.0)));
        assert_eq!(Value::from("4").negate(), None);
    }

    #[test]
    fn textual_representation() {
        assert_eq!(Value::from(6.0).to_string(), "6");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(-0.125).to_string(), "-0.125");
        assert_eq!(Value::from(42i64).to_string(), "42");
        assert_eq!(Value::from(1_000_000.0).to_string(), "1000000");
        assert_eq!(Value::from(1e21).to_string(), "1000000000000000000000");
        assert_eq!(Value::from(1e-7).to_string(), "0.0000001");
        assert_eq!(Value::from(LoxNumber::INFINITY).to_string(), "inf");
        assert_eq!(Value::from(LoxNumber::NAN).to_string(), "NaN");
        assert_eq!(Value::from("a").to_string(), "\"a\"");
        assert_eq!(Value::from("say \"hi\"\n").to_string(), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::Nil.to_string(), "nil");
    }
}
