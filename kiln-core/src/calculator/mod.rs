//! Polymorphic arithmetic dispatch
//!
//! Every binary operator is resolved by picking one [`Calculator`] for the
//! operand pair: the one bound to the dominant operand kind
//! (Vector > String > Boolean > Scalar > Opaque). An opaque operand whose host
//! kind has a registered calculator takes over any pair without a vector or
//! string. Calculators receive the pair unchanged and convert each operand
//! themselves.

mod boolean;
mod scalar;
mod string;
mod vector;

pub use boolean::BooleanCalculator;
pub use scalar::ScalarCalculator;
pub use string::StringCalculator;
pub use vector::VectorCalculator;

use crate::error::DispatchError;
use crate::value::{ScalarValue, Value, ValueKind, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type CalcResult = Result<Value, DispatchError>;

// ==================== Operators ====================

/// Binary operators understood by every calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    GreaterThan,
    LessThan,
    GreaterThanEqual,
    LessThanEqual,
    Equal,
    NotEqual,
    Min,
    Max,
}

impl Operator {
    pub fn name(self) -> &'static str {
        match self {
            Operator::Add => "Add",
            Operator::Subtract => "Subtract",
            Operator::Multiply => "Multiply",
            Operator::Divide => "Divide",
            Operator::Power => "Power",
            Operator::GreaterThan => "GreaterThan",
            Operator::LessThan => "LessThan",
            Operator::GreaterThanEqual => "GreaterThanEqual",
            Operator::LessThanEqual => "LessThanEqual",
            Operator::Equal => "Equal",
            Operator::NotEqual => "NotEqual",
            Operator::Min => "Min",
            Operator::Max => "Max",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Power => "^",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanEqual => ">=",
            Operator::LessThanEqual => "<=",
            Operator::Equal => "==",
            Operator::NotEqual => "<>",
            Operator::Min => "min",
            Operator::Max => "max",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Negate => f.write_str("Negate"),
            UnaryOperator::Not => f.write_str("Not"),
        }
    }
}

// ==================== OperandPair ====================

/// Left and right inputs of one dispatch call
#[derive(Debug, Clone, PartialEq)]
pub struct OperandPair {
    pub left: Value,
    pub right: Value,
}

impl OperandPair {
    /// Accepts values or raw host primitives; both sides go through `Value::create`
    pub fn new(left: impl Into<Value>, right: impl Into<Value>) -> Self {
        Self {
            left: Value::create(left),
            right: Value::create(right),
        }
    }

    pub fn unsupported(&self, op: Operator) -> DispatchError {
        DispatchError::unsupported(op, &self.left, &self.right)
    }

    /// Both operands converted to scalars; a failed conversion reports the operator
    pub fn scalars(&self, op: Operator) -> Result<(ScalarValue, ScalarValue), DispatchError> {
        match (ScalarValue::create(&self.left), ScalarValue::create(&self.right)) {
            (Ok(l), Ok(r)) => Ok((l, r)),
            _ => Err(self.unsupported(op)),
        }
    }

    pub fn vectors(&self) -> Option<(Vector3, Vector3)> {
        Some((self.left.as_vector()?, self.right.as_vector()?))
    }

    pub fn dominant_kind(&self) -> ValueKind {
        dominant_kind(self.left.kind(), self.right.kind())
    }
}

/// Higher dominance wins; ties keep the left kind
pub fn dominant_kind(left: ValueKind, right: ValueKind) -> ValueKind {
    if left.dominance() >= right.dominance() {
        left
    } else {
        right
    }
}

// ==================== Calculator ====================

/// Stateless operator strategy bound to one value kind.
///
/// Every operator defaults to an "unsupported operation" error, so a
/// calculator only implements what its kind defines.
pub trait Calculator {
    fn add(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::Add))
    }

    fn subtract(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::Subtract))
    }

    fn multiply(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::Multiply))
    }

    fn divide(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::Divide))
    }

    fn power(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::Power))
    }

    fn greater_than(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::GreaterThan))
    }

    fn less_than(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::LessThan))
    }

    fn greater_than_equal(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::GreaterThanEqual))
    }

    fn less_than_equal(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::LessThanEqual))
    }

    fn equal(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::Equal))
    }

    fn not_equal(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::NotEqual))
    }

    fn min(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::Min))
    }

    fn max(&self, pair: &OperandPair) -> CalcResult {
        Err(pair.unsupported(Operator::Max))
    }

    fn evaluate(&self, op: Operator, pair: &OperandPair) -> CalcResult {
        match op {
            Operator::Add => self.add(pair),
            Operator::Subtract => self.subtract(pair),
            Operator::Multiply => self.multiply(pair),
            Operator::Divide => self.divide(pair),
            Operator::Power => self.power(pair),
            Operator::GreaterThan => self.greater_than(pair),
            Operator::LessThan => self.less_than(pair),
            Operator::GreaterThanEqual => self.greater_than_equal(pair),
            Operator::LessThanEqual => self.less_than_equal(pair),
            Operator::Equal => self.equal(pair),
            Operator::NotEqual => self.not_equal(pair),
            Operator::Min => self.min(pair),
            Operator::Max => self.max(pair),
        }
    }
}

// ==================== Dispatcher ====================

/// Selects and invokes the calculator for an operand pair.
///
/// The four built-in calculators are fixed; hosts may register extra
/// calculators for their opaque kinds.
#[derive(Default)]
pub struct Dispatcher {
    host: HashMap<String, Box<dyn Calculator>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the calculator for an opaque host kind
    pub fn register(&mut self, kind_name: impl Into<String>, calculator: impl Calculator + 'static) {
        self.host.insert(kind_name.into(), Box::new(calculator));
    }

    pub fn has_host_calculator(&self, kind_name: &str) -> bool {
        self.host.contains_key(kind_name)
    }

    /// The single calculator responsible for this pair
    pub fn select(&self, pair: &OperandPair) -> &dyn Calculator {
        let builtin: &dyn Calculator = match pair.dominant_kind() {
            ValueKind::Vector => return &VectorCalculator,
            ValueKind::String => return &StringCalculator,
            ValueKind::Boolean => &BooleanCalculator,
            ValueKind::Scalar | ValueKind::Opaque => &ScalarCalculator,
        };
        // a registered host kind owns its pairings with scalars and booleans
        self.host_calculator(&pair.left)
            .or_else(|| self.host_calculator(&pair.right))
            .unwrap_or(builtin)
    }

    fn host_calculator(&self, value: &Value) -> Option<&dyn Calculator> {
        match value {
            Value::Opaque(obj) => self.host.get(obj.kind_name()).map(|c| c.as_ref()),
            _ => None,
        }
    }

    pub fn evaluate(&self, op: Operator, pair: &OperandPair) -> CalcResult {
        self.select(pair).evaluate(op, pair)
    }

    pub fn evaluate_unary(&self, op: UnaryOperator, operand: &Value) -> CalcResult {
        match (op, operand) {
            (UnaryOperator::Not, v) => Ok(Value::Boolean(!v.is_truthy())),
            (UnaryOperator::Negate, Value::Vector(v)) => Ok(Value::Vector(v.scale(-1.0))),
            (UnaryOperator::Negate, Value::Scalar(s)) => Ok(Value::Scalar(s.negate())),
            (UnaryOperator::Negate, other) => Err(DispatchError::UnsupportedUnary {
                op,
                operand: other.kind_name(),
            }),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&String> = self.host.keys().collect();
        kinds.sort();
        f.debug_struct("Dispatcher").field("host_kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::HostObject;

    fn eval(op: Operator, l: impl Into<Value>, r: impl Into<Value>) -> CalcResult {
        Dispatcher::new().evaluate(op, &OperandPair::new(l, r))
    }

    #[derive(Debug)]
    struct Mass(f64);

    impl HostObject for Mass {
        fn kind_name(&self) -> &str {
            "Mass"
        }
    }

    /// Adds masses, nothing else
    struct MassCalculator;

    impl Calculator for MassCalculator {
        fn add(&self, _pair: &OperandPair) -> CalcResult {
            Ok(Value::from("mass-sum"))
        }
    }

    #[test]
    fn test_scenarios() {
        assert_eq!(eval(Operator::Add, 2, 3), Ok(Value::from(5)));
        assert_eq!(eval(Operator::Add, "ab", 3), Ok(Value::from("ab3")));
        assert_eq!(
            eval(
                Operator::Add,
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0)
            ),
            Ok(Value::from(Vector3::new(1.0, 1.0, 0.0)))
        );
        assert_eq!(eval(Operator::Min, 4, 1), Ok(Value::from(1)));
    }

    #[test]
    fn test_scalar_vs_vector_comparison_is_unsupported() {
        let err = eval(Operator::GreaterThan, 1, Vector3::new(1.0, 2.0, 3.0)).unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnsupportedOperation {
                op: Operator::GreaterThan,
                left: "Scalar".into(),
                right: "Vector".into(),
            }
        );
    }

    #[test]
    fn test_selection_follows_dominance() {
        let d = Dispatcher::new();
        // Boolean + String is concatenation, String wins
        assert_eq!(
            d.evaluate(Operator::Add, &OperandPair::new(true, "!")),
            Ok(Value::from("True!"))
        );
        assert_eq!(OperandPair::new(true, 2).dominant_kind(), ValueKind::Boolean);
        assert_eq!(OperandPair::new(2, "x").dominant_kind(), ValueKind::String);
        assert_eq!(
            OperandPair::new("x", Vector3::default()).dominant_kind(),
            ValueKind::Vector
        );
    }

    #[test]
    fn test_host_calculator_for_opaque_pair() {
        let mut d = Dispatcher::new();
        let pair = OperandPair::new(Value::opaque(Mass(1.0)), Value::opaque(Mass(2.0)));
        // no host calculator and no scalar conversion
        assert!(d.evaluate(Operator::Add, &pair).is_err());

        d.register("Mass", MassCalculator);
        assert!(d.has_host_calculator("Mass"));
        assert_eq!(d.evaluate(Operator::Add, &pair), Ok(Value::from("mass-sum")));
        let err = d.evaluate(Operator::Power, &pair).unwrap_err();
        assert!(err.to_string().contains("Mass"));
    }

    #[test]
    fn test_host_calculator_for_mixed_pair() {
        let mut d = Dispatcher::new();
        let with_scalar = OperandPair::new(Value::opaque(Mass(1.0)), 2);
        assert!(d.evaluate(Operator::Add, &with_scalar).is_err());

        d.register("Mass", MassCalculator);
        assert_eq!(d.evaluate(Operator::Add, &with_scalar), Ok(Value::from("mass-sum")));
        let flipped = OperandPair::new(2, Value::opaque(Mass(1.0)));
        assert_eq!(d.evaluate(Operator::Add, &flipped), Ok(Value::from("mass-sum")));
        let with_bool = OperandPair::new(true, Value::opaque(Mass(1.0)));
        assert_eq!(d.evaluate(Operator::Add, &with_bool), Ok(Value::from("mass-sum")));
        // vectors keep their own calculator
        let with_vector = OperandPair::new(Value::opaque(Mass(1.0)), Vector3::default());
        assert_ne!(d.evaluate(Operator::Add, &with_vector), Ok(Value::from("mass-sum")));
    }

    #[test]
    fn test_unary() {
        let d = Dispatcher::new();
        assert_eq!(d.evaluate_unary(UnaryOperator::Negate, &Value::from(3)), Ok(Value::from(-3)));
        assert_eq!(
            d.evaluate_unary(UnaryOperator::Negate, &Value::from(Vector3::new(1.0, 0.0, 0.0))),
            Ok(Value::from(Vector3::new(-1.0, -0.0, -0.0)))
        );
        assert_eq!(d.evaluate_unary(UnaryOperator::Not, &Value::from(0)), Ok(Value::from(true)));
        assert!(d.evaluate_unary(UnaryOperator::Negate, &Value::from("x")).is_err());
    }
}
