use super::{CalcResult, Calculator, OperandPair, Operator};
use crate::value::{ScalarValue, Value};

/// Numeric arithmetic and total ordering
pub struct ScalarCalculator;

impl ScalarCalculator {
    fn compare(pair: &OperandPair, op: Operator, test: fn(f64, f64) -> bool) -> CalcResult {
        let (l, r) = pair.scalars(op)?;
        Ok(Value::Boolean(test(l.as_f64(), r.as_f64())))
    }

    fn arith(pair: &OperandPair, op: Operator, f: fn(ScalarValue, ScalarValue) -> ScalarValue) -> CalcResult {
        let (l, r) = pair.scalars(op)?;
        Ok(Value::Scalar(f(l, r)))
    }
}

impl Calculator for ScalarCalculator {
    fn add(&self, pair: &OperandPair) -> CalcResult {
        Self::arith(pair, Operator::Add, ScalarValue::add)
    }

    fn subtract(&self, pair: &OperandPair) -> CalcResult {
        Self::arith(pair, Operator::Subtract, ScalarValue::sub)
    }

    fn multiply(&self, pair: &OperandPair) -> CalcResult {
        Self::arith(pair, Operator::Multiply, ScalarValue::mul)
    }

    fn divide(&self, pair: &OperandPair) -> CalcResult {
        Self::arith(pair, Operator::Divide, ScalarValue::div)
    }

    fn power(&self, pair: &OperandPair) -> CalcResult {
        Self::arith(pair, Operator::Power, ScalarValue::pow)
    }

    fn greater_than(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Operator::GreaterThan, |l, r| l > r)
    }

    fn less_than(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Operator::LessThan, |l, r| l < r)
    }

    fn greater_than_equal(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Operator::GreaterThanEqual, |l, r| l >= r)
    }

    fn less_than_equal(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Operator::LessThanEqual, |l, r| l <= r)
    }

    fn equal(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Operator::Equal, |l, r| l == r)
    }

    fn not_equal(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Operator::NotEqual, |l, r| l != r)
    }

    // Min/Max hand back one of the converted operands, never a blend
    fn min(&self, pair: &OperandPair) -> CalcResult {
        let (l, r) = pair.scalars(Operator::Min)?;
        Ok(Value::Scalar(if r.as_f64() < l.as_f64() { r } else { l }))
    }

    fn max(&self, pair: &OperandPair) -> CalcResult {
        let (l, r) = pair.scalars(Operator::Max)?;
        Ok(Value::Scalar(if r.as_f64() > l.as_f64() { r } else { l }))
    }
}
