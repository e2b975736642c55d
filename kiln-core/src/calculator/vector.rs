use super::{CalcResult, Calculator, OperandPair, Operator};
use crate::value::{ScalarValue, Value, Vector3};

/// Component-wise sums, scaling and the dot product.
///
/// Vectors have no ordering; only `==` and `<>` compare them.
pub struct VectorCalculator;

impl VectorCalculator {
    fn scaling(pair: &OperandPair, op: Operator) -> Result<(Vector3, f64), crate::DispatchError> {
        match (&pair.left, &pair.right) {
            (Value::Vector(v), other) | (other, Value::Vector(v)) if other.as_vector().is_none() => {
                let factor = ScalarValue::create(other).map_err(|_| pair.unsupported(op))?;
                Ok((*v, factor.as_f64()))
            }
            _ => Err(pair.unsupported(op)),
        }
    }
}

impl Calculator for VectorCalculator {
    fn add(&self, pair: &OperandPair) -> CalcResult {
        let (l, r) = pair.vectors().ok_or_else(|| pair.unsupported(Operator::Add))?;
        Ok(Value::Vector(l.add(r)))
    }

    fn subtract(&self, pair: &OperandPair) -> CalcResult {
        let (l, r) = pair.vectors().ok_or_else(|| pair.unsupported(Operator::Subtract))?;
        Ok(Value::Vector(l.sub(r)))
    }

    fn multiply(&self, pair: &OperandPair) -> CalcResult {
        if let Some((l, r)) = pair.vectors() {
            return Ok(Value::from(l.dot(r)));
        }
        let (v, factor) = Self::scaling(pair, Operator::Multiply)?;
        Ok(Value::Vector(v.scale(factor)))
    }

    fn divide(&self, pair: &OperandPair) -> CalcResult {
        // only vector / scalar
        if pair.left.as_vector().is_none() {
            return Err(pair.unsupported(Operator::Divide));
        }
        let (v, divisor) = Self::scaling(pair, Operator::Divide)?;
        Ok(Value::Vector(v.scale(1.0 / divisor)))
    }

    fn equal(&self, pair: &OperandPair) -> CalcResult {
        Ok(Value::Boolean(pair.vectors().is_some_and(|(l, r)| l == r)))
    }

    fn not_equal(&self, pair: &OperandPair) -> CalcResult {
        Ok(Value::Boolean(!pair.vectors().is_some_and(|(l, r)| l == r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Vector3 = Vector3::new(1.0, 0.0, 0.0);
    const Y: Vector3 = Vector3::new(0.0, 1.0, 0.0);

    fn run(op: Operator, l: impl Into<Value>, r: impl Into<Value>) -> CalcResult {
        VectorCalculator.evaluate(op, &OperandPair::new(l, r))
    }

    #[test]
    fn test_sum_and_difference() {
        assert_eq!(run(Operator::Add, X, Y), Ok(Value::from(Vector3::new(1.0, 1.0, 0.0))));
        assert_eq!(run(Operator::Subtract, X, X), Ok(Value::from(Vector3::default())));
        assert!(run(Operator::Add, X, 1).is_err());
    }

    #[test]
    fn test_scaling_both_sides() {
        let doubled = Value::from(Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(run(Operator::Multiply, X, 2), Ok(doubled.clone()));
        assert_eq!(run(Operator::Multiply, 2, X), Ok(doubled));
        assert_eq!(
            run(Operator::Divide, Vector3::new(4.0, 2.0, 0.0), 2),
            Ok(Value::from(Vector3::new(2.0, 1.0, 0.0)))
        );
        assert!(run(Operator::Divide, 2, X).is_err());
    }

    #[test]
    fn test_dot_product() {
        assert_eq!(run(Operator::Multiply, X, Y), Ok(Value::from(0.0)));
        assert_eq!(
            run(Operator::Multiply, Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0)),
            Ok(Value::from(32.0))
        );
    }

    #[test]
    fn test_equality_only() {
        assert_eq!(run(Operator::Equal, X, X), Ok(Value::from(true)));
        assert_eq!(run(Operator::NotEqual, X, Y), Ok(Value::from(true)));
        assert_eq!(run(Operator::Equal, X, 1), Ok(Value::from(false)));
        assert_eq!(run(Operator::NotEqual, "x", X), Ok(Value::from(true)));
        for op in [Operator::GreaterThan, Operator::LessThanEqual, Operator::Min, Operator::Power] {
            assert!(run(op, X, Y).is_err(), "{op}");
        }
    }
}
