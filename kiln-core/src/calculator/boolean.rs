use super::{CalcResult, Calculator, OperandPair, ScalarCalculator};

/// Booleans paired with numeric kinds coerce to Scalar 0/1, so every
/// operator runs on the scalar rules.
pub struct BooleanCalculator;

impl Calculator for BooleanCalculator {
    fn add(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.add(pair)
    }

    fn subtract(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.subtract(pair)
    }

    fn multiply(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.multiply(pair)
    }

    fn divide(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.divide(pair)
    }

    fn power(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.power(pair)
    }

    fn greater_than(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.greater_than(pair)
    }

    fn less_than(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.less_than(pair)
    }

    fn greater_than_equal(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.greater_than_equal(pair)
    }

    fn less_than_equal(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.less_than_equal(pair)
    }

    fn equal(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.equal(pair)
    }

    fn not_equal(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.not_equal(pair)
    }

    fn min(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.min(pair)
    }

    fn max(&self, pair: &OperandPair) -> CalcResult {
        ScalarCalculator.max(pair)
    }
}
