use super::{CalcResult, Calculator, OperandPair};
use crate::value::Value;
use std::cmp::Ordering;

/// Concatenation and lexicographic comparison.
///
/// Any operand converts to its display text; arithmetic other than `+` is unsupported.
pub struct StringCalculator;

impl StringCalculator {
    fn texts(pair: &OperandPair) -> (String, String) {
        (pair.left.to_string(), pair.right.to_string())
    }

    fn compare(pair: &OperandPair, test: fn(Ordering) -> bool) -> CalcResult {
        let (l, r) = Self::texts(pair);
        Ok(Value::Boolean(test(l.cmp(&r))))
    }
}

impl Calculator for StringCalculator {
    fn add(&self, pair: &OperandPair) -> CalcResult {
        let (l, r) = Self::texts(pair);
        Ok(Value::String(l + &r))
    }

    fn greater_than(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Ordering::is_gt)
    }

    fn less_than(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Ordering::is_lt)
    }

    fn greater_than_equal(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Ordering::is_ge)
    }

    fn less_than_equal(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Ordering::is_le)
    }

    fn equal(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Ordering::is_eq)
    }

    fn not_equal(&self, pair: &OperandPair) -> CalcResult {
        Self::compare(pair, Ordering::is_ne)
    }

    fn min(&self, pair: &OperandPair) -> CalcResult {
        let (l, r) = Self::texts(pair);
        Ok(Value::String(if r < l { r } else { l }))
    }

    fn max(&self, pair: &OperandPair) -> CalcResult {
        let (l, r) = Self::texts(pair);
        Ok(Value::String(if r > l { r } else { l }))
    }
}
