//! Script-visible values
//!
//! A closed set of kinds: Scalar, String, Boolean, Vector and Opaque host
//! objects. Values are immutable once produced; every operator builds a new one.

use crate::error::DispatchError;
use std::fmt;
use std::rc::Rc;

// ==================== ValueKind ====================

/// Kind tag of a [`Value`], ordered by dispatch dominance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ValueKind {
    Scalar,
    String,
    Boolean,
    Vector,
    Opaque,
}

impl ValueKind {
    /// Rank used to pick the calculator for an operand pair (higher wins)
    pub fn dominance(self) -> u8 {
        match self {
            ValueKind::Vector => 4,
            ValueKind::String => 3,
            ValueKind::Boolean => 2,
            ValueKind::Scalar => 1,
            ValueKind::Opaque => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Scalar => "Scalar",
            ValueKind::String => "String",
            ValueKind::Boolean => "Boolean",
            ValueKind::Vector => "Vector",
            ValueKind::Opaque => "Opaque",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ==================== ScalarValue ====================

/// Numeric value carrying an "is integer" flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    Int(i32),
    Double(f64),
}

impl ScalarValue {
    /// Convert any value to a scalar.
    ///
    /// Booleans become 0/1, opaque objects use their own scalar conversion.
    pub fn create(value: &Value) -> Result<ScalarValue, DispatchError> {
        match value {
            Value::Scalar(s) => Ok(*s),
            Value::Boolean(b) => Ok(ScalarValue::Int(i32::from(*b))),
            Value::Opaque(obj) => obj
                .to_scalar()
                .map(ScalarValue::from)
                .ok_or_else(|| DispatchError::conversion(value, ValueKind::Scalar)),
            _ => Err(DispatchError::conversion(value, ValueKind::Scalar)),
        }
    }

    pub fn is_int(self) -> bool {
        matches!(self, ScalarValue::Int(_))
    }

    pub fn as_f64(self) -> f64 {
        match self {
            ScalarValue::Int(n) => f64::from(n),
            ScalarValue::Double(d) => d,
        }
    }

    /// Widen an i64 result, keeping the int flag while it fits 32 bits
    fn from_wide(n: i64) -> ScalarValue {
        match i32::try_from(n) {
            Ok(small) => ScalarValue::Int(small),
            Err(_) => ScalarValue::Double(n as f64),
        }
    }

    pub fn add(self, rhs: ScalarValue) -> ScalarValue {
        match (self, rhs) {
            (ScalarValue::Int(a), ScalarValue::Int(b)) => Self::from_wide(i64::from(a) + i64::from(b)),
            _ => ScalarValue::Double(self.as_f64() + rhs.as_f64()),
        }
    }

    pub fn sub(self, rhs: ScalarValue) -> ScalarValue {
        match (self, rhs) {
            (ScalarValue::Int(a), ScalarValue::Int(b)) => Self::from_wide(i64::from(a) - i64::from(b)),
            _ => ScalarValue::Double(self.as_f64() - rhs.as_f64()),
        }
    }

    pub fn mul(self, rhs: ScalarValue) -> ScalarValue {
        match (self, rhs) {
            (ScalarValue::Int(a), ScalarValue::Int(b)) => Self::from_wide(i64::from(a) * i64::from(b)),
            _ => ScalarValue::Double(self.as_f64() * rhs.as_f64()),
        }
    }

    /// Always float-typed; division by zero yields an infinity or NaN
    pub fn div(self, rhs: ScalarValue) -> ScalarValue {
        ScalarValue::Double(self.as_f64() / rhs.as_f64())
    }

    pub fn pow(self, rhs: ScalarValue) -> ScalarValue {
        ScalarValue::Double(self.as_f64().powf(rhs.as_f64()))
    }

    pub fn negate(self) -> ScalarValue {
        match self {
            ScalarValue::Int(n) => Self::from_wide(-i64::from(n)),
            ScalarValue::Double(d) => ScalarValue::Double(-d),
        }
    }
}

impl From<i32> for ScalarValue {
    fn from(n: i32) -> Self {
        ScalarValue::Int(n)
    }
}

impl From<f64> for ScalarValue {
    fn from(d: f64) -> Self {
        ScalarValue::Double(d)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(n) => write!(f, "{n}"),
            ScalarValue::Double(d) => write!(f, "{d}"),
        }
    }
}

// ==================== Vector3 ====================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    pub fn scale(self, factor: f64) -> Vector3 {
        Vector3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn dot(self, rhs: Vector3) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Vector3::new(x, y, z)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V({}, {}, {})", self.x, self.y, self.z)
    }
}

// ==================== HostObject ====================

/// A value produced by the host and carried through scripts untouched.
///
/// Hosts that want arithmetic on their objects either expose a scalar
/// conversion here or register a [`Calculator`](crate::Calculator) for
/// [`kind_name`](HostObject::kind_name) with the dispatcher.
pub trait HostObject: fmt::Debug {
    /// Dispatcher key and the kind name shown in error messages
    fn kind_name(&self) -> &str;

    fn to_scalar(&self) -> Option<f64> {
        None
    }

    /// Text used by `Print` and string concatenation
    fn describe(&self) -> String {
        self.kind_name().to_string()
    }
}

// ==================== Value ====================

#[derive(Debug, Clone)]
pub enum Value {
    Scalar(ScalarValue),
    String(String),
    Boolean(bool),
    Vector(Vector3),
    Opaque(Rc<dyn HostObject>),
}

impl Value {
    /// Normalize a raw host primitive (or an existing value) into a Value.
    ///
    /// Idempotent: creating from a value returns an equal value.
    pub fn create(raw: impl Into<Value>) -> Value {
        raw.into()
    }

    pub fn opaque(object: impl HostObject + 'static) -> Value {
        Value::Opaque(Rc::new(object))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::String(_) => ValueKind::String,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Vector(_) => ValueKind::Vector,
            Value::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// Kind name for messages; opaque values report their host kind
    pub fn kind_name(&self) -> String {
        match self {
            Value::Opaque(obj) => obj.kind_name().to_string(),
            other => other.kind().name().to_string(),
        }
    }

    /// Condition semantics used by conditional jumps and `Not`
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Scalar(s) => s.as_f64() != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Vector(_) => true,
            Value::Opaque(obj) => obj.to_scalar().map_or(true, |n| n != 0.0),
        }
    }

    pub fn as_scalar(&self) -> Option<ScalarValue> {
        match self {
            Value::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vector3> {
        match self {
            Value::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Structural equality; opaque values compare by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{s}"),
            Value::String(s) => f.write_str(s),
            Value::Boolean(true) => f.write_str("True"),
            Value::Boolean(false) => f.write_str("False"),
            Value::Vector(v) => write!(f, "{v}"),
            Value::Opaque(obj) => f.write_str(&obj.describe()),
        }
    }
}

// ==================== Conversions ====================

impl From<ScalarValue> for Value {
    fn from(s: ScalarValue) -> Self {
        Value::Scalar(s)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Scalar(ScalarValue::Int(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(ScalarValue::from_wide(n))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Scalar(ScalarValue::Double(d))
    }
}

impl From<f32> for Value {
    fn from(d: f32) -> Self {
        Value::Scalar(ScalarValue::Double(f64::from(d)))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::String(c.to_string())
    }
}

impl From<Vector3> for Value {
    fn from(v: Vector3) -> Self {
        Value::Vector(v)
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl From<Rc<dyn HostObject>> for Value {
    fn from(obj: Rc<dyn HostObject>) -> Self {
        Value::Opaque(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Thrust(f64);

    impl HostObject for Thrust {
        fn kind_name(&self) -> &str {
            "Thrust"
        }

        fn to_scalar(&self) -> Option<f64> {
            Some(self.0)
        }
    }

    #[test]
    fn test_create_is_idempotent() {
        let raw: Vec<Value> = vec![
            Value::create(3),
            Value::create(2.5),
            Value::create(true),
            Value::create("ab"),
            Value::create(Vector3::new(1.0, 2.0, 3.0)),
            Value::create(i64::MAX),
        ];
        for v in raw {
            assert_eq!(Value::create(v.clone()), v);
            assert_eq!(Value::create(&v), v);
        }
    }

    #[test]
    fn test_int_arithmetic_keeps_int_flag() {
        assert_eq!(ScalarValue::Int(2).add(ScalarValue::Int(3)), ScalarValue::Int(5));
        assert_eq!(ScalarValue::Int(6).mul(ScalarValue::Int(7)), ScalarValue::Int(42));
        assert!(ScalarValue::Int(1).add(ScalarValue::Double(1.0)).as_f64() == 2.0);
        assert!(!ScalarValue::Int(1).add(ScalarValue::Double(1.0)).is_int());
    }

    #[test]
    fn test_int_overflow_widens() {
        let sum = ScalarValue::Int(i32::MAX).add(ScalarValue::Int(1));
        assert_eq!(sum, ScalarValue::Double(f64::from(i32::MAX) + 1.0));
        assert_eq!(ScalarValue::Int(i32::MIN).negate(), ScalarValue::Double(2147483648.0));
    }

    #[test]
    fn test_divide_is_float() {
        assert_eq!(ScalarValue::Int(6).div(ScalarValue::Int(3)), ScalarValue::Double(2.0));
        assert!(ScalarValue::Int(1).div(ScalarValue::Int(0)).as_f64().is_infinite());
    }

    #[test]
    fn test_scalar_create_conversions() {
        assert_eq!(ScalarValue::create(&Value::from(true)), Ok(ScalarValue::Int(1)));
        assert_eq!(
            ScalarValue::create(&Value::opaque(Thrust(4.5))),
            Ok(ScalarValue::Double(4.5))
        );
        assert!(ScalarValue::create(&Value::from("x")).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(5).to_string(), "5");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(true).to_string(), "True");
        assert_eq!(Value::from(Vector3::new(1.0, 1.0, 0.0)).to_string(), "V(1, 1, 0)");
        assert_eq!(Value::opaque(Thrust(1.0)).to_string(), "Thrust");
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::from(1).is_truthy());
        assert!(!Value::from(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::opaque(Thrust(0.0)).is_truthy());
    }

    #[test]
    fn test_opaque_identity_equality() {
        let a = Value::opaque(Thrust(1.0));
        let b = Value::opaque(Thrust(1.0));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.kind_name(), "Thrust");
    }

    #[test]
    fn test_dominance_order() {
        assert!(ValueKind::Vector.dominance() > ValueKind::String.dominance());
        assert!(ValueKind::String.dominance() > ValueKind::Boolean.dominance());
        assert!(ValueKind::Boolean.dominance() > ValueKind::Scalar.dominance());
        assert!(ValueKind::Scalar.dominance() > ValueKind::Opaque.dominance());
    }
}
