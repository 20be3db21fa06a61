//! Operators over tagged values.
//!
//! Both operands must carry the same tag; there is no implicit coercion.
//! Integer and character arithmetic is checked.

use std::cmp::Ordering;

use nixvm_foundation::{Error, Result, Value};

fn mismatch(name: &str, a: Value, b: Value) -> Error {
    Error::invalid_data_type(format!(
        "`{name}` is not defined for {} and {}",
        a.value_type(),
        b.value_type()
    ))
}

fn overflow(name: &str) -> Error {
    Error::invalid_data_type(format!("integer overflow in `{name}`"))
}

fn division_by_zero(name: &str) -> Error {
    Error::invalid_data_type(format!("division by zero in `{name}`"))
}

/// Applies an integer operation to two characters' code points.
fn char_op(name: &str, x: char, y: char, op: fn(i64, i64) -> Option<i64>) -> Result<Value> {
    let n = op(i64::from(u32::from(x)), i64::from(u32::from(y))).ok_or_else(|| overflow(name))?;
    u32::try_from(n)
        .ok()
        .and_then(char::from_u32)
        .map(Value::Char)
        .ok_or_else(|| {
            Error::invalid_data_type(format!("`{name}` produced invalid character code {n}"))
        })
}

fn arithmetic(
    name: &str,
    a: Value,
    b: Value,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f32, f32) -> f32,
    double: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => int(x, y).map(Value::Int).ok_or_else(|| overflow(name)),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(float(x, y))),
        (Value::Double(x), Value::Double(y)) => Ok(Value::Double(double(x, y))),
        (Value::Char(x), Value::Char(y)) => char_op(name, x, y, int),
        _ => Err(mismatch(name, a, b)),
    }
}

/// `a + b`
pub(crate) fn plus(a: Value, b: Value) -> Result<Value> {
    arithmetic("plus", a, b, i64::checked_add, |x, y| x + y, |x, y| x + y)
}

/// `a - b`
pub(crate) fn minus(a: Value, b: Value) -> Result<Value> {
    arithmetic("minus", a, b, i64::checked_sub, |x, y| x - y, |x, y| x - y)
}

/// `a * b`
pub(crate) fn mul(a: Value, b: Value) -> Result<Value> {
    arithmetic("mul", a, b, i64::checked_mul, |x, y| x * y, |x, y| x * y)
}

fn is_zero(v: Value) -> bool {
    match v {
        Value::Int(n) => n == 0,
        Value::Float(n) => n == 0.0,
        Value::Double(n) => n == 0.0,
        Value::Char(c) => c == '\0',
        Value::Ref(_) => false,
    }
}

/// `a / b`, truncating for integers.
pub(crate) fn div(a: Value, b: Value) -> Result<Value> {
    if a.same_tag(&b) && is_zero(b) {
        return Err(division_by_zero("div"));
    }
    arithmetic("div", a, b, i64::checked_div, |x, y| x / y, |x, y| x / y)
}

/// `a % b`, defined for integers and characters only.
pub(crate) fn rem(a: Value, b: Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(_), Value::Int(0)) | (Value::Char(_), Value::Char('\0')) => {
            Err(division_by_zero("mod"))
        }
        (Value::Int(x), Value::Int(y)) => x
            .checked_rem(y)
            .map(Value::Int)
            .ok_or_else(|| overflow("mod")),
        (Value::Char(x), Value::Char(y)) => char_op("mod", x, y, i64::checked_rem),
        _ => Err(mismatch("mod", a, b)),
    }
}

fn ordering(name: &str, a: Value, b: Value) -> Result<Option<Ordering>> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Some(x.cmp(&y))),
        (Value::Float(x), Value::Float(y)) => Ok(x.partial_cmp(&y)),
        (Value::Double(x), Value::Double(y)) => Ok(x.partial_cmp(&y)),
        (Value::Char(x), Value::Char(y)) => Ok(Some(x.cmp(&y))),
        _ => Err(mismatch(name, a, b)),
    }
}

/// Compares two values, yielding `Int(1)` or `Int(0)`.
///
/// Unordered floats (NaN) compare unequal to everything.
pub(crate) fn compare(name: &str, a: Value, b: Value, pred: fn(Ordering) -> bool) -> Result<Value> {
    let holds = ordering(name, a, b)?.is_some_and(pred);
    Ok(Value::Int(i64::from(holds)))
}

/// `a != b`, yielding `Int(1)` or `Int(0)`.
pub(crate) fn not_equal(a: Value, b: Value) -> Result<Value> {
    let equal = ordering("neq", a, b)?.is_some_and(Ordering::is_eq);
    Ok(Value::Int(i64::from(!equal)))
}

/// Truthiness of a condition. References cannot be conditions.
pub(crate) fn truthy(v: Value) -> Result<bool> {
    v.truthiness().ok_or_else(|| {
        Error::invalid_data_type(format!("{} cannot be used as a condition", v.value_type()))
    })
}

/// Logical and/or over truthiness, yielding `Int(1)` or `Int(0)`.
pub(crate) fn logical(name: &str, a: Value, b: Value, op: fn(bool, bool) -> bool) -> Result<Value> {
    if !a.same_tag(&b) || a.is_heap_ref() {
        return Err(mismatch(name, a, b));
    }
    Ok(Value::Int(i64::from(op(truthy(a)?, truthy(b)?))))
}
