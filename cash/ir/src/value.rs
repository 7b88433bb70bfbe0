//! Fixed-width bit-vector values.
use baa::{BitVecOps, BitVecValue};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};
use std::{cmp::Ordering, fmt};

/// A `width`-bit unsigned bit pattern. Every constructor truncates to the
/// declared width; signed views are computed on demand.
#[derive(Clone)]
pub struct Value(BitVecValue);

fn mask(width: u32) -> BigUint {
    (BigUint::one() << width as usize) - BigUint::one()
}

impl Value {
    pub fn zero(width: u32) -> Self {
        Value(BitVecValue::zero(width))
    }

    pub fn from_big_uint(v: &BigUint, width: u32) -> Self {
        let v = v & mask(width);
        Value(BitVecValue::from_big_uint(&v, width))
    }

    /// Two's complement encoding of `v` in `width` bits.
    pub fn from_big_int(v: &BigInt, width: u32) -> Self {
        let modulus = BigInt::one() << width as usize;
        let wrapped = ((v % &modulus) + &modulus) % &modulus;
        Self::from_big_uint(wrapped.magnitude(), width)
    }

    pub fn from_u64(v: u64, width: u32) -> Self {
        Self::from_big_uint(&BigUint::from(v), width)
    }

    pub fn from_i64(v: i64, width: u32) -> Self {
        Self::from_big_int(&BigInt::from(v), width)
    }

    pub fn from_bool(b: bool) -> Self {
        Self::from_u64(b as u64, 1)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn to_big_uint(&self) -> BigUint {
        self.0.to_big_uint()
    }

    /// Signed interpretation of the bit pattern.
    pub fn to_big_int(&self) -> BigInt {
        let v = self.to_big_uint();
        if self.msb() {
            BigInt::from_biguint(Sign::Plus, v) - (BigInt::one() << self.width() as usize)
        } else {
            BigInt::from_biguint(Sign::Plus, v)
        }
    }

    /// `None` if the value does not fit in 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        self.to_big_uint().to_u64()
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.to_big_int().to_i64()
    }

    pub fn is_zero(&self) -> bool {
        self.to_big_uint().is_zero()
    }

    pub fn is_true(&self) -> bool {
        !self.is_zero()
    }

    pub fn msb(&self) -> bool {
        self.width() > 0 && self.to_big_uint().bit(self.width() as u64 - 1)
    }

    /// Change the width, sign-extending when `signed` and zero-extending
    /// otherwise. Narrowing always truncates.
    pub fn resize(&self, width: u32, signed: bool) -> Value {
        if signed {
            Self::from_big_int(&self.to_big_int(), width)
        } else {
            Self::from_big_uint(&self.to_big_uint(), width)
        }
    }

    pub fn truncate(&self, width: u32) -> Value {
        self.resize(width, false)
    }

    pub fn compare(&self, other: &Value, signed: bool) -> Ordering {
        if signed {
            self.to_big_int().cmp(&other.to_big_int())
        } else {
            self.to_big_uint().cmp(&other.to_big_uint())
        }
    }

    // Arithmetic below is modulo 2^width of `self`; callers extend the
    // operands to a common width first.

    pub fn add(&self, rhs: &Value) -> Value {
        Self::from_big_uint(&(self.to_big_uint() + rhs.to_big_uint()), self.width())
    }

    pub fn sub(&self, rhs: &Value) -> Value {
        Self::from_big_int(&(self.to_big_int() - rhs.to_big_int()), self.width())
    }

    pub fn mul(&self, rhs: &Value) -> Value {
        Self::from_big_uint(&(self.to_big_uint() * rhs.to_big_uint()), self.width())
    }

    /// Quotient truncated toward zero. `None` on division by zero.
    pub fn checked_div(&self, rhs: &Value, signed: bool) -> Option<Value> {
        if rhs.is_zero() {
            return None;
        }
        Some(if signed {
            Self::from_big_int(&(self.to_big_int() / rhs.to_big_int()), self.width())
        } else {
            Self::from_big_uint(&(self.to_big_uint() / rhs.to_big_uint()), self.width())
        })
    }

    /// Remainder with the sign of the dividend. `None` on division by zero.
    pub fn checked_rem(&self, rhs: &Value, signed: bool) -> Option<Value> {
        if rhs.is_zero() {
            return None;
        }
        Some(if signed {
            Self::from_big_int(&(self.to_big_int() % rhs.to_big_int()), self.width())
        } else {
            Self::from_big_uint(&(self.to_big_uint() % rhs.to_big_uint()), self.width())
        })
    }

    pub fn and(&self, rhs: &Value) -> Value {
        Self::from_big_uint(&(self.to_big_uint() & rhs.to_big_uint()), self.width())
    }

    pub fn or(&self, rhs: &Value) -> Value {
        Self::from_big_uint(&(self.to_big_uint() | rhs.to_big_uint()), self.width())
    }

    pub fn xor(&self, rhs: &Value) -> Value {
        Self::from_big_uint(&(self.to_big_uint() ^ rhs.to_big_uint()), self.width())
    }

    pub fn not(&self) -> Value {
        Self::from_big_uint(&(self.to_big_uint() ^ mask(self.width())), self.width())
    }

    pub fn neg(&self) -> Value {
        Self::from_big_int(&-self.to_big_int(), self.width())
    }

    pub fn shl(&self, amount: u64) -> Value {
        if amount >= self.width() as u64 {
            return Self::zero(self.width());
        }
        Self::from_big_uint(&(self.to_big_uint() << amount as usize), self.width())
    }

    /// Logical shift, or arithmetic when `signed`.
    pub fn shr(&self, amount: u64, signed: bool) -> Value {
        let amount = amount.min(self.width() as u64) as usize;
        if signed {
            Self::from_big_int(&(self.to_big_int() >> amount), self.width())
        } else {
            Self::from_big_uint(&(self.to_big_uint() >> amount), self.width())
        }
    }

    /// Lowercase hex digits without prefix.
    pub fn to_hex_string(&self) -> String {
        format!("{:x}", self.to_big_uint())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width() && self.to_big_uint() == other.to_big_uint()
    }
}

impl Eq for Value {}

/// Rendered as a sized Verilog hex literal, e.g. `4'ha`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'h{}", self.width(), self.to_hex_string())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({self})")
    }
}
