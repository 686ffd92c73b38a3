//! Small wrapper types around third-party numeric/string crates, isolated here so the rest of
//! the kernel never spells out `rug::Integer` or `ustr::Ustr` directly.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use ustr::Ustr;

/// An interned string. Two `IString`s with the same text compare equal in O(1) and hash to the
/// same value; interning is process-global via `ustr`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IString(Ustr);

impl IString {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for IString {
    fn from(value: &str) -> Self {
        Self(Ustr::from(value))
    }
}

impl From<String> for IString {
    fn from(value: String) -> Self {
        Self(Ustr::from(&value))
    }
}

impl fmt::Display for IString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str())
    }
}

impl fmt::Debug for IString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0.as_str())
    }
}

/// Arbitrary-precision signed integer, backed by `rug::Integer`.
pub type BigInteger = rug::Integer;

/// A float literal represented as the sign/significand/exponent/radix quadruple described by the
/// atom data model, rather than as an IEEE-754 machine float. The value denoted is
/// `sign * significand * radix^exponent`.
///
/// Arithmetic is not a core-kernel concern (native handlers own it); this type exists so the
/// `Literal::Float` variant can store and compare the quadruple exactly as specified, while still
/// being convertible to/from `rug::Float` for operators (such as the bootstrap `plus`/`times`
/// handlers in `builtins`) that do want to compute with it.
#[derive(Clone, Debug)]
pub struct BigFloat {
    pub sign: i8,
    pub significand: BigInteger,
    pub exponent: i64,
    pub radix: u32,
}

impl BigFloat {
    pub fn new(sign: i8, significand: BigInteger, exponent: i64, radix: u32) -> Self {
        assert!(radix >= 2, "radix must be >= 2");
        Self {
            sign: sign.signum(),
            significand,
            exponent,
            radix,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, BigInteger::new(), 0, 10)
    }

    /// Converts to an arbitrary-precision binary float for arithmetic purposes.
    pub fn to_rug_float(&self, precision: u32) -> rug::Float {
        let mut value = rug::Float::with_val(precision, &self.significand);
        if self.exponent != 0 {
            let scale = integer_power(precision, self.radix, self.exponent.unsigned_abs() as u32);
            if self.exponent < 0 {
                value /= scale;
            } else {
                value *= scale;
            }
        }
        if self.sign < 0 {
            value = -value;
        }
        value
    }

    /// Approximates a `rug::Float` as a sign/significand/exponent triple in the given radix by
    /// reading off its exact binary mantissa and exponent (radix is then recorded as 2).
    pub fn from_rug_float(value: &rug::Float) -> Self {
        if value.is_zero() {
            return Self::zero();
        }
        let sign: i8 = if value.is_sign_negative() { -1 } else { 1 };
        let (mantissa, exponent) = value.clone().abs().to_integer_exp().unwrap_or((BigInteger::new(), 0));
        Self::new(sign, mantissa, exponent as i64, 2)
    }

    fn total_cmp_key(&self) -> (i8, &BigInteger, i64, u32) {
        (self.sign, &self.significand, self.exponent, self.radix)
    }
}

/// `base^exponent` computed at the given precision via binary exponentiation.
fn integer_power(precision: u32, base: u32, mut exponent: u32) -> rug::Float {
    let mut result = rug::Float::with_val(precision, 1);
    let mut squaring = rug::Float::with_val(precision, base);
    while exponent > 0 {
        if exponent & 1 == 1 {
            result *= squaring.clone();
        }
        squaring *= squaring.clone();
        exponent >>= 1;
    }
    result
}

impl PartialEq for BigFloat {
    fn eq(&self, other: &Self) -> bool {
        self.total_cmp_key() == other.total_cmp_key()
    }
}

impl Eq for BigFloat {}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_cmp_key().cmp(&other.total_cmp_key())
    }
}

impl Hash for BigFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sign.hash(state);
        self.significand.hash(state);
        self.exponent.hash(state);
        self.radix.hash(state);
    }
}

impl fmt::Display for BigFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}*{}^{}",
            if self.sign < 0 { "-" } else { "" },
            self.significand,
            self.radix,
            self.exponent
        )
    }
}

/// A fixed-length bit vector literal: `length` bits of `value`, most-significant-bit first.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitStringValue {
    pub length: u32,
    pub bits: bitvec::vec::BitVec<u8, bitvec::order::Msb0>,
}

impl BitStringValue {
    pub fn new(length: u32, value: u64) -> Self {
        let mut bits = bitvec::vec::BitVec::<u8, bitvec::order::Msb0>::repeat(false, length as usize);
        for i in 0..length.min(64) {
            let bit = (value >> i) & 1 == 1;
            let idx = (length - 1 - i) as usize;
            bits.set(idx, bit);
        }
        Self { length, bits }
    }
}

impl fmt::Display for BitStringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b")?;
        for bit in self.bits.iter() {
            write!(f, "{}", if *bit { '1' } else { '0' })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn istring_interns_equal_text() {
        let a = IString::from("plus");
        let b = IString::from("plus");
        assert_eq!(a, b);
    }

    #[test]
    fn bitstring_roundtrips_low_bits() {
        let bs = BitStringValue::new(8, 0b1011_0010);
        assert_eq!(bs.bits.len(), 8);
        assert_eq!(bs.to_string(), "0b10110010");
    }

    #[test]
    fn bigfloat_equal_quadruples_are_equal() {
        let a = BigFloat::new(1, BigInteger::from(314), -2, 10);
        let b = BigFloat::new(1, BigInteger::from(314), -2, 10);
        assert_eq!(a, b);
    }
}
