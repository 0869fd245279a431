// ABOUTME: Arbitrary-precision numeric value with integer and decimal payloads

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ScriptError;

/// Significant digits kept when a decimal division cannot terminate.
const DIV_PRECISION: u64 = 34;

/// A script number. Integer arithmetic stays exact and integral; as soon as a
/// decimal operand appears the other side is promoted and the result is
/// decimal.
#[derive(Debug, Clone)]
pub enum Num {
    Int(BigInt),
    Dec(BigDecimal),
}

impl Num {
    /// Parse a numeric literal: `0x` prefix for hex integers, a `.` anywhere
    /// for decimals, plain digit runs for integers. A single leading sign is
    /// accepted.
    pub fn parse(text: &str) -> Result<Num, ScriptError> {
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X"))
        {
            let digits = BigInt::parse_bytes(hex.as_bytes(), 16)
                .ok_or_else(|| ScriptError::syntax(format!("bad hex literal '{text}'")))?;
            Num::Int(digits)
        } else if body.contains('.') {
            let dec = BigDecimal::from_str(body)
                .map_err(|_| ScriptError::syntax(format!("bad number literal '{text}'")))?;
            Num::Dec(dec)
        } else {
            let int = BigInt::from_str(body)
                .map_err(|_| ScriptError::syntax(format!("bad number literal '{text}'")))?;
            Num::Int(int)
        };
        Ok(if negative { value.neg() } else { value })
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Num::Int(i) => i.is_zero(),
            Num::Dec(d) => d.is_zero(),
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Num::Int(_))
    }

    /// Integer payload, if this number is an integer small enough for `i64`.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Num::Int(i) => i.to_i64(),
            Num::Dec(_) => None,
        }
    }

    fn to_dec(&self) -> BigDecimal {
        match self {
            Num::Int(i) => BigDecimal::from(i.clone()),
            Num::Dec(d) => d.clone(),
        }
    }

    fn int_pair<'a>(&'a self, rhs: &'a Num, op: &str) -> Result<(&'a BigInt, &'a BigInt), ScriptError> {
        match (self, rhs) {
            (Num::Int(a), Num::Int(b)) => Ok((a, b)),
            _ => Err(ScriptError::mismatch(format!("'{op}' needs integer operands"))),
        }
    }

    pub fn neg(&self) -> Num {
        match self {
            Num::Int(i) => Num::Int(-i),
            Num::Dec(d) => Num::Dec(-d),
        }
    }

    pub fn abs(&self) -> Num {
        match self {
            Num::Int(i) => Num::Int(i.abs()),
            Num::Dec(d) => Num::Dec(d.abs()),
        }
    }

    pub fn add(&self, rhs: &Num) -> Result<Num, ScriptError> {
        Ok(match (self, rhs) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a + b),
            _ => Num::Dec(self.to_dec() + rhs.to_dec()),
        })
    }

    pub fn sub(&self, rhs: &Num) -> Result<Num, ScriptError> {
        Ok(match (self, rhs) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a - b),
            _ => Num::Dec(self.to_dec() - rhs.to_dec()),
        })
    }

    pub fn mul(&self, rhs: &Num) -> Result<Num, ScriptError> {
        Ok(match (self, rhs) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a * b),
            _ => Num::Dec(self.to_dec() * rhs.to_dec()),
        })
    }

    /// Integer over integer truncates toward zero; any decimal operand makes
    /// this a decimal division, rounded to 34 significant digits only when
    /// the quotient does not terminate.
    pub fn div(&self, rhs: &Num) -> Result<Num, ScriptError> {
        if rhs.is_zero() {
            return Err(ScriptError::math("division by zero"));
        }
        Ok(match (self, rhs) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a / b),
            _ => {
                let da = self.to_dec();
                let db = rhs.to_dec();
                let quotient = &da / &db;
                if &quotient * &db == da {
                    Num::Dec(quotient)
                } else {
                    Num::Dec(quotient.with_prec(DIV_PRECISION))
                }
            }
        })
    }

    pub fn rem(&self, rhs: &Num) -> Result<Num, ScriptError> {
        let (a, b) = self.int_pair(rhs, "%")?;
        if b.is_zero() {
            return Err(ScriptError::math("division by zero"));
        }
        Ok(Num::Int(a % b))
    }

    /// Raise to an integer power. The result is decimal iff the base is.
    pub fn pow(&self, exp: &Num) -> Result<Num, ScriptError> {
        let Num::Int(e) = exp else {
            return Err(ScriptError::mismatch("exponent must be an integer"));
        };
        if e.is_negative() {
            return Err(ScriptError::math("negative exponent"));
        }
        let e = e
            .to_u32()
            .ok_or_else(|| ScriptError::math("exponent too large"))?;
        Ok(match self {
            Num::Int(base) => Num::Int(base.pow(e)),
            Num::Dec(base) => {
                let mut result = BigDecimal::one();
                let mut square = base.clone();
                let mut left = e;
                while left > 0 {
                    if left & 1 == 1 {
                        result = &result * &square;
                    }
                    left >>= 1;
                    if left > 0 {
                        square = &square * &square;
                    }
                }
                Num::Dec(result)
            }
        })
    }

    pub fn bit_and(&self, rhs: &Num) -> Result<Num, ScriptError> {
        let (a, b) = self.int_pair(rhs, "&")?;
        Ok(Num::Int(a & b))
    }

    pub fn bit_or(&self, rhs: &Num) -> Result<Num, ScriptError> {
        let (a, b) = self.int_pair(rhs, "|")?;
        Ok(Num::Int(a | b))
    }

    pub fn bit_xor(&self, rhs: &Num) -> Result<Num, ScriptError> {
        let (a, b) = self.int_pair(rhs, "^")?;
        Ok(Num::Int(a ^ b))
    }

    pub fn bit_not(&self) -> Result<Num, ScriptError> {
        match self {
            Num::Int(i) => Ok(Num::Int(-(i + BigInt::one()))),
            Num::Dec(_) => Err(ScriptError::mismatch("'!' needs an integer operand")),
        }
    }

    fn shift_count(&self, rhs: &Num, op: &str) -> Result<u64, ScriptError> {
        let (_, b) = self.int_pair(rhs, op)?;
        b.to_u64()
            .ok_or_else(|| ScriptError::mismatch(format!("'{op}' needs a non-negative shift count")))
    }

    pub fn shl(&self, rhs: &Num) -> Result<Num, ScriptError> {
        let n = self.shift_count(rhs, "<<")?;
        match self {
            Num::Int(a) => Ok(Num::Int(a.clone() << n)),
            Num::Dec(_) => Err(ScriptError::mismatch("'<<' needs integer operands")),
        }
    }

    /// Right shift as division by a power of two, so negative values truncate
    /// toward zero. The dialect's `>>>` form shares this behaviour.
    pub fn shr(&self, rhs: &Num) -> Result<Num, ScriptError> {
        let n = self.shift_count(rhs, ">>")?;
        match self {
            Num::Int(a) => Ok(Num::Int(a.clone() / (BigInt::one() << n))),
            Num::Dec(_) => Err(ScriptError::mismatch("'>>' needs integer operands")),
        }
    }
}

impl From<i64> for Num {
    fn from(value: i64) -> Self {
        Num::Int(BigInt::from(value))
    }
}

impl From<BigInt> for Num {
    fn from(value: BigInt) -> Self {
        Num::Int(value)
    }
}

impl Ord for Num {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a.cmp(b),
            _ => self.to_dec().cmp(&other.to_dec()),
        }
    }
}

impl PartialOrd for Num {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Num {}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::Int(i) => write!(f, "{}", i),
            Num::Dec(d) => write!(f, "{}", d),
        }
    }
}

/// Round-half-up to `digits` decimal places.
pub fn round_to_places(value: &BigDecimal, digits: i64) -> BigDecimal {
    value.with_scale_round(digits, RoundingMode::HalfUp)
}

/// Largest integer not greater than `value`.
pub fn floor_to_int(value: &BigDecimal) -> BigInt {
    let (int, _scale) = value
        .with_scale_round(0, RoundingMode::Floor)
        .into_bigint_and_exponent();
    int
}
