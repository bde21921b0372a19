use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const BRL_CURRENCY_CODE: &str = "BRL";
pub const BRL_CURRENCY_CODE_LOWER: &str = "brl";

//--------------------------------------     Centavos       ----------------------------------------------------------
/// A monetary amount in Brazilian centavos (hundredths of a Real).
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Centavos(i64);

op!(binary Centavos, Add, add);
op!(binary Centavos, Sub, sub);
op!(inplace Centavos, SubAssign, sub_assign);
op!(unary Centavos, Neg, neg);

impl Mul<i64> for Centavos {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Centavos {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in centavos: {0}")]
pub struct CentavosConversionError(String);

impl From<i64> for Centavos {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Centavos {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Centavos {}

impl TryFrom<u64> for Centavos {
    type Error = CentavosConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentavosConversionError(format!("Value {} is too large to convert to Centavos", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

// Renders as `R$ 180.00`. System messages embed this format verbatim, so it must stay stable.
impl Display for Centavos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}R$ {}.{:02}", cents / 100, cents % 100)
    }
}

impl Centavos {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_reais(reais: i64) -> Self {
        Self(reais * 100)
    }
}
