use {
    super::error::BookingError,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Amount in minor units (cents). Non-negative by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAmount(i64);

impl MoneyAmount {
    pub fn new(cents: i64) -> Result<Self, BookingError> {
        if cents < 0 {
            return Err(BookingError::Validation(format!(
                "amount cannot be negative, got: {cents}"
            )));
        }
        Ok(Self(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed to South African Rand — multi-currency is an explicit non-goal.
/// Kept as an enum (rather than a bare string constant) so the rest of the
/// crate reads the same way it would if more variants were added later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Zar,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zar => "zar",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Currency {
    type Error = BookingError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "zar" => Ok(Self::Zar),
            other => Err(BookingError::Validation(format!("unknown currency: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: MoneyAmount,
    currency: Currency,
}

impl Money {
    pub fn new(amount: MoneyAmount, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zar(cents: i64) -> Result<Self, BookingError> {
        Ok(Self::new(MoneyAmount::new(cents)?, Currency::Zar))
    }

    pub fn amount(&self) -> MoneyAmount {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }
}
