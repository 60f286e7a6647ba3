//! Supported currencies and the per-currency sending limits

use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

/// Static metadata for a supported currency.
#[derive(Debug, PartialEq)]
pub struct Currency {
    pub country: &'static str,
    pub code: &'static str,
    pub name: &'static str,
    /// Largest amount that may be sent from this currency.
    pub max_send_amount: f64,
    /// Identifier of the flag asset used by frontends.
    pub flag: &'static str,
}

static CURRENCIES: [Currency; 4] = [
    Currency {
        country: "Poland",
        code: "PLN",
        name: "Polish zloty",
        max_send_amount: 20000.0,
        flag: "flag_pol",
    },
    Currency {
        country: "Germany",
        code: "EUR",
        name: "Euro",
        max_send_amount: 5000.0,
        flag: "flag_ger",
    },
    Currency {
        country: "Great Britain",
        code: "GBP",
        name: "British Pound",
        max_send_amount: 1000.0,
        flag: "flag_eng",
    },
    Currency {
        country: "Ukraine",
        code: "UAH",
        name: "Hrivna",
        max_send_amount: 50000.0,
        flag: "flag_uah",
    },
];

static BUILTIN: CurrencyRegistry = CurrencyRegistry {
    currencies: &CURRENCIES,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// The requested amount is above what the sending currency allows.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Maximum sending amount: {max} {code}")]
pub struct LimitExceeded {
    pub code: CurrencyCode,
    pub max: f64,
    pub requested: f64,
}

/// A code known to be present in the registry.
///
/// Values can only be obtained through [`CurrencyRegistry`], so holding one
/// means the currency metadata is always available.
#[derive(Debug, Clone, Copy)]
pub struct CurrencyCode(&'static Currency);

impl CurrencyCode {
    pub fn as_str(&self) -> &'static str {
        self.0.code
    }

    pub fn currency(&self) -> &'static Currency {
        self.0
    }

    pub fn max_send_amount(&self) -> f64 {
        self.0.max_send_amount
    }

    /// Limit policy: only the sending side of a conversion is capped.
    pub fn check_send_limit(&self, amount: f64) -> Result<(), LimitExceeded> {
        let max = self.max_send_amount();
        if amount > max {
            return Err(LimitExceeded {
                code: *self,
                max,
                requested: amount,
            });
        }
        Ok(())
    }
}

impl PartialEq for CurrencyCode {
    fn eq(&self, other: &Self) -> bool {
        self.0.code == other.0.code
    }
}

impl Eq for CurrencyCode {}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.code)
    }
}

impl FromStr for CurrencyCode {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyRegistry::builtin().lookup(s)
    }
}

/// Closed set of currencies the converter supports.
#[derive(Debug)]
pub struct CurrencyRegistry {
    currencies: &'static [Currency],
}

impl CurrencyRegistry {
    pub fn builtin() -> &'static CurrencyRegistry {
        &BUILTIN
    }

    pub fn lookup(&'static self, code: &str) -> Result<CurrencyCode, RegistryError> {
        self.currencies
            .iter()
            .find(|c| c.code == code)
            .map(CurrencyCode)
            .ok_or_else(|| RegistryError::UnknownCurrency(code.to_string()))
    }

    /// Currencies in registry order.
    pub fn iter(&'static self) -> impl Iterator<Item = CurrencyCode> {
        self.currencies.iter().map(CurrencyCode)
    }

    /// Pair a fresh converter starts with: PLN into UAH.
    pub fn default_pair(&'static self) -> (CurrencyCode, CurrencyCode) {
        (CurrencyCode(&CURRENCIES[0]), CurrencyCode(&CURRENCIES[3]))
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}
