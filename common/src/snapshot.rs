//! Immutable exchange rate snapshot.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::error::{CommonError, Result};
use crate::identifiers::CurrencyCode;

/// One fetched rate table.
///
/// Rates are expressed relative to `base`: `rate(c)` is the amount of `c`
/// bought by one unit of `base`. Entry order is the order the upstream
/// provider returned them in.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    base: CurrencyCode,
    codes: Vec<CurrencyCode>,
    rates: HashMap<CurrencyCode, f64>,
}

impl RateSnapshot {
    /// Build a snapshot from ordered `(code, rate)` entries.
    ///
    /// A repeated code keeps its first position and its last rate. Every
    /// rate must be finite and strictly positive.
    pub fn new<I, C>(base: CurrencyCode, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (C, f64)>,
        C: Into<CurrencyCode>,
    {
        let mut codes = Vec::new();
        let mut rates = HashMap::new();

        for (code, rate) in entries {
            let code: CurrencyCode = code.into();
            let code = CurrencyCode::parse(code.as_str())?;
            if !rate.is_finite() || rate <= 0.0 {
                return Err(CommonError::InvalidRate {
                    code: code.to_string(),
                    rate,
                });
            }
            if rates.insert(code.clone(), rate).is_none() {
                codes.push(code);
            }
        }

        Ok(Self { base, codes, rates })
    }

    /// Base currency the rates are quoted against.
    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Rate for a currency code, if present.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Whether the code is present in the table.
    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    /// Currency codes in upstream order.
    pub fn codes(&self) -> &[CurrencyCode] {
        &self.codes
    }

    /// Iterate `(code, rate)` entries in upstream order.
    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> + '_ {
        self.codes.iter().map(move |code| (code, self.rates[code]))
    }

    /// Number of currencies in the table.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Serializable view of the rate table alone, as an ordered JSON object.
    pub fn table(&self) -> RateTable<'_> {
        RateTable(self)
    }
}

/// Rate table of a snapshot, serialized as `{"USD": 1.0, ...}` in upstream order.
#[derive(Debug, Clone, Copy)]
pub struct RateTable<'a>(&'a RateSnapshot);

impl Serialize for RateTable<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (code, rate) in self.0.iter() {
            map.serialize_entry(code, &rate)?;
        }
        map.end()
    }
}

impl Serialize for RateSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RateSnapshot", 2)?;
        state.serialize_field("base_code", &self.base)?;
        state.serialize_field("conversion_rates", &self.table())?;
        state.end()
    }
}
