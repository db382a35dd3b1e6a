//! Currency conversion types and operations.

use exrates_common::{CurrencyCode, RateSnapshot};
use serde::Serialize;

use crate::error::{FxError, FxResult};

/// Represents a completed currency conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    /// Input amount.
    pub amount: f64,
    /// Source currency.
    pub from: CurrencyCode,
    /// Target currency.
    pub to: CurrencyCode,
    /// Cross rate applied: units of `to` per unit of `from`.
    pub rate: f64,
    /// Output amount.
    pub converted_amount: f64,
    /// Base currency of the snapshot used.
    pub base: CurrencyCode,
}

impl Conversion {
    /// Convert `amount` using the rates of `snapshot`.
    ///
    /// Computes `amount * (rate[to] / rate[from])` in plain `f64` with no
    /// rounding. Every code missing from the snapshot is reported.
    pub fn compute(
        snapshot: &RateSnapshot,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> FxResult<Self> {
        let rate = cross_rate(snapshot, from, to)?;

        Ok(Self {
            amount,
            from: from.clone(),
            to: to.clone(),
            rate,
            converted_amount: amount * rate,
            base: snapshot.base().clone(),
        })
    }
}

/// Cross rate between two codes of a snapshot.
pub fn cross_rate(
    snapshot: &RateSnapshot,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> FxResult<f64> {
    let (from_rate, to_rate) = lookup_pair(snapshot, from, to)?;
    Ok(to_rate / from_rate)
}

fn lookup_pair(
    snapshot: &RateSnapshot,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> FxResult<(f64, f64)> {
    match (snapshot.rate(from.as_str()), snapshot.rate(to.as_str())) {
        (Some(from_rate), Some(to_rate)) => Ok((from_rate, to_rate)),
        (from_rate, to_rate) => {
            let mut codes = Vec::with_capacity(2);
            if from_rate.is_none() {
                codes.push(from.clone());
            }
            if to_rate.is_none() && !codes.contains(to) {
                codes.push(to.clone());
            }
            Err(FxError::UnknownCurrency { codes })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> RateSnapshot {
        RateSnapshot::new(
            CurrencyCode::usd(),
            [("USD", 1.0), ("EUR", 0.9), ("JPY", 150.0)],
        )
        .unwrap()
    }

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s)
    }

    #[test]
    fn test_usd_to_eur() {
        let conversion = Conversion::compute(&sample(), 100.0, &code("USD"), &code("EUR")).unwrap();

        assert_eq!(conversion.converted_amount, 90.0);
        assert_eq!(conversion.rate, 0.9);
        assert_eq!(conversion.base, CurrencyCode::usd());
    }

    #[test]
    fn test_eur_to_jpy() {
        let conversion = Conversion::compute(&sample(), 100.0, &code("EUR"), &code("JPY")).unwrap();

        assert!((conversion.converted_amount - 16666.666666666664).abs() < 1e-9);
        assert_eq!(format!("{:.2}", conversion.converted_amount), "16666.67");
    }

    #[test]
    fn test_unknown_codes_are_reported() {
        let snapshot = sample();

        let err = Conversion::compute(&snapshot, 10.0, &code("USD"), &code("ZZZ")).unwrap_err();
        assert!(matches!(
            err,
            FxError::UnknownCurrency { ref codes } if codes == &vec![code("ZZZ")]
        ));

        let err = Conversion::compute(&snapshot, 10.0, &code("AAA"), &code("ZZZ")).unwrap_err();
        assert!(matches!(err, FxError::UnknownCurrency { ref codes } if codes.len() == 2));

        let err = Conversion::compute(&snapshot, 10.0, &code("ZZZ"), &code("ZZZ")).unwrap_err();
        assert!(matches!(err, FxError::UnknownCurrency { ref codes } if codes.len() == 1));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let result = cross_rate(&sample(), &code("usd"), &code("EUR"));
        assert!(matches!(result, Err(FxError::UnknownCurrency { .. })));
    }

    #[test]
    fn test_negative_and_zero_amounts() {
        let snapshot = sample();
        let negative = Conversion::compute(&snapshot, -10.0, &code("USD"), &code("JPY")).unwrap();
        assert_eq!(negative.converted_amount, -1500.0);

        let zero = Conversion::compute(&snapshot, 0.0, &code("EUR"), &code("JPY")).unwrap();
        assert_eq!(zero.converted_amount, 0.0);
    }

    fn rate_table() -> impl Strategy<Value = Vec<(String, f64)>> {
        prop::collection::btree_map("[A-Z]{3}", 1e-4f64..1e5, 1..20)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_identity_conversion(
            entries in rate_table(),
            amount in -1e9f64..1e9,
            idx in any::<prop::sample::Index>(),
        ) {
            let snapshot = RateSnapshot::new(CurrencyCode::usd(), entries.clone()).unwrap();
            let a = code(&entries[idx.index(entries.len())].0);

            let conversion = Conversion::compute(&snapshot, amount, &a, &a).unwrap();
            prop_assert_eq!(conversion.converted_amount, amount);
        }

        #[test]
        fn prop_matches_cross_rate(
            entries in rate_table(),
            amount in -1e9f64..1e9,
            i in any::<prop::sample::Index>(),
            j in any::<prop::sample::Index>(),
        ) {
            let snapshot = RateSnapshot::new(CurrencyCode::usd(), entries.clone()).unwrap();
            let (a, rate_a) = &entries[i.index(entries.len())];
            let (b, rate_b) = &entries[j.index(entries.len())];

            let conversion = Conversion::compute(&snapshot, amount, &code(a), &code(b)).unwrap();
            prop_assert_eq!(conversion.converted_amount, amount * (rate_b / rate_a));
        }
    }
}
