//! Time-series reconciliation.
//!
//! Independently sampled series are merged onto one calendar made of the
//! dates actually observed in any input (no synthetic daily grid). Each
//! series is forward-filled from a last-known cursor that starts at `0.0`,
//! so every row carries a value for every key.
//!
//! `align` is generic over the key type and is shared by yield/rate
//! reconciliation (`reconcile`) and per-pool TVL alignment (`align_tvl`).

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{
    RawSeriesPoint, ReconciledPoint, SeriesInputs, SeriesKey, SpreadKey, TvlRow,
};

/// Align keyed series onto the union of their observed dates.
///
/// Rows are returned in ascending date order. For each key, a date without
/// an observation takes the key's last known value (`0.0` before the first
/// observation). When a key has several observations on one date, the last
/// one in input order wins.
pub fn align<K: Ord + Clone>(inputs: &BTreeMap<K, Vec<RawSeriesPoint>>) -> Vec<(NaiveDate, BTreeMap<K, f64>)> {
    // date -> (key -> observed value); BTreeMap keeps the calendar sorted.
    let mut observed: BTreeMap<NaiveDate, BTreeMap<&K, f64>> = BTreeMap::new();
    for (key, points) in inputs {
        for p in points {
            observed.entry(p.date).or_default().insert(key, p.value);
        }
    }

    let mut cursors: BTreeMap<&K, f64> = inputs.keys().map(|k| (k, 0.0)).collect();
    let mut rows = Vec::with_capacity(observed.len());

    for (date, on_date) in observed {
        let mut values = BTreeMap::new();
        for (key, cursor) in cursors.iter_mut() {
            if let Some(v) = on_date.get(key) {
                *cursor = *v;
            }
            values.insert((*key).clone(), *cursor);
        }
        rows.push((date, values));
    }

    rows
}

/// Reconcile pool yields and risk-free rates into spread-annotated rows.
pub fn reconcile(inputs: &SeriesInputs) -> Vec<ReconciledPoint> {
    align(inputs)
        .into_iter()
        .map(|(date, values)| {
            let derived_spreads = derive_spreads(&values);
            ReconciledPoint {
                date,
                values,
                derived_spreads,
            }
        })
        .collect()
}

/// Align per-pool TVL histories (no derived fields).
pub fn align_tvl(inputs: &SeriesInputs) -> Vec<TvlRow> {
    align(inputs)
        .into_iter()
        .map(|(date, values)| TvlRow { date, values })
        .collect()
}

/// Best available DeFi yield on a row: the maximum across all pool series.
///
/// Returns `0.0` when the row tracks no pool at all.
pub fn representative_defi_rate(values: &BTreeMap<SeriesKey, f64>) -> f64 {
    values
        .iter()
        .filter(|(key, _)| key.is_defi())
        .map(|(_, v)| *v)
        .reduce(f64::max)
        .unwrap_or(0.0)
}

fn derive_spreads(values: &BTreeMap<SeriesKey, f64>) -> BTreeMap<SpreadKey, f64> {
    let best = representative_defi_rate(values);
    SpreadKey::ALL
        .into_iter()
        .map(|spread| {
            let benchmark = values
                .get(&SeriesKey::RiskFree(spread.benchmark()))
                .copied()
                .unwrap_or(0.0);
            (spread, best - benchmark)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskFreeSeries;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn fed() -> SeriesKey {
        SeriesKey::RiskFree(RiskFreeSeries::FedFunds)
    }

    fn tbill() -> SeriesKey {
        SeriesKey::RiskFree(RiskFreeSeries::TBill3M)
    }

    fn pool(label: &str) -> SeriesKey {
        SeriesKey::Pool(label.to_string())
    }

    #[test]
    fn forward_fills_defi_across_rate_only_dates() {
        let mut inputs = SeriesInputs::new();
        inputs.insert(pool("defi1"), vec![RawSeriesPoint::new(d(2024, 1, 1), 5.0)]);
        inputs.insert(
            fed(),
            vec![
                RawSeriesPoint::new(d(2024, 1, 1), 3.0),
                RawSeriesPoint::new(d(2024, 1, 3), 3.5),
            ],
        );

        let rows = reconcile(&inputs);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].date, d(2024, 1, 1));
        assert_eq!(rows[0].value(&pool("defi1")), Some(5.0));
        assert_eq!(rows[0].value(&fed()), Some(3.0));
        assert_eq!(rows[0].spread(SpreadKey::VsFedFunds), Some(2.0));

        // 2024-01-02 was never observed, so it is not synthesized.
        assert_eq!(rows[1].date, d(2024, 1, 3));
        assert_eq!(rows[1].value(&pool("defi1")), Some(5.0));
        assert_eq!(rows[1].value(&fed()), Some(3.5));
        assert_eq!(rows[1].spread(SpreadKey::VsFedFunds), Some(1.5));
    }

    #[test]
    fn representative_rate_is_the_max_not_the_mean() {
        let d1 = d(2024, 3, 1);
        let mut inputs = SeriesInputs::new();
        inputs.insert(pool("a"), vec![RawSeriesPoint::new(d1, 4.0)]);
        inputs.insert(pool("b"), vec![RawSeriesPoint::new(d1, 6.0)]);

        let rows = reconcile(&inputs);
        assert_eq!(rows.len(), 1);
        assert_eq!(representative_defi_rate(&rows[0].values), 6.0);
        // No risk-free inputs: benchmarks count as zero.
        assert_eq!(rows[0].spread(SpreadKey::VsFedFunds), Some(6.0));
        assert_eq!(rows[0].spread(SpreadKey::VsTBill), Some(6.0));
    }

    #[test]
    fn max_ignores_input_order() {
        // "zzz" sorts last and "aaa" first; neither first nor last series holds the max.
        let d1 = d(2024, 3, 1);
        let mut inputs = SeriesInputs::new();
        inputs.insert(pool("aaa"), vec![RawSeriesPoint::new(d1, 2.0)]);
        inputs.insert(pool("mmm"), vec![RawSeriesPoint::new(d1, 7.5)]);
        inputs.insert(pool("zzz"), vec![RawSeriesPoint::new(d1, 1.0)]);
        inputs.insert(tbill(), vec![RawSeriesPoint::new(d1, 5.0)]);

        let rows = reconcile(&inputs);
        assert_eq!(rows[0].spread(SpreadKey::VsTBill), Some(2.5));
    }

    #[test]
    fn empty_series_defaults_to_zero_on_every_row() {
        let mut inputs = SeriesInputs::new();
        inputs.insert(pool("silent"), Vec::new());
        inputs.insert(
            fed(),
            vec![
                RawSeriesPoint::new(d(2024, 1, 2), 5.3),
                RawSeriesPoint::new(d(2024, 1, 1), 5.2),
            ],
        );

        let rows = reconcile(&inputs);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.value(&pool("silent")), Some(0.0));
            // The silent pool is the only candidate, so the best rate is 0.
            assert_eq!(row.spread(SpreadKey::VsFedFunds), Some(-row.value(&fed()).unwrap()));
        }
        assert!(rows[0].date < rows[1].date);
    }

    #[test]
    fn no_data_at_all_yields_no_rows() {
        let mut inputs = SeriesInputs::new();
        assert!(reconcile(&inputs).is_empty());
        inputs.insert(pool("a"), Vec::new());
        inputs.insert(fed(), Vec::new());
        assert!(reconcile(&inputs).is_empty());
    }

    #[test]
    fn duplicate_dates_take_the_last_observation() {
        let d1 = d(2024, 5, 1);
        let mut inputs = SeriesInputs::new();
        inputs.insert(
            pool("a"),
            vec![RawSeriesPoint::new(d1, 4.0), RawSeriesPoint::new(d1, 4.4)],
        );

        let rows = reconcile(&inputs);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value(&pool("a")), Some(4.4));
    }

    #[test]
    fn value_before_first_observation_is_zero_then_fills_forward() {
        let mut inputs = SeriesInputs::new();
        inputs.insert(pool("late"), vec![RawSeriesPoint::new(d(2024, 1, 3), 4.0)]);
        inputs.insert(
            fed(),
            vec![
                RawSeriesPoint::new(d(2024, 1, 1), 5.0),
                RawSeriesPoint::new(d(2024, 1, 5), 5.1),
            ],
        );

        let rows = reconcile(&inputs);
        let late: Vec<f64> = rows.iter().map(|r| r.value(&pool("late")).unwrap()).collect();
        assert_eq!(late, vec![0.0, 4.0, 4.0]);
        let fed_values: Vec<f64> = rows.iter().map(|r| r.value(&fed()).unwrap()).collect();
        assert_eq!(fed_values, vec![5.0, 5.0, 5.1]);
    }

    #[test]
    fn tvl_alignment_uses_the_same_calendar_rules() {
        let mut inputs = SeriesInputs::new();
        inputs.insert(
            pool("a"),
            vec![
                RawSeriesPoint::new(d(2024, 1, 1), 1.0e9),
                RawSeriesPoint::new(d(2024, 1, 3), 1.1e9),
            ],
        );
        inputs.insert(pool("b"), vec![RawSeriesPoint::new(d(2024, 1, 2), 2.0e8)]);

        let rows = align_tvl(&inputs);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].values[&pool("b")], 0.0);
        assert_eq!(rows[1].values[&pool("a")], 1.0e9);
        assert_eq!(rows[2].values[&pool("b")], 2.0e8);
    }
}
