//! Terminal formatting for spread reports.
//!
//! Everything here returns a `String`; printing is the caller's job.

use crate::domain::{CurrentRates, ReconciledPoint, SeriesKey, SpreadKey, SpreadReport};

/// Header, window and per-spread metrics.
pub fn format_run_summary(report: &SpreadReport) -> String {
    let mut out = String::new();

    out.push_str("=== DeFi vs TradFi Yield Spread ===\n");
    out.push_str(&format!(
        "Window: {} .. {} | rows={}\n",
        report.range.start_date(),
        report.range.end_date(),
        report.points.len()
    ));
    out.push_str(&format!(
        "Generated: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out.push_str("\nSpread metrics (percentage points):\n");
    out.push_str(
        format!(
            "{:<22} {:>9} {:>9} {:>9} {:<10} {:>9} {:<10}\n",
            "spread", "current", "average", "max", "max_date", "min", "min_date"
        )
        .trim_end(),
    );
    out.push('\n');
    for key in SpreadKey::ALL {
        let m = report.metrics.get(&key).copied().unwrap_or_default();
        out.push_str(
            format!(
                "{:<22} {:>9.2} {:>9.2} {:>9.2} {:<10} {:>9.2} {:<10}\n",
                key.display_name(),
                m.current,
                m.average,
                m.max.value,
                fmt_date(m.max.date),
                m.min.value,
                fmt_date(m.min.date),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out.push('\n');

    out
}

/// Current APY per pool next to the benchmarks, with each pool's spread vs Fed Funds.
pub fn format_rates_table(rates: &CurrentRates) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Current rates (as of {}):\n",
        rates.last_updated.format("%Y-%m-%d %H:%M UTC")
    ));
    out.push_str(format!("{:<28} {:>9} {:>12}\n", "series", "rate%", "vs_fed_funds").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<28} {:-<9} {:-<12}\n", "", "", "").trim_end());
    out.push('\n');

    for pool in &rates.defi {
        out.push_str(
            format!(
                "{:<28} {:>9.2} {:>+12.2}\n",
                truncate(pool.key.label(), 28),
                pool.apy,
                pool.apy - rates.fed_funds
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out.push_str(&format!("{:<28} {:>9.2}\n", "Fed Funds Rate", rates.fed_funds));
    out.push_str(&format!("{:<28} {:>9.2}\n", "3-Month T-Bill", rates.tbill));

    out
}

/// The last `tail` reconciled rows, one column per series plus both spreads.
pub fn format_series_tail(points: &[ReconciledPoint], tail: usize) -> String {
    let mut out = String::new();
    let Some(first) = points.first() else {
        out.push_str("No reconciled rows.\n");
        return out;
    };
    let keys: Vec<&SeriesKey> = first.values.keys().collect();

    out.push_str(&format!("Last {} of {} rows:\n", tail.min(points.len()), points.len()));

    let mut header = format!("{:<10}", "date");
    for key in &keys {
        header.push_str(&format!(" {:>22}", truncate(key.label(), 22)));
    }
    for spread in SpreadKey::ALL {
        header.push_str(&format!(" {:>12}", spread_column(spread)));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let start = points.len().saturating_sub(tail);
    for p in &points[start..] {
        let mut row = p.date.format("%Y-%m-%d").to_string();
        for key in &keys {
            row.push_str(&format!(" {:>22.3}", p.value(key).unwrap_or(0.0)));
        }
        for spread in SpreadKey::ALL {
            row.push_str(&format!(" {:>+12.3}", p.spread(spread).unwrap_or(0.0)));
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }

    out
}

fn spread_column(key: SpreadKey) -> &'static str {
    match key {
        SpreadKey::VsFedFunds => "vs_fed_funds",
        SpreadKey::VsTBill => "vs_tbill",
    }
}

fn fmt_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use crate::domain::{DateRange, Extremum, PoolRate, RiskFreeSeries, SpreadMetrics};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(date: NaiveDate, pool: f64, fed: f64) -> ReconciledPoint {
        let mut values = BTreeMap::new();
        values.insert(SeriesKey::pool("aave-v3", "USDC", "Ethereum"), pool);
        values.insert(SeriesKey::RiskFree(RiskFreeSeries::FedFunds), fed);
        let mut derived_spreads = BTreeMap::new();
        derived_spreads.insert(SpreadKey::VsFedFunds, pool - fed);
        derived_spreads.insert(SpreadKey::VsTBill, pool);
        ReconciledPoint { date, values, derived_spreads }
    }

    #[test]
    fn truncate_marks_cut_labels() {
        assert_eq!(truncate("aave-v3/USDC", 20), "aave-v3/USDC");
        assert_eq!(truncate("compound-v3/USDC", 8), "compoun.");
    }

    #[test]
    fn series_tail_prints_only_the_last_rows() {
        let points = vec![
            row(d(2024, 1, 1), 5.0, 5.3),
            row(d(2024, 1, 2), 5.1, 5.3),
            row(d(2024, 1, 3), 5.2, 5.3),
        ];
        let out = format_series_tail(&points, 2);
        assert!(out.starts_with("Last 2 of 3 rows:"));
        assert!(!out.contains("2024-01-01"));
        assert!(out.contains("2024-01-02"));
        assert!(out.contains("2024-01-03"));
        assert!(out.contains("-0.100"));
        assert!(out.contains("aave-v3/USDC@ethereum"));
    }

    #[test]
    fn series_tail_handles_no_rows() {
        assert_eq!(format_series_tail(&[], 5), "No reconciled rows.\n");
    }

    #[test]
    fn rates_table_shows_spread_vs_fed_funds() {
        let rates = CurrentRates {
            defi: vec![PoolRate {
                key: SeriesKey::pool("aave-v3", "USDC", "Ethereum"),
                project: "aave-v3".into(),
                symbol: "USDC".into(),
                apy: 4.5,
            }],
            fed_funds: 4.33,
            tbill: 4.2,
            last_updated: d(2025, 6, 30).and_hms_opt(0, 0, 0).unwrap().and_utc(),
        };
        let out = format_rates_table(&rates);
        assert!(out.contains("aave-v3/USDC@ethereum"));
        assert!(out.contains("+0.17"));
        assert!(out.contains("4.33"));
    }

    #[test]
    fn summary_uses_a_dash_for_missing_extremum_dates() {
        let mut metrics = BTreeMap::new();
        metrics.insert(SpreadKey::VsFedFunds, SpreadMetrics::default());
        metrics.insert(
            SpreadKey::VsTBill,
            SpreadMetrics {
                current: 1.0,
                average: 0.5,
                max: Extremum { value: 1.0, date: Some(d(2024, 1, 2)) },
                min: Extremum { value: 0.0, date: Some(d(2024, 1, 1)) },
            },
        );
        let report = SpreadReport {
            range: DateRange { start: d(2024, 1, 1), end: d(2024, 1, 2) },
            generated_at: d(2024, 1, 2).and_hms_opt(0, 0, 0).unwrap().and_utc(),
            points: Vec::new(),
            metrics,
            tvl: Vec::new(),
            current: CurrentRates {
                defi: Vec::new(),
                fed_funds: 0.0,
                tbill: 0.0,
                last_updated: d(2024, 1, 2).and_hms_opt(0, 0, 0).unwrap().and_utc(),
            },
        };
        let out = format_run_summary(&report);
        assert!(out.contains("Window: 2024-01-01 .. 2024-01-02"));
        assert!(out.contains("2024-01-02"));
        let fed_line = out.lines().find(|l| l.starts_with("Spread vs Fed Funds")).unwrap();
        assert!(fed_line.contains(" -"));
    }
}
