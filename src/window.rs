//! History windowing and the injected clock.
//!
//! Nothing in the pipeline reads wall-clock time directly; callers pass a
//! `Clock` so runs and tests can pin "today".

use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};

use crate::domain::{DateRange, PoolHistory, SeriesInputs};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The system clock (UTC).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midnight UTC on `date`.
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Window ending today and starting `months_back` calendar months earlier.
///
/// Month arithmetic clamps to the last valid day (Mar 31 minus one month is
/// Feb 29/28).
pub fn date_range(months_back: u32, clock: &dyn Clock) -> DateRange {
    let end = clock.today();
    let start = end
        .checked_sub_months(Months::new(months_back))
        .unwrap_or(NaiveDate::MIN);
    DateRange { start, end }
}

/// Drop every raw point dated before the window start.
pub fn retain_window(inputs: &mut SeriesInputs, range: &DateRange) {
    for points in inputs.values_mut() {
        points.retain(|p| p.date >= range.start);
    }
}

/// Drop pool history samples dated before the window start.
///
/// Samples whose timestamp has no parseable date are kept here; the
/// adapters drop them later.
pub fn retain_pool_window(history: &mut PoolHistory, range: &DateRange) {
    history.history.retain(|p| match crate::data::timestamp_date(&p.timestamp) {
        Some(date) => date >= range.start,
        None => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PoolHistoryPoint, RawSeriesPoint, SeriesKey, TrackedPool};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn range_spans_whole_calendar_months() {
        let clock = FixedClock::on(d(2025, 7, 15));
        let range = date_range(18, &clock);
        assert_eq!(range.start_date(), "2024-01-15");
        assert_eq!(range.end_date(), "2025-07-15");
    }

    #[test]
    fn range_clamps_to_month_end() {
        let clock = FixedClock::on(d(2024, 3, 31));
        let range = date_range(1, &clock);
        assert_eq!(range.start, d(2024, 2, 29));

        let range = date_range(0, &clock);
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn retain_window_drops_points_before_start_only() {
        let range = DateRange {
            start: d(2024, 1, 10),
            end: d(2024, 1, 20),
        };
        let mut inputs = SeriesInputs::new();
        inputs.insert(
            SeriesKey::Pool("a".into()),
            vec![
                RawSeriesPoint::new(d(2024, 1, 9), 1.0),
                RawSeriesPoint::new(d(2024, 1, 10), 2.0),
                RawSeriesPoint::new(d(2024, 1, 25), 3.0),
            ],
        );

        retain_window(&mut inputs, &range);
        let kept: Vec<f64> = inputs[&SeriesKey::Pool("a".into())].iter().map(|p| p.value).collect();
        assert_eq!(kept, vec![2.0, 3.0]);
    }

    #[test]
    fn pool_window_compares_on_the_date_component() {
        let range = DateRange {
            start: d(2024, 1, 10),
            end: d(2024, 1, 20),
        };
        let sample = |ts: &str| PoolHistoryPoint {
            timestamp: ts.to_string(),
            apy: 1.0,
            tvl_usd: 1.0,
        };
        let mut history = PoolHistory {
            pool: TrackedPool {
                id: "p".into(),
                chain: "Ethereum".into(),
                project: "aave-v3".into(),
                symbol: "USDC".into(),
                current_apy: 1.0,
                apy_base: None,
                tvl_usd: 1.0,
            },
            history: vec![
                sample("2024-01-09T23:59:59.000Z"),
                sample("2024-01-10T00:00:00.000Z"),
                sample("garbage"),
            ],
        };

        retain_pool_window(&mut history, &range);
        assert_eq!(history.history.len(), 2);
        assert_eq!(history.history[0].timestamp, "2024-01-10T00:00:00.000Z");
    }
}
