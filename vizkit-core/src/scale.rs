//! Continuous, time and band scales plus tick generation.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use indexmap::IndexSet;

/// Linear interpolation from a numeric domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn with_domain(&self, domain: (f64, f64)) -> Self {
        Self {
            domain,
            range: self.range,
        }
    }

    /// Maps a domain value to the range. A collapsed domain maps everything to the range start;
    /// NaN input stays NaN so callers can clamp it.
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 || !span.is_finite() {
            return r0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        if span == 0.0 || !span.is_finite() {
            return d0;
        }
        d0 + (pixel - r0) / span * (d1 - d0)
    }

    /// Roughly `count` evenly spaced values at 1, 2 or 5 × 10ⁿ steps inside the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = ordered(self.domain);
        if count == 0 || !lo.is_finite() || !hi.is_finite() {
            return Vec::new();
        }
        if lo == hi {
            return vec![lo];
        }

        let step = tick_step(lo, hi, count);
        let start = (lo / step).ceil() as i64;
        let stop = (hi / step).floor() as i64;
        if step < 1.0 {
            let inverse = (1.0 / step).round();
            (start..=stop).map(|i| i as f64 / inverse).collect()
        } else {
            (start..=stop).map(|i| i as f64 * step).collect()
        }
    }
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let raw = (hi - lo) / count.max(1) as f64;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}

const HOUR_MS: f64 = 3_600_000.0;
const DAY_MS: f64 = 24.0 * HOUR_MS;

/// Spacing between time ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickInterval {
    Hours(u32),
    Days(u32),
    Months(u32),
    Years(u32),
}

impl TickInterval {
    fn approx_millis(self) -> f64 {
        match self {
            TickInterval::Hours(n) => n as f64 * HOUR_MS,
            TickInterval::Days(n) => n as f64 * DAY_MS,
            TickInterval::Months(n) => n as f64 * 30.0 * DAY_MS,
            TickInterval::Years(n) => n as f64 * 365.0 * DAY_MS,
        }
    }

    /// `chrono` format string suited to labels at this spacing.
    pub fn label_format(self) -> &'static str {
        match self {
            TickInterval::Hours(_) => "%H:%M",
            TickInterval::Days(_) => "%b %d",
            TickInterval::Months(_) => "%b %Y",
            TickInterval::Years(_) => "%Y",
        }
    }
}

const TIME_INTERVALS: [TickInterval; 11] = [
    TickInterval::Hours(1),
    TickInterval::Hours(3),
    TickInterval::Hours(6),
    TickInterval::Hours(12),
    TickInterval::Days(1),
    TickInterval::Days(2),
    TickInterval::Days(7),
    TickInterval::Days(14),
    TickInterval::Months(1),
    TickInterval::Months(3),
    TickInterval::Months(6),
];

/// Linear scale over epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    linear: LinearScale,
}

impl TimeScale {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, range: (f64, f64)) -> Self {
        Self {
            linear: LinearScale::new(
                (
                    start.timestamp_millis() as f64,
                    end.timestamp_millis() as f64,
                ),
                range,
            ),
        }
    }

    pub fn from_linear(linear: LinearScale) -> Self {
        Self { linear }
    }

    pub fn linear(&self) -> &LinearScale {
        &self.linear
    }

    pub fn map(&self, at: DateTime<Utc>) -> f64 {
        self.linear.map(at.timestamp_millis() as f64)
    }

    /// Missing timestamps map to NaN; the shape renderer clamps them.
    pub fn map_opt(&self, at: Option<DateTime<Utc>>) -> f64 {
        at.map_or(f64::NAN, |at| self.map(at))
    }

    pub fn invert(&self, pixel: f64) -> Option<DateTime<Utc>> {
        let millis = self.linear.invert(pixel);
        if !millis.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis(millis.round() as i64)
    }

    /// Calendar-aligned ticks, roughly `count` of them, with the spacing chosen.
    pub fn ticks(&self, count: usize) -> (TickInterval, Vec<DateTime<Utc>>) {
        let (lo, hi) = ordered(self.linear.domain());
        if count == 0 || !lo.is_finite() || !hi.is_finite() || lo == hi {
            return (TickInterval::Days(1), Vec::new());
        }

        let target = (hi - lo) / count as f64;
        let interval = TIME_INTERVALS
            .iter()
            .copied()
            .find(|interval| interval.approx_millis() >= target)
            .unwrap_or_else(|| {
                let years = tick_step(0.0, (hi - lo) / (365.0 * DAY_MS), count).max(1.0);
                TickInterval::Years(years.round() as u32)
            });

        (interval, time_ticks(lo, hi, interval))
    }
}

fn time_ticks(lo: f64, hi: f64, interval: TickInterval) -> Vec<DateTime<Utc>> {
    match interval {
        TickInterval::Hours(_) | TickInterval::Days(_) => {
            let step = interval.approx_millis();
            let start = (lo / step).ceil() as i64;
            let stop = (hi / step).floor() as i64;
            (start..=stop)
                .filter_map(|i| DateTime::from_timestamp_millis((i as f64 * step) as i64))
                .collect()
        }
        TickInterval::Months(n) | TickInterval::Years(n) => {
            let months_per_tick = match interval {
                TickInterval::Years(_) => n.max(1) * 12,
                _ => n.max(1),
            };
            let Some(first) = DateTime::from_timestamp_millis(lo as i64) else {
                return Vec::new();
            };
            let mut month_index = first.year() * 12 + first.month0() as i32;
            let rem = month_index.rem_euclid(months_per_tick as i32);
            if rem != 0 {
                month_index += months_per_tick as i32 - rem;
            }

            let mut ticks = Vec::new();
            loop {
                let year = month_index.div_euclid(12);
                let month = month_index.rem_euclid(12) as u32 + 1;
                let Some(at) = NaiveDate::from_ymd_opt(year, month, 1)
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
                else {
                    break;
                };
                let millis = at.timestamp_millis() as f64;
                if millis > hi {
                    break;
                }
                if millis >= lo {
                    ticks.push(at);
                }
                month_index += months_per_tick as i32;
            }
            ticks
        }
    }
}

/// Equal-width bands for an ordered set of distinct labels.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    domain: IndexSet<String>,
    range: (f64, f64),
    padding: f64,
}

impl BandScale {
    /// Duplicate labels keep their first position.
    pub fn new<I, S>(labels: I, range: (f64, f64), padding: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domain: labels.into_iter().map(Into::into).collect(),
            range,
            padding: if padding.is_finite() {
                padding.clamp(0.0, 0.95)
            } else {
                0.0
            },
        }
    }

    /// Same bands spread over another range.
    pub fn with_range(&self, range: (f64, f64)) -> Self {
        Self {
            range,
            ..self.clone()
        }
    }

    pub fn domain(&self) -> impl Iterator<Item = &str> {
        self.domain.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }

    pub fn step(&self) -> f64 {
        let n = self.domain.len() as f64;
        if n == 0.0 {
            return 0.0;
        }
        (self.range.1 - self.range.0) / (n - self.padding + 2.0 * self.padding).max(1.0)
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    pub fn position(&self, label: &str) -> Option<f64> {
        let index = self.domain.get_index_of(label)?;
        Some(self.range.0 + self.step() * (self.padding + index as f64))
    }
}
