//! Fixed-length sliding window of detection counters.
//!
//! The window always holds [`BUCKET_COUNT`] buckets. Rotation is driven by a
//! wall-clock timer owned by the engine, never by event arrival; incidents
//! increment whichever bucket is last at the moment they are derived.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, TimeZone};
use serde::{Deserialize, Serialize};

use super::{BUCKET_COUNT, BUCKET_SPACING_MINUTES};
use crate::detect::IncidentKind;

/// One time slot of the metric chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricBucket {
    /// Local time-of-day label (`HH:MM`), display only.
    pub label: String,
    pub weapons: u32,
    pub fights: u32,
    pub luggage: u32,
}

impl MetricBucket {
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            weapons: 0,
            fights: 0,
            luggage: 0,
        }
    }

    /// Increment the counter matching `kind`. Returns false for `Unknown`.
    pub fn record(&mut self, kind: IncidentKind) -> bool {
        match kind {
            IncidentKind::WeaponDetected => self.weapons += 1,
            IncidentKind::FightDetected => self.fights += 1,
            IncidentKind::LuggageAbandoned => self.luggage += 1,
            IncidentKind::Unknown => return false,
        }
        true
    }

    pub fn total(&self) -> u32 {
        self.weapons + self.fights + self.luggage
    }
}

#[derive(Debug, Clone)]
pub struct MetricSeries {
    buckets: VecDeque<MetricBucket>,
}

impl MetricSeries {
    /// Build the initial window ending at `now`, labels spaced
    /// [`BUCKET_SPACING_MINUTES`] apart.
    pub fn starting_at<Tz>(now: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let buckets = (0..BUCKET_COUNT as i64)
            .rev()
            .map(|i| {
                let at = now.clone() - Duration::minutes(i * BUCKET_SPACING_MINUTES);
                MetricBucket::empty(Self::label_for(&at))
            })
            .collect();
        Self { buckets }
    }

    /// `HH:MM` label for a bucket starting at `at`.
    pub fn label_for<Tz>(at: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        at.format("%H:%M").to_string()
    }

    /// Drop the oldest bucket and append an empty one labelled `label`.
    pub fn rotate(&mut self, label: impl Into<String>) {
        self.buckets.pop_front();
        self.buckets.push_back(MetricBucket::empty(label));
    }

    /// Increment the current (last) bucket for `kind`.
    pub fn record(&mut self, kind: IncidentKind) -> bool {
        match self.buckets.back_mut() {
            Some(bucket) => bucket.record(kind),
            None => false,
        }
    }

    pub fn current(&self) -> Option<&MetricBucket> {
        self.buckets.back()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Oldest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &MetricBucket> {
        self.buckets.iter()
    }

    pub fn to_vec(&self) -> Vec<MetricBucket> {
        self.buckets.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap()
    }

    #[test]
    fn initial_window_has_seven_labelled_buckets() {
        let series = MetricSeries::starting_at(fixed_now());
        let labels: Vec<_> = series.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["10:00", "10:05", "10:10", "10:15", "10:20", "10:25", "10:30"]
        );
        assert!(series.iter().all(|b| b.total() == 0));
    }

    #[test]
    fn rotation_keeps_length_fixed() {
        let mut series = MetricSeries::starting_at(fixed_now());
        for minute in 0..500 {
            series.rotate(format!("m{minute}"));
            assert_eq!(series.len(), BUCKET_COUNT);
        }
        assert_eq!(series.current().unwrap().label, "m499");
        assert_eq!(series.iter().next().unwrap().label, "m493");
    }

    #[test]
    fn increments_land_on_current_bucket() {
        let mut series = MetricSeries::starting_at(fixed_now());
        assert!(series.record(IncidentKind::WeaponDetected));
        assert!(series.record(IncidentKind::LuggageAbandoned));
        assert!(!series.record(IncidentKind::Unknown));

        let current = series.current().unwrap();
        assert_eq!((current.weapons, current.fights, current.luggage), (1, 0, 1));

        series.rotate("10:31");
        assert_eq!(series.current().unwrap().total(), 0);
        // The previous bucket keeps its counts after sliding left.
        assert_eq!(series.to_vec()[BUCKET_COUNT - 2].weapons, 1);
    }
}
