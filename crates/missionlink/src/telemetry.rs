//! Core telemetry types for missionlink.
//!
//! This module defines a single telemetry reading as delivered by the
//! telemetry endpoint, and the bounded, chronologically ordered history the
//! dashboard keeps of the most recent batch.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Default number of samples retained by a [`TelemetryHistory`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 300;

/// Status code reported while the booster is firing.
pub const STATUS_CODE_ASCENT: &str = "ASCENT";

/// Status code reported while all systems are nominal.
pub const STATUS_CODE_NOMINAL: &str = "NOMINAL";

/// One telemetry reading from the vehicle.
///
/// Samples are immutable once received. Numeric fields accept both JSON
/// numbers and numeric strings, since the telemetry backend serialises its
/// decimal columns as strings (`"1234.50"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Row identifier assigned by the telemetry backend, if it sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// When the reading was taken.
    pub timestamp: DateTime<Utc>,

    /// Ground speed in km/h.
    #[serde(deserialize_with = "decimal")]
    pub velocity_kmh: f64,

    /// Engine temperature in degrees Celsius.
    #[serde(deserialize_with = "decimal")]
    pub engine_temp: f64,

    /// Fuel tank pressure in bar.
    #[serde(deserialize_with = "decimal")]
    pub pressure_fuel: f64,

    /// Altitude in kilometres.
    #[serde(deserialize_with = "decimal")]
    pub altitude_km: f64,

    /// Roll attitude in degrees.
    #[serde(deserialize_with = "decimal")]
    pub attitude_roll: f64,

    /// Flight phase or health code, e.g. `NOMINAL`, `ASCENT`, `ORBIT`.
    pub status_code: String,
}

impl TelemetrySample {
    /// Check if this sample was taken during powered ascent.
    #[must_use]
    pub fn is_ascent(&self) -> bool {
        self.status_code == STATUS_CODE_ASCENT
    }

    /// Check if this sample reports a nominal status.
    #[must_use]
    pub fn is_nominal(&self) -> bool {
        self.status_code == STATUS_CODE_NOMINAL
    }
}

/// Deserialize a decimal column that may arrive as a number or a string.
fn decimal<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Number(f64),
        Text(String),
    }

    match Decimal::deserialize(deserializer)? {
        Decimal::Number(value) => Ok(value),
        Decimal::Text(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal value: {text:?}"))),
    }
}

/// The chronologically ordered window of samples currently on display.
///
/// Samples are kept oldest-first. The history holds at most `capacity`
/// samples; when a batch is larger, the oldest readings are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryHistory {
    samples: VecDeque<TelemetrySample>,
    capacity: usize,
}

impl Default for TelemetryHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl TelemetryHistory {
    /// Create an empty history with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty history holding at most `capacity` samples.
    ///
    /// A capacity of zero is bumped to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Replace the whole window with a batch delivered newest-first.
    ///
    /// The batch is reversed into chronological order. Nothing from the
    /// previous window survives: the latest batch is the authoritative view.
    pub fn replace_newest_first(&mut self, batch: Vec<TelemetrySample>) {
        self.samples.clear();
        // Newest-first, so the first `capacity` entries are the ones to keep.
        for sample in batch.into_iter().take(self.capacity) {
            self.samples.push_front(sample);
        }
    }

    /// Remove every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// The most recent sample, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&TelemetrySample> {
        self.samples.back()
    }

    /// The oldest sample still in the window, if any.
    #[must_use]
    pub fn oldest(&self) -> Option<&TelemetrySample> {
        self.samples.front()
    }

    /// Iterate over samples oldest-first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TelemetrySample> + ExactSizeIterator {
        self.samples.iter()
    }

    /// Iterate over the most recent `n` samples, newest-first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &TelemetrySample> {
        self.samples.iter().rev().take(n)
    }

    /// Number of samples in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy the window out, oldest-first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<TelemetrySample> {
        self.samples.iter().cloned().collect()
    }
}
