//! Presentational values derived from the latest sample.
//!
//! Everything here is a pure function of the latest [`TelemetrySample`] and
//! the [`MissionStatus`]; nothing is cached. Values are returned as fixed
//! precision strings because that is how the dashboard shows them.

use serde::Serialize;

use crate::mission::MissionStatus;
use crate::telemetry::TelemetrySample;

/// Speed of sound used for the Mach estimate, in km/h.
pub const SPEED_OF_SOUND_KMH: f64 = 1235.0;

/// Divisor turning km/h into the displayed dynamic-pressure figure (kPa).
pub const DYNAMIC_PRESSURE_DIVISOR: f64 = 100.0;

/// Display colour for status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    /// Aborted or off-nominal.
    Red,
    /// Nominal.
    Green,
    /// Anything in between.
    Amber,
}

impl StatusColor {
    /// Hex colour code used by the dashboard.
    #[must_use]
    pub fn hex(self) -> &'static str {
        match self {
            Self::Red => "#ff3b3b",
            Self::Green => "#00ff41",
            Self::Amber => "#ff9f43",
        }
    }

    /// ANSI SGR foreground code for terminal output.
    #[must_use]
    pub fn ansi(self) -> &'static str {
        match self {
            Self::Red => "31",
            Self::Green => "32",
            Self::Amber => "33",
        }
    }
}

impl std::fmt::Display for StatusColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.hex())
    }
}

/// Mach-equivalent ratio, two decimals, `"0.00"` without a sample.
#[must_use]
pub fn mach_ratio(latest: Option<&TelemetrySample>) -> String {
    format!("{:.2}", mach_value(latest))
}

/// Mach ratio rounded the way it is displayed.
fn mach_value(latest: Option<&TelemetrySample>) -> f64 {
    latest.map_or(0.0, |s| round_to(s.velocity_kmh / SPEED_OF_SOUND_KMH, 2))
}

/// Dynamic-pressure estimate, one decimal, `"0.0"` without a sample.
#[must_use]
pub fn dynamic_pressure(latest: Option<&TelemetrySample>) -> String {
    let q = latest.map_or(0.0, |s| s.velocity_kmh / DYNAMIC_PRESSURE_DIVISOR);
    fixed_1(q)
}

/// G-force estimate.
///
/// During ascent this is one plus the displayed Mach ratio; otherwise the
/// vehicle is treated as sitting at 1 G.
#[must_use]
pub fn g_force(latest: Option<&TelemetrySample>) -> String {
    match latest {
        Some(sample) if sample.is_ascent() => format!("{:.2}", 1.0 + mach_value(latest)),
        _ => "1.00".to_string(),
    }
}

/// Colour of the mission status banner.
#[must_use]
pub fn status_color(status: MissionStatus) -> StatusColor {
    match status {
        MissionStatus::Aborted => StatusColor::Red,
        MissionStatus::Nominal => StatusColor::Green,
        MissionStatus::Ready => StatusColor::Amber,
    }
}

/// Colour of a log line for a given sample.
#[must_use]
pub fn log_color(sample: &TelemetrySample) -> StatusColor {
    if sample.is_nominal() {
        StatusColor::Green
    } else {
        StatusColor::Red
    }
}

/// Mission elapsed clock as `mm:ss`.
///
/// Each sample in the window stands for one second of flight. Shows
/// `"00:00"` until a sample has been received.
#[must_use]
pub fn mission_clock(window_len: usize, has_latest: bool) -> String {
    if !has_latest {
        return "00:00".to_string();
    }
    // Wraps at one hour.
    let secs = window_len % 3600;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Round half away from zero to `places` decimals.
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Format with one decimal, rounding exact ties away from zero.
///
/// `{:.1}` works on the exact binary value, which is right everywhere except
/// on exact ties such as `1.25`, where it rounds to even.
#[allow(clippy::float_cmp)]
fn fixed_1(value: f64) -> String {
    let scaled = value * 10.0;
    let exact = value.mul_add(10.0, -scaled) == 0.0;
    if exact && (scaled - scaled.trunc()).abs() == 0.5 {
        format!("{:.1}", scaled.round() / 10.0)
    } else {
        format!("{value:.1}")
    }
}

/// All derived values for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readouts {
    /// Mach-equivalent ratio.
    pub mach: String,
    /// Dynamic-pressure estimate in kPa.
    pub dynamic_pressure: String,
    /// G-force estimate.
    pub g_force: String,
    /// Status banner colour.
    pub status_color: StatusColor,
    /// Mission elapsed clock.
    pub mission_clock: String,
}

impl Readouts {
    /// Compute every readout for the given state.
    #[must_use]
    pub fn compute(
        latest: Option<&TelemetrySample>,
        status: MissionStatus,
        window_len: usize,
    ) -> Self {
        Self {
            mach: mach_ratio(latest),
            dynamic_pressure: dynamic_pressure(latest),
            g_force: g_force(latest),
            status_color: status_color(status),
            mission_clock: mission_clock(window_len, latest.is_some()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::tests::sample;

    #[test]
    fn test_mach_ratio() {
        assert_eq!(mach_ratio(Some(&sample(0, 1235.0, "NOMINAL"))), "1.00");
        assert_eq!(mach_ratio(Some(&sample(0, 0.0, "NOMINAL"))), "0.00");
        assert_eq!(mach_ratio(Some(&sample(0, 28000.0, "ORBIT"))), "22.67");
        assert_eq!(mach_ratio(None), "0.00");
    }

    #[test]
    fn test_dynamic_pressure() {
        assert_eq!(dynamic_pressure(Some(&sample(0, 1235.0, "ASCENT"))), "12.3");
        assert_eq!(dynamic_pressure(Some(&sample(0, 28000.0, "ORBIT"))), "280.0");
        assert_eq!(dynamic_pressure(None), "0.0");
    }

    #[test]
    fn test_dynamic_pressure_ties_round_up() {
        assert_eq!(dynamic_pressure(Some(&sample(0, 125.0, "ASCENT"))), "1.3");
        assert_eq!(dynamic_pressure(Some(&sample(0, 25.0, "ASCENT"))), "0.3");
        assert_eq!(dynamic_pressure(Some(&sample(0, 225.0, "ASCENT"))), "2.3");
        assert_eq!(dynamic_pressure(Some(&sample(0, -25.0, "ASCENT"))), "-0.3");
        // Not a tie in binary: 12.35 is stored just below.
        assert_eq!(dynamic_pressure(Some(&sample(0, 1235.0, "ASCENT"))), "12.3");
    }

    #[test]
    fn test_g_force_ascent() {
        assert_eq!(g_force(Some(&sample(0, 1235.0, "ASCENT"))), "2.00");
        assert_eq!(g_force(Some(&sample(0, 2470.0, "ASCENT"))), "3.00");
    }

    #[test]
    fn test_g_force_not_ascent() {
        assert_eq!(g_force(Some(&sample(0, 1235.0, "NOMINAL"))), "1.00");
        assert_eq!(g_force(Some(&sample(0, 28000.0, "ORBIT"))), "1.00");
        assert_eq!(g_force(None), "1.00");
    }

    #[test]
    fn test_g_force_uses_displayed_mach() {
        // 1000 / 1235 = 0.8097 -> "0.81" -> 1.81
        assert_eq!(g_force(Some(&sample(0, 1000.0, "ASCENT"))), "1.81");
    }

    #[test]
    fn test_status_color() {
        assert_eq!(status_color(MissionStatus::Aborted), StatusColor::Red);
        assert_eq!(status_color(MissionStatus::Nominal), StatusColor::Green);
        assert_eq!(status_color(MissionStatus::Ready), StatusColor::Amber);
        assert_eq!(StatusColor::Red.hex(), "#ff3b3b");
        assert_eq!(StatusColor::Green.to_string(), "#00ff41");
        assert_eq!(StatusColor::Amber.hex(), "#ff9f43");
    }

    #[test]
    fn test_log_color() {
        assert_eq!(log_color(&sample(0, 0.0, "NOMINAL")), StatusColor::Green);
        assert_eq!(log_color(&sample(0, 0.0, "ASCENT")), StatusColor::Red);
    }

    #[test]
    fn test_mission_clock() {
        assert_eq!(mission_clock(30, false), "00:00");
        assert_eq!(mission_clock(0, true), "00:00");
        assert_eq!(mission_clock(30, true), "00:30");
        assert_eq!(mission_clock(125, true), "02:05");
        assert_eq!(mission_clock(3601, true), "00:01");
    }

    #[test]
    fn test_readouts_compute() {
        let latest = sample(0, 1235.0, "ASCENT");
        let readouts = Readouts::compute(Some(&latest), MissionStatus::Nominal, 30);
        assert_eq!(readouts.mach, "1.00");
        assert_eq!(readouts.dynamic_pressure, "12.3");
        assert_eq!(readouts.g_force, "2.00");
        assert_eq!(readouts.status_color, StatusColor::Green);
        assert_eq!(readouts.mission_clock, "00:30");
    }

    #[test]
    fn test_readouts_without_sample() {
        let readouts = Readouts::compute(None, MissionStatus::Ready, 0);
        assert_eq!(readouts.mach, "0.00");
        assert_eq!(readouts.dynamic_pressure, "0.0");
        assert_eq!(readouts.g_force, "1.00");
        assert_eq!(readouts.status_color, StatusColor::Amber);
    }
}
