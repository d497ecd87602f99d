//! Plain-text rendering of a dashboard frame.
//!
//! Turns a [`DashboardSnapshot`] into the panels shown in the terminal:
//! status header, flight controls, metrics, data link readouts, a sparkline
//! chart of engine temperature against fuel pressure, and the system log.

use std::fmt::Write as _;

use crate::dashboard::DashboardSnapshot;
use crate::mission::{MissionStatus, PowerMode};
use crate::readout::{log_color, StatusColor};

const RULE: &str = "------------------------------------------------------------";
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Options controlling how a frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit ANSI colour codes.
    pub color: bool,
    /// Maximum number of points drawn in each sparkline.
    pub chart_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: false,
            chart_width: 48,
        }
    }
}

impl RenderOptions {
    fn paint(&self, color: StatusColor, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{text}\x1b[0m", color.ansi())
        } else {
            text.to_string()
        }
    }
}

/// Draw one frame as text.
#[must_use]
pub fn render(snapshot: &DashboardSnapshot, options: &RenderOptions) -> String {
    let mut out = String::new();
    let mission = &snapshot.mission;
    let latest = snapshot.latest.as_ref();

    if !mission.armed {
        let _ = writeln!(out, "ORBITAL COMMAND LINK");
        let _ = writeln!(out, "SYSTEM ID: OMEGA-7 | CONNECTION ESTABLISHED");
        let _ = writeln!(out, "Type `launch` to INITIATE LAUNCH");
        let _ = writeln!(out, "{RULE}");
    }

    let status = options.paint(snapshot.readouts.status_color, &mission.status.to_string());
    let _ = writeln!(
        out,
        "SPACE MISSION CONTROL   {status}   T+ {}",
        snapshot.readouts.mission_clock
    );
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "FLIGHT CONTROLS");
    let power = match mission.power_mode {
        PowerMode::Ground => "GROUND POWER",
        PowerMode::Internal => "INTERNAL BATTERY",
    };
    let vent = if mission.venting {
        "VENTING LOX..."
    } else {
        "VALVES CLOSED"
    };
    let _ = writeln!(out, "  Power source      {power}");
    let _ = writeln!(out, "  Propellant        {vent}");
    if mission.status == MissionStatus::Aborted {
        let _ = writeln!(out, "  [reset]  RESET SYSTEM");
    } else {
        let _ = writeln!(out, "  [abort]  ABORT MISSION");
    }
    let _ = writeln!(out, "{RULE}");

    let altitude = latest.map_or_else(|| "--".to_string(), |s| format!("{:.2}", s.altitude_km));
    let _ = writeln!(
        out,
        "ALTITUDE {altitude} km   MACH {} M   MAX-Q {} kPa",
        snapshot.readouts.mach, snapshot.readouts.dynamic_pressure
    );
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "DATA LINK");
    let field = |value: Option<f64>| value.map_or_else(|| "--".to_string(), |v| format!("{v:.2}"));
    let _ = writeln!(out, "  Velocity       {:>10} km/h", field(latest.map(|s| s.velocity_kmh)));
    let _ = writeln!(out, "  Engine Temp    {:>10} °C", field(latest.map(|s| s.engine_temp)));
    let _ = writeln!(out, "  Fuel Pressure  {:>10} Bar", field(latest.map(|s| s.pressure_fuel)));
    let _ = writeln!(out, "  Roll Axis      {:>10} deg", field(latest.map(|s| s.attitude_roll)));
    let _ = writeln!(out, "  G-Force        {:>10} G", snapshot.readouts.g_force);
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "LIVE TELEMETRY (TEMP vs PRESSURE)");
    let skip = snapshot.series.len().saturating_sub(options.chart_width);
    let window = &snapshot.series[skip..];
    let _ = writeln!(out, "  Temp  {}", sparkline(window.iter().map(|p| p.engine_temp)));
    let _ = writeln!(out, "  Fuel  {}", sparkline(window.iter().map(|p| p.pressure_fuel)));
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "SYSTEM LOGS");
    for sample in &snapshot.log {
        let code = options.paint(log_color(sample), &sample.status_code);
        let _ = writeln!(
            out,
            "  [{}] {code:<10} Alt: {:.2}",
            sample.timestamp.format("%H:%M:%S"),
            sample.altitude_km
        );
    }

    out
}

/// Draw `values` as a one-line bar chart scaled to their own range.
#[must_use]
pub fn sparkline(values: impl Iterator<Item = f64>) -> String {
    let values: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;
    let top = SPARK_LEVELS.len() - 1;

    values
        .iter()
        .map(|&v| {
            if span <= f64::EPSILON {
                SPARK_LEVELS[0]
            } else {
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let level = (((v - min) / span) * top as f64).round() as usize;
                SPARK_LEVELS[level.min(top)]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::SeriesPoint;
    use crate::mission::MissionState;
    use crate::readout::Readouts;
    use crate::telemetry::tests::sample;

    fn snapshot(
        mission: MissionState,
        samples_newest_first: &[(i64, f64, &str)],
    ) -> DashboardSnapshot {
        let log: Vec<_> = samples_newest_first
            .iter()
            .map(|&(s, v, code)| sample(s, v, code))
            .collect();
        let latest = log.first().cloned();
        let series = log.iter().rev().map(SeriesPoint::from).collect();
        DashboardSnapshot {
            mission,
            readouts: Readouts::compute(latest.as_ref(), mission.status, log.len()),
            window_len: log.len(),
            latest,
            series,
            log,
        }
    }

    #[test]
    fn test_render_idle_shows_launch_overlay() {
        let text = render(&snapshot(MissionState::new(), &[]), &RenderOptions::default());
        assert!(text.contains("ORBITAL COMMAND LINK"));
        assert!(text.contains("READY"));
        assert!(text.contains("T+ 00:00"));
        assert!(text.contains("Velocity               -- km/h"));
        assert!(text.contains("GROUND POWER"));
        assert!(text.contains("VALVES CLOSED"));
    }

    #[test]
    fn test_render_flying() {
        let mut mission = MissionState::new();
        mission.launch();
        mission.toggle_power();
        mission.toggle_vent();
        let snap = snapshot(mission, &[(1, 1235.0, "ASCENT"), (0, 0.0, "NOMINAL")]);

        let text = render(&snap, &RenderOptions::default());
        assert!(!text.contains("ORBITAL COMMAND LINK"));
        assert!(text.contains("NOMINAL"));
        assert!(text.contains("T+ 00:02"));
        assert!(text.contains("MACH 1.00 M"));
        assert!(text.contains("MAX-Q 12.3 kPa"));
        assert!(text.contains("G-Force              2.00 G"));
        assert!(text.contains("INTERNAL BATTERY"));
        assert!(text.contains("VENTING LOX..."));
        assert!(text.contains("ABORT MISSION"));

        let log_start = text.find("SYSTEM LOGS").unwrap();
        let log = &text[log_start..];
        assert!(log.find("ASCENT").unwrap() < log.find("NOMINAL").unwrap());
    }

    #[test]
    fn test_render_aborted_offers_reset() {
        let mut mission = MissionState::new();
        mission.launch();
        mission.abort(&mut |_: &str| true);
        let text = render(&snapshot(mission, &[]), &RenderOptions::default());
        assert!(text.contains("ABORTED"));
        assert!(text.contains("RESET SYSTEM"));
        assert!(!text.contains("ABORT MISSION"));
    }

    #[test]
    fn test_render_with_color() {
        let mut mission = MissionState::new();
        mission.launch();
        let options = RenderOptions {
            color: true,
            ..RenderOptions::default()
        };
        let text = render(&snapshot(mission, &[]), &options);
        assert!(text.contains("\x1b[32mNOMINAL\x1b[0m"));
    }

    #[test]
    fn test_sparkline() {
        assert_eq!(sparkline([1.0, 2.0, 3.0].into_iter()).chars().count(), 3);
        assert_eq!(sparkline([0.0, 7.0].into_iter()), "▁█");
        assert_eq!(sparkline([5.0, 5.0].into_iter()), "▁▁");
        assert_eq!(sparkline(std::iter::empty()), "");
    }
}
