//! Interactive terminal front end.
//!
//! Reads operator commands line by line, forwards them to the [`Dashboard`]
//! and redraws the frame whenever telemetry or mission state changes, and
//! at least once per poll interval.
//!
//! The abort confirmation is modal: `abort` shows the warning, polling and
//! redraws are suspended, and only a yes or no answer ends the exchange.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::mission::ABORT_PROMPT;
use crate::render::{render, RenderOptions};

const HELP: &str = "commands: launch | abort | reset | power | vent | status | help | quit";
const ANSWER_HINT: &str = "Answer y or n.";

/// A line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Initiate launch.
    Launch,
    /// Ask to abort the mission.
    Abort,
    /// Reset the system.
    Reset,
    /// Toggle the power source.
    Power,
    /// Toggle the propellant vent.
    Vent,
    /// Redraw the dashboard.
    Status,
    /// Show available commands.
    Help,
    /// Leave the console.
    Quit,
    /// Anything else.
    Unknown(String),
}

impl ConsoleCommand {
    /// Parse one input line. Blank lines yield `None`.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.trim().to_ascii_lowercase();
        let cmd = match word.as_str() {
            "" => return None,
            "launch" | "l" => Self::Launch,
            "abort" | "a" => Self::Abort,
            "reset" | "r" => Self::Reset,
            "power" | "p" => Self::Power,
            "vent" | "v" => Self::Vent,
            "status" | "s" => Self::Status,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(word),
        };
        Some(cmd)
    }
}

/// How frames are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleOptions {
    /// Emit one JSON snapshot per frame instead of text.
    pub json: bool,
    /// Clear the screen before each text frame.
    pub clear_screen: bool,
    /// Number of samples in the system log panel.
    pub log_lines: usize,
    /// Text rendering options.
    pub render: RenderOptions,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            json: false,
            clear_screen: false,
            log_lines: 50,
            render: RenderOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// The interactive dashboard console.
#[derive(Debug)]
pub struct Console<W> {
    dashboard: Dashboard,
    out: W,
    options: ConsoleOptions,
    awaiting_abort_confirmation: bool,
}

impl<W: Write> Console<W> {
    /// Create a console driving `dashboard` and writing frames to `out`.
    pub fn new(dashboard: Dashboard, out: W, options: ConsoleOptions) -> Self {
        Self {
            dashboard,
            out,
            options,
            awaiting_abort_confirmation: false,
        }
    }

    /// The dashboard being driven.
    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Give back the dashboard and output.
    pub fn into_parts(self) -> (Dashboard, W) {
        (self.dashboard, self.out)
    }

    /// Run until `quit` or end of input.
    ///
    /// The dashboard is started on entry and stopped on exit.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing a frame fails.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut updates = self.dashboard.subscribe();
        let period = self.dashboard.interval();
        let mut refresh = interval_at(Instant::now() + period, period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.dashboard.start();
        self.draw()?;

        let result = loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => {
                            debug!("Input closed, leaving console");
                            break Ok(());
                        }
                        Err(e) => break Err(e.into()),
                    };
                    match self.handle_line(&line) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Quit) => break Ok(()),
                        Err(e) => break Err(e),
                    }
                }
                changed = updates.changed() => {
                    if changed.is_err() {
                        break Ok(());
                    }
                    if let Err(e) = self.redraw() {
                        break Err(e);
                    }
                }
                _ = refresh.tick() => {
                    if let Err(e) = self.redraw() {
                        break Err(e);
                    }
                }
            }
        };

        self.dashboard.stop();
        result
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if self.awaiting_abort_confirmation {
            let confirmed = match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => true,
                "" | "n" | "no" => false,
                _ => {
                    self.say(ANSWER_HINT)?;
                    return Ok(Flow::Continue);
                }
            };
            self.awaiting_abort_confirmation = false;
            if self.dashboard.abort(&mut |_: &str| confirmed) {
                self.say("Mission aborted.")?;
            } else {
                self.say("Abort cancelled.")?;
            }
            self.dashboard.start();
            self.draw()?;
            return Ok(Flow::Continue);
        }

        let Some(cmd) = ConsoleCommand::parse(line) else {
            return Ok(Flow::Continue);
        };

        match cmd {
            ConsoleCommand::Launch => {
                if !self.dashboard.launch() {
                    self.say("Mission is aborted; reset the system first.")?;
                }
            }
            ConsoleCommand::Abort => {
                if self.dashboard.mission().is_aborted() {
                    self.say("Mission already aborted; use `reset`.")?;
                } else {
                    // Hold the frame and the poll schedule until answered.
                    self.awaiting_abort_confirmation = true;
                    self.dashboard.stop();
                    self.say(&format!("{ABORT_PROMPT} [y/N]"))?;
                }
            }
            ConsoleCommand::Reset => self.dashboard.reset(),
            ConsoleCommand::Power => {
                self.dashboard.toggle_power();
            }
            ConsoleCommand::Vent => {
                self.dashboard.toggle_vent();
            }
            ConsoleCommand::Status => self.draw()?,
            ConsoleCommand::Help => self.say(HELP)?,
            ConsoleCommand::Quit => return Ok(Flow::Quit),
            ConsoleCommand::Unknown(word) => {
                self.say(&format!("unknown command '{word}'; {HELP}"))?;
            }
        }
        Ok(Flow::Continue)
    }

    fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{message}")?;
        self.out.flush()?;
        Ok(())
    }

    /// Draw unless a confirmation prompt is on screen.
    fn redraw(&mut self) -> Result<()> {
        if self.awaiting_abort_confirmation {
            return Ok(());
        }
        self.draw()
    }

    fn draw(&mut self) -> Result<()> {
        let snapshot = self.dashboard.snapshot(self.options.log_lines);
        if self.options.json {
            serde_json::to_writer(&mut self.out, &snapshot)?;
            writeln!(self.out)?;
        } else {
            if self.options.clear_screen {
                write!(self.out, "\x1b[2J\x1b[H")?;
            }
            write!(self.out, "{}", render(&snapshot, &self.options.render))?;
        }
        self.out.flush()?;
        Ok(())
    }
}
