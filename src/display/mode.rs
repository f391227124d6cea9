/*
 *  display/mode.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display modes and their payloads
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::fmt;

/// Display mode - controls what content is shown on the display
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Mode {
    Clear,      // Blank panel
    Intro,      // Boot animation
    Cycle,      // Rotating system / weather / blocking views
    Progress,   // Labeled long running task
    Warning,    // Placeholder, nothing drawn
    Message,    // Info / warning / error banner
    Connection, // Wireless pairing status
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Clear => "clear",
            Mode::Intro => "intro",
            Mode::Cycle => "cycle",
            Mode::Progress => "progress",
            Mode::Warning => "warning",
            Mode::Message => "message",
            Mode::Connection => "connection",
        };
        f.write_str(name)
    }
}

/// Severity of a message banner
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Single character shown in the banner badge
    pub fn badge(&self) -> &'static str {
        match self {
            Severity::Info => "i",
            Severity::Warning => "!",
            Severity::Error => "x",
        }
    }
}

/// Payload of the `Progress` mode
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressPayload {
    pub name: String,
    pub detail: String,
    pub name_on_finish: String,
    pub detail_on_finish: String,
    /// Nominally 0.0..=1.0, clamped when rendered
    pub percentage: f32,
}

impl ProgressPayload {
    /// A task counts as finished once the percentage reaches 1.0
    pub fn is_finished(&self) -> bool {
        self.percentage >= 1.0
    }

    /// Labels to show, swapped for the finished variants when done
    pub fn labels(&self) -> (&str, &str) {
        if self.is_finished() {
            (&self.name_on_finish, &self.detail_on_finish)
        } else {
            (&self.name, &self.detail)
        }
    }

    /// Gauge fill, clamped to [0, 1]; NaN reads as empty
    pub fn fill(&self) -> f32 {
        if self.percentage.is_nan() {
            0.0
        } else {
            self.percentage.clamp(0.0, 1.0)
        }
    }
}

/// Payload of the `Connection` mode
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPayload {
    pub established: bool,
    pub attempt: u32,
    /// Label lines, at most [`ConnectionPayload::MAX_LINES`] are kept
    pub lines: Vec<String>,
}

impl ConnectionPayload {
    pub const MAX_LINES: usize = 2;

    pub fn new(established: bool, attempt: u32, mut lines: Vec<String>) -> Self {
        lines.truncate(Self::MAX_LINES);
        Self { established, attempt, lines }
    }

    /// Label line `index`, empty when the caller sent fewer lines
    pub fn line(&self, index: usize) -> &str {
        self.lines.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Payload of the `Message` mode
#[derive(Debug, Clone, PartialEq)]
pub struct MessagePayload {
    pub severity: Severity,
    pub lines: Vec<String>,
}

/// Mode specific data, one variant per mode.
///
/// The mode is derived from the variant, so a mode can never be paired
/// with another mode's fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ModePayload {
    #[default]
    Clear,
    Intro,
    Cycle,
    Warning,
    Progress(ProgressPayload),
    Message(MessagePayload),
    Connection(ConnectionPayload),
}

impl ModePayload {
    pub fn mode(&self) -> Mode {
        match self {
            ModePayload::Clear => Mode::Clear,
            ModePayload::Intro => Mode::Intro,
            ModePayload::Cycle => Mode::Cycle,
            ModePayload::Warning => Mode::Warning,
            ModePayload::Progress(_) => Mode::Progress,
            ModePayload::Message(_) => Mode::Message,
            ModePayload::Connection(_) => Mode::Connection,
        }
    }
}

/// Immutable (mode, payload) pair handed to observers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    payload: ModePayload,
}

impl Snapshot {
    pub fn new(payload: ModePayload) -> Self {
        Self { payload }
    }

    pub fn mode(&self) -> Mode {
        self.payload.mode()
    }

    pub fn payload(&self) -> &ModePayload {
        &self.payload
    }

    pub fn progress(&self) -> Option<&ProgressPayload> {
        match &self.payload {
            ModePayload::Progress(p) => Some(p),
            _ => None,
        }
    }

    pub fn connection(&self) -> Option<&ConnectionPayload> {
        match &self.payload {
            ModePayload::Connection(c) => Some(c),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&MessagePayload> {
        match &self.payload {
            ModePayload::Message(m) => Some(m),
            _ => None,
        }
    }
}
