// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Severity levels.

use std::fmt;
use std::str::FromStr;

use crate::Error;
use crate::ErrorKind;

const LONG_NAMES: [&str; 6] = ["DEBUG", "TRACE", "INFO ", "WARN ", "ERROR", "CRITI"];
const SHORT_NAMES: [&str; 6] = ["D", "T", "I", "W", "E", "C"];
const NAMES: [&str; 6] = ["DEBUG", "TRACE", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// The severity of a record.
///
/// Levels are totally ordered from the least to the most severe:
///
/// `Debug < Trace < Info < Warning < Error < Critical`
///
/// A filter with threshold `Info` accepts `Info`, `Warning`, `Error` and `Critical`.
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub enum Level {
    /// Debugging output.
    #[default]
    Debug = 0,
    /// Fine grained tracing output.
    Trace = 1,
    /// Informational messages.
    Info = 2,
    /// Something looks wrong but work continues.
    Warning = 3,
    /// An operation failed.
    Error = 4,
    /// The process is unlikely to continue correctly.
    Critical = 5,
}

impl Level {
    /// All levels, from the least to the most severe.
    pub const ALL: [Level; 6] = [
        Level::Debug,
        Level::Trace,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    /// Parse a level name leniently.
    ///
    /// Matching is case-insensitive against `DEBUG`, `TRACE`, `INFO`, `WARNING`, `ERROR` and
    /// `CRITICAL`. Anything else yields [`Level::Debug`].
    ///
    /// ```
    /// use catlog::Level;
    ///
    /// assert_eq!(Level::parse("warning"), Level::Warning);
    /// assert_eq!(Level::parse("verbose"), Level::Debug);
    /// ```
    pub fn parse(text: &str) -> Level {
        text.parse().unwrap_or(Level::Debug)
    }

    /// Convert an ordinal back to a level.
    pub const fn from_ordinal(ordinal: usize) -> Option<Level> {
        if ordinal < Level::ALL.len() {
            Some(Level::ALL[ordinal])
        } else {
            None
        }
    }

    /// The ordinal of this level.
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// The fixed-width (5 characters) name, e.g. `"INFO "`.
    pub const fn long_name(self) -> &'static str {
        LONG_NAMES[self as usize]
    }

    /// The one character name, e.g. `"I"`.
    pub const fn short_name(self) -> &'static str {
        SHORT_NAMES[self as usize]
    }

    /// The canonical name, e.g. `"WARNING"`.
    pub const fn name(self) -> &'static str {
        NAMES[self as usize]
    }

    /// The long name of an arbitrary ordinal, `"UNKNOWN"` when out of range.
    pub fn long_name_of(ordinal: usize) -> &'static str {
        LONG_NAMES.get(ordinal).copied().unwrap_or("UNKNOWN")
    }

    /// The short name of an arbitrary ordinal, `"UNKNOWN"` when out of range.
    pub fn short_name_of(ordinal: usize) -> &'static str {
        SHORT_NAMES.get(ordinal).copied().unwrap_or("UNKNOWN")
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(s))
            .and_then(Level::from_ordinal)
            .ok_or_else(|| {
                Error::new(ErrorKind::InvalidConfig, "unknown level name").with_context("level", s)
            })
    }
}
