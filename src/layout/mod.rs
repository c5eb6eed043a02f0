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

//! Template layouts for rendering records.
//!
//! A layout is compiled once from a template string and then rendered for every accepted
//! record. Directives start with `%`:
//!
//! | Directive | Output |
//! |---|---|
//! | `%T` | creation time, `%T{<format>}` picks the format (default `2006-01-02 15:04:05.000`) |
//! | `%L` | five character level name, e.g. `INFO ` |
//! | `%l` | one character level name, e.g. `I` |
//! | `%C` | category name |
//! | `%S` | `<file>:<line>` of the call site |
//! | `%G` | thread identifier as 16 hex digits |
//! | `%M` | message |
//! | `%%` | a literal `%` |
//!
//! Unknown directives are copied through untouched, so a bad template degrades instead of
//! failing. See [`time_format`] for the timestamp format notation.
//!
//! # Examples
//!
//! ```
//! use catlog::Layout;
//!
//! let layout = Layout::compile("%l %C: %M");
//! assert_eq!(layout.sections().len(), 5);
//! ```

use std::fmt::Write;
use std::mem;

use jiff::fmt::strtime::BrokenDownTime;
use jiff::fmt::strtime::Config;

use crate::Error;
use crate::ErrorKind;
use crate::record::Record;

pub mod time_format;

/// The template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "[%T] %L %C (%S) %M";

/// The timestamp format used by a bare `%T`.
pub const DEFAULT_TIME_FORMAT: &str = "2006-01-02 15:04:05.000";

/// One token of a compiled layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Section {
    /// Text copied as is.
    Literal(String),
    /// The creation time, rendered with a strftime format.
    Time(String),
    /// [`Level::long_name`](crate::Level::long_name).
    LongLevel,
    /// [`Level::short_name`](crate::Level::short_name).
    ShortLevel,
    /// The category name.
    Category,
    /// `<file>:<line>`.
    Source,
    /// The thread identifier, 16 hex digits.
    ThreadId,
    /// The message text.
    Message,
}

/// A compiled template.
///
/// Layouts are immutable and meant to be shared, typically behind an `Arc`, by every filter
/// that renders with them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    template: String,
    sections: Vec<Section>,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::compile(DEFAULT_TEMPLATE)
    }
}

impl Layout {
    /// Compile a template. Never fails.
    pub fn compile(template: &str) -> Layout {
        let mut sections = vec![];
        let mut literal = String::new();
        let mut rest = template;

        while let Some(idx) = rest.find('%') {
            literal.push_str(&rest[..idx]);
            let after = &rest[idx + 1..];
            let Some(ch) = after.chars().next() else {
                // a trailing '%' stays literal
                literal.push('%');
                rest = "";
                break;
            };
            rest = &after[ch.len_utf8()..];

            let section = match ch {
                'T' => {
                    let (format, remaining) = split_time_format(rest);
                    rest = remaining;
                    Section::Time(time_format::to_strftime(format))
                }
                'L' => Section::LongLevel,
                'l' => Section::ShortLevel,
                'C' => Section::Category,
                'S' => Section::Source,
                'G' => Section::ThreadId,
                'M' => Section::Message,
                '%' => {
                    literal.push('%');
                    continue;
                }
                other => {
                    literal.push('%');
                    literal.push(other);
                    continue;
                }
            };

            if !literal.is_empty() {
                sections.push(Section::Literal(mem::take(&mut literal)));
            }
            sections.push(section);
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            sections.push(Section::Literal(literal));
        }

        Layout {
            template: template.to_string(),
            sections,
        }
    }

    /// The template this layout was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The compiled sections in rendering order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Render a record. The result has no trailing newline.
    ///
    /// # Errors
    ///
    /// Return an error if a timestamp format cannot be rendered.
    pub fn format(&self, record: &Record) -> Result<String, Error> {
        let mut out = String::with_capacity(64 + record.message().len());
        // bad directives fail the render instead of being echoed
        let strict = Config::new().lenient(false);

        for section in &self.sections {
            match section {
                Section::Literal(text) => out.push_str(text),
                Section::Time(format) => {
                    BrokenDownTime::from(record.created())
                        .format_with_config(&strict, format, &mut out)
                        .map_err(|err| {
                            Error::new(ErrorKind::Render, "failed to format record time")
                                .with_context("time_format", format)
                                .with_source(err)
                        })?;
                }
                Section::LongLevel => out.push_str(record.level().long_name()),
                Section::ShortLevel => out.push_str(record.level().short_name()),
                Section::Category => out.push_str(record.category()),
                Section::Source => {
                    let source = record.source();
                    // SAFETY: write to a string always succeeds
                    write!(&mut out, "{}:{}", source.file(), source.line()).unwrap();
                }
                Section::ThreadId => {
                    // SAFETY: write to a string always succeeds
                    write!(&mut out, "{:016x}", record.source().thread_id()).unwrap();
                }
                Section::Message => out.push_str(record.message()),
            }
        }

        Ok(out)
    }
}

/// Split `{format}rest` after a `%T`; anything else keeps the default format.
fn split_time_format(s: &str) -> (&str, &str) {
    if s.len() < 2 || !s.starts_with('{') {
        return (DEFAULT_TIME_FORMAT, s);
    }

    match s.find('}') {
        Some(idx) => (&s[1..idx], &s[idx + 1..]),
        None => (DEFAULT_TIME_FORMAT, s),
    }
}
