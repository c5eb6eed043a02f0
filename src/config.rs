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

//! Declarative setup of files, layouts and categories.
//!
//! A [`Config`] is plain data. Hand it to [`Registry::load`](crate::Registry::load) to build the
//! writers, layouts and filters it describes.
//!
//! ```
//! use catlog::Config;
//!
//! let config = Config::from_json_str(
//!     r#"{
//!         "layouts": { "plain": "%L %C %M" },
//!         "categories": {
//!             "net": {
//!                 "enable": true,
//!                 "filters": [{ "level": "info", "layout": "plain", "output": ["console"] }]
//!             }
//!         }
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.categories["net"].filters[0].output, ["console"]);
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::Error;
use crate::ErrorKind;
use crate::Level;
use crate::RotationPolicy;

/// The whole configuration. Every section may be omitted.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File outputs by name. A filter refers to them in its `output` list.
    pub files: HashMap<String, FileConfig>,
    /// Layout templates by name.
    pub layouts: HashMap<String, String>,
    /// Categories by name.
    pub categories: HashMap<String, CategoryConfig>,
}

impl Config {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Config, Error> {
        serde_json::from_str(text).map_err(|err| {
            Error::new(ErrorKind::InvalidConfig, "failed to parse log config").with_source(err)
        })
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Config, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::InvalidConfig, "failed to read log config")
                .with_context("path", path.display())
                .with_source(err)
        })?;
        Self::from_json_str(&text).map_err(|err| err.with_context("path", path.display()))
    }
}

/// A rotating file output.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Base path of the log file. `.log` is appended when missing.
    pub filename: String,
    /// Whether the file rotates at all.
    pub rotate: bool,
    /// Size threshold such as `512K` or `10M`. Suffixes are powers of 1024.
    pub maxsize: String,
    /// Line threshold such as `100K`. Suffixes are powers of 1000. Empty means unlimited.
    pub maxline: String,
    /// Rotate when the day changes.
    pub daily: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            filename: String::new(),
            rotate: true,
            maxsize: "10M".to_string(),
            maxline: String::new(),
            daily: true,
        }
    }
}

impl FileConfig {
    /// The rotation policy these options describe.
    pub fn policy(&self) -> RotationPolicy {
        RotationPolicy {
            rotate: self.rotate,
            daily: self.daily,
            max_size: parse_size(&self.maxsize),
            max_lines: parse_count(&self.maxline),
        }
    }
}

/// A category and its filter chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Disabled categories are ignored.
    pub enable: bool,
    /// Filters the category fans each record out to.
    pub filters: Vec<FilterConfig>,
}

/// One filter: a threshold, a layout and the writers it feeds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Threshold level name, parsed leniently. Unknown names mean DEBUG.
    pub level: String,
    /// Name of an entry in [`Config::layouts`].
    pub layout: String,
    /// `console` or names of entries in [`Config::files`].
    pub output: Vec<String>,
}

impl FilterConfig {
    /// The parsed level, falling back to `Debug` for unknown names.
    pub fn threshold(&self) -> Level {
        Level::parse(&self.level)
    }
}

/// Parse a byte count with an optional `K`, `M` or `G` suffix in powers of 1024.
///
/// Unparsable input reads as 0.
pub fn parse_size(text: &str) -> u64 {
    parse_with_suffix(text, 1024)
}

/// Parse a count with an optional `K`, `M` or `G` suffix in powers of 1000.
///
/// Unparsable input reads as 0.
pub fn parse_count(text: &str) -> u64 {
    parse_with_suffix(text, 1000)
}

fn parse_with_suffix(text: &str, base: u64) -> u64 {
    let text = text.trim();
    let (digits, scale) = match text.char_indices().last() {
        Some((at, suffix)) if at > 0 => match suffix.to_ascii_uppercase() {
            'K' => (&text[..at], base),
            'M' => (&text[..at], base * base),
            'G' => (&text[..at], base * base * base),
            _ => (text, 1),
        },
        _ => (text, 1),
    };
    digits
        .parse::<u64>()
        .map_or(0, |value| value.saturating_mul(scale))
}
