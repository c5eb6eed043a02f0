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

//! Catlog is a category based logging library: records are tagged with a category name and a
//! [`Level`], filtered per category, rendered through template [`Layout`]s and written by
//! asynchronous writers to the console or to rotating files.
//!
//! # Overview
//!
//! A [`Registry`] maps category names to [`Category`] handles. Each category owns an ordered
//! chain of [`Filter`]s; a filter has a level threshold, a layout and a list of [`Writer`]s.
//! Filtering and rendering run on the calling thread. Each writer owns a background thread fed
//! through a bounded queue, so callers only wait for I/O when that queue is full.
//!
//! Categories can be built by hand or loaded from a JSON [`Config`]. Names that were never
//! configured log everything to the console with the default layout.
//!
//! # Examples
//!
//! Log through the default console category:
//!
//! ```
//! let registry = catlog::Registry::new();
//!
//! let app = registry.get("app");
//! app.info("This is an info message.");
//! catlog::debug!(app, "{} workers started", 4);
//!
//! registry.close();
//! ```
//!
//! Configure categories and rotating files:
//!
//! ```
//! use catlog::Config;
//! use catlog::Registry;
//!
//! let dir = std::env::temp_dir().join("catlog-doc");
//! let config = Config::from_json_str(&format!(
//!     r#"{{
//!         "files": {{ "app": {{ "filename": "{}/app", "maxsize": "1M" }} }},
//!         "layouts": {{ "plain": "[%T{{15:04:05}}] %L %C %M" }},
//!         "categories": {{
//!             "net": {{
//!                 "enable": true,
//!                 "filters": [{{ "level": "INFO", "layout": "plain", "output": ["app", "console"] }}]
//!             }}
//!         }}
//!     }}"#,
//!     dir.display(),
//! ))
//! .unwrap();
//!
//! let registry = Registry::new();
//! registry.load(&config).unwrap();
//!
//! let net = registry.get("net");
//! net.info("listening");
//! net.debug("filtered out");
//!
//! registry.close();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

#[cfg(feature = "bridge-log")]
pub mod bridge;
pub mod config;
pub mod layout;
pub mod record;
pub mod writer;

mod category;
mod error;
mod filter;
mod level;
mod macros;
mod registry;
mod trap;

pub use self::category::Category;
pub use self::config::Config;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::filter::Filter;
pub use self::layout::Layout;
pub use self::level::Level;
pub use self::record::FormattedRecord;
pub use self::record::Record;
pub use self::record::Source;
pub use self::registry::Registry;
pub use self::trap::DefaultTrap;
pub use self::trap::Trap;
pub use self::writer::ConsoleWriter;
pub use self::writer::FileWriter;
pub use self::writer::FileWriterBuilder;
pub use self::writer::RotationPolicy;
pub use self::writer::Writer;
