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

//! Route records emitted through the [`log`] crate facade into a [`Registry`].
//!
//! The record target selects the category, so `log::info!(target: "net", ..)` logs through
//! `registry.get("net")`. Records logged without an explicit target use the module path as the
//! category name, which usually falls back to the default console category.

use std::borrow::Cow;
use std::sync::Arc;

use crate::Error;
use crate::ErrorKind;
use crate::Level;
use crate::Registry;
use crate::Source;

/// A [`log::Log`] implementation forwarding to the categories of a [`Registry`].
#[derive(Debug)]
pub struct LogBridge {
    registry: Arc<Registry>,
}

impl LogBridge {
    /// Routes `log` records through the categories of `registry`.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// The registry records are dispatched through.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

/// Map a [`log::Level`] to the level of the same name.
pub fn level_from_log(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warning,
        log::Level::Info => Level::Info,
        log::Level::Debug => Level::Debug,
        log::Level::Trace => Level::Trace,
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let level = level_from_log(metadata.level());
        self.registry.get(metadata.target()).enabled(level)
    }

    fn log(&self, record: &log::Record) {
        let level = level_from_log(record.level());
        let category = self.registry.get(record.target());
        if !category.enabled(level) {
            return;
        }

        let file = match record.file_static() {
            Some(file) => Cow::Borrowed(file),
            None => Cow::Owned(record.file().unwrap_or_default().to_string()),
        };
        let source = Source::new(file, record.line().unwrap_or_default());
        category.log_at(level, source, record.args());
    }

    // writers flush when the registry closes
    fn flush(&self) {}
}

/// Install a [`LogBridge`] over `registry` as the log crate global logger.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// let registry = Arc::new(catlog::Registry::new());
/// catlog::bridge::try_setup(registry.clone()).unwrap();
///
/// log::info!(target: "app", "forwarded");
/// registry.close();
/// ```
pub fn try_setup(registry: Arc<Registry>) -> Result<(), Error> {
    log::set_boxed_logger(Box::new(LogBridge::new(registry))).map_err(|err| {
        Error::new(ErrorKind::Unexpected, "failed to set up the log crate global logger")
            .with_source(err)
    })?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Install a [`LogBridge`] over `registry` as the log crate global logger.
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
pub fn setup(registry: Arc<Registry>) {
    try_setup(registry).expect(
        "catlog::bridge::setup must be called before the log crate global logger initialized",
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use log::Log;

    use super::*;
    use crate::Category;
    use crate::Filter;
    use crate::Layout;
    use crate::Writer;
    use crate::record::FormattedRecord;

    #[derive(Debug, Default)]
    struct Collect(Mutex<Vec<String>>);

    impl Writer for Collect {
        fn write(&self, record: Arc<FormattedRecord>) -> Result<(), Error> {
            self.0.lock().unwrap().push(record.formatted().to_string());
            Ok(())
        }

        fn close(&self) {}
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_from_log(log::Level::Error), Level::Error);
        assert_eq!(level_from_log(log::Level::Warn), Level::Warning);
        assert_eq!(level_from_log(log::Level::Info), Level::Info);
        assert_eq!(level_from_log(log::Level::Debug), Level::Debug);
        assert_eq!(level_from_log(log::Level::Trace), Level::Trace);
    }

    #[test]
    fn test_forwards_to_target_category() {
        let writer = Arc::new(Collect::default());
        let registry = Arc::new(Registry::new());
        registry.register(
            Category::new("net").with_filter(
                Filter::new("net", Level::Info, Arc::new(Layout::compile("%L %C (%S) %M")))
                    .with_writer(writer.clone()),
            ),
        );
        let bridge = LogBridge::new(registry.clone());

        let metadata = log::Metadata::builder()
            .target("net")
            .level(log::Level::Debug)
            .build();
        assert!(!bridge.enabled(&metadata));

        bridge.log(
            &log::Record::builder()
                .target("net")
                .level(log::Level::Warn)
                .file_static(Some("src/net/conn.rs"))
                .line(Some(12))
                .args(format_args!("peer {} gone", 7))
                .build(),
        );
        bridge.log(
            &log::Record::builder()
                .target("net")
                .level(log::Level::Trace)
                .args(format_args!("dropped"))
                .build(),
        );

        assert_eq!(*writer.0.lock().unwrap(), ["WARN  net (conn.rs:12) peer 7 gone"]);
        registry.close();
    }
}
