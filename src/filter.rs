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

//! Level-gated, layout-bound fan-out units.

use std::fmt;
use std::sync::Arc;

use crate::DefaultTrap;
use crate::Error;
use crate::ErrorKind;
use crate::Layout;
use crate::Level;
use crate::Trap;
use crate::Writer;
use crate::record::FormattedRecord;
use crate::record::Record;

/// A filter of a [`Category`](crate::Category).
///
/// A filter accepts records at or above its threshold, renders them with its layout, and
/// hands the result to each of its writers in the order they were added. Layouts and writers
/// are shared, not owned.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use catlog::ConsoleWriter;
/// use catlog::Filter;
/// use catlog::Layout;
/// use catlog::Level;
///
/// let console = Arc::new(ConsoleWriter::new());
/// let filter = Filter::new("net", Level::Info, Arc::new(Layout::default())).with_writer(console);
/// assert_eq!(filter.threshold(), Level::Info);
/// ```
#[derive(Clone)]
pub struct Filter {
    category: Arc<str>,
    threshold: Level,
    layout: Arc<Layout>,
    writers: Vec<Arc<dyn Writer>>,
    trap: Arc<dyn Trap>,
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("category", &self.category)
            .field("threshold", &self.threshold)
            .field("layout", &self.layout.template())
            .field("writers", &self.writers)
            .finish()
    }
}

impl Filter {
    /// Create a filter without writers.
    pub fn new(category: impl Into<Arc<str>>, threshold: Level, layout: Arc<Layout>) -> Self {
        Self {
            category: category.into(),
            threshold,
            layout,
            writers: vec![],
            trap: Arc::new(DefaultTrap::default()),
        }
    }

    /// Add a writer after the existing ones.
    pub fn with_writer(mut self, writer: Arc<dyn Writer>) -> Self {
        self.writers.push(writer);
        self
    }

    /// Set the trap receiving render and submission errors.
    ///
    /// Default to [`DefaultTrap`].
    pub fn with_trap(mut self, trap: impl Trap) -> Self {
        self.trap = Arc::new(trap);
        self
    }

    pub(crate) fn with_shared_trap(mut self, trap: Arc<dyn Trap>) -> Self {
        self.trap = trap;
        self
    }

    /// The name of the owning category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The minimum accepted level.
    pub fn threshold(&self) -> Level {
        self.threshold
    }

    /// The layout used to render records.
    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// The writers, in fan-out order.
    pub fn writers(&self) -> &[Arc<dyn Writer>] {
        &self.writers
    }

    /// Whether a record of this level passes the threshold.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.threshold
    }

    /// Offer a record to this filter.
    ///
    /// Records below the threshold are ignored. Failures are reported to the trap and never
    /// returned; a writer that rejects the record does not keep the others from receiving it.
    pub fn accept(&self, record: &Record) {
        if !self.enabled(record.level()) {
            return;
        }

        let formatted = match self.layout.format(record) {
            Ok(formatted) => formatted,
            Err(err) => {
                self.trap.trap(&with_record_context(err, record));
                return;
            }
        };

        let formatted = Arc::new(FormattedRecord::new(record.created().clone(), formatted));
        for writer in &self.writers {
            if let Err(err) = writer.write(formatted.clone()) {
                self.trap.trap(&with_record_context(err, record));
            }
        }
    }
}

fn with_record_context(err: Error, record: &Record) -> Error {
    Error::new(ErrorKind::Dispatch, "failed to dispatch log record")
        .with_context("category", record.category())
        .with_context("message", record.message())
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use jiff::Zoned;

    use super::*;
    use crate::record::Source;

    #[derive(Debug, Default)]
    struct Collect {
        lines: Mutex<Vec<String>>,
        closed: bool,
    }

    impl Collect {
        fn closed() -> Self {
            Self {
                lines: Mutex::default(),
                closed: true,
            }
        }

        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Writer for Collect {
        fn write(&self, record: Arc<FormattedRecord>) -> Result<(), Error> {
            if self.closed {
                return Err(Error::new(ErrorKind::Closed, "writer is closed"));
            }
            self.lines.lock().unwrap().push(record.formatted().to_string());
            Ok(())
        }

        fn close(&self) {}
    }

    #[derive(Debug, Default, Clone)]
    struct Errors(Arc<Mutex<Vec<String>>>);

    impl Trap for Errors {
        fn trap(&self, err: &Error) {
            self.0.lock().unwrap().push(err.to_string());
        }
    }

    fn record(level: Level, message: &str) -> Record {
        let created: Zoned = "2024-03-01T08:00:00[UTC]".parse().unwrap();
        Record::new("X", level, message, Source::new("a.rs", 3)).with_created(created)
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let writer = Arc::new(Collect::default());
        let filter = Filter::new("X", Level::Warning, Arc::new(Layout::compile("%l %M")))
            .with_writer(writer.clone());

        for level in Level::ALL {
            filter.accept(&record(level, level.name()));
        }

        assert_eq!(writer.lines(), ["W WARNING", "E ERROR", "C CRITICAL"]);
    }

    #[test]
    fn test_fan_out_delivers_same_content() {
        let first = Arc::new(Collect::default());
        let second = Arc::new(Collect::default());
        let filter = Filter::new("X", Level::Debug, Arc::new(Layout::default()))
            .with_writer(first.clone())
            .with_writer(second.clone());

        filter.accept(&record(Level::Info, "hello"));

        assert_eq!(first.lines(), ["[2024-03-01 08:00:00.000] INFO  X (a.rs:3) hello"]);
        assert_eq!(first.lines(), second.lines());
    }

    #[test]
    fn test_failing_writer_does_not_stop_the_others() {
        let errors = Errors::default();
        let healthy = Arc::new(Collect::default());
        let filter = Filter::new("X", Level::Debug, Arc::new(Layout::compile("%M")))
            .with_writer(Arc::new(Collect::closed()))
            .with_writer(healthy.clone())
            .with_trap(errors.clone());

        filter.accept(&record(Level::Error, "boom"));

        assert_eq!(healthy.lines(), ["boom"]);
        let errors = errors.0.lock().unwrap().clone();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("dispatch: failed to dispatch log record"));
        assert!(errors[0].contains("writer is closed"));
    }

    #[test]
    fn test_render_errors_are_trapped() {
        let errors = Errors::default();
        let writer = Arc::new(Collect::default());
        // a dangling '%' is not a valid strftime format
        let filter = Filter::new("X", Level::Debug, Arc::new(Layout::compile("%T{%} %M")))
            .with_writer(writer.clone())
            .with_trap(errors.clone());

        filter.accept(&record(Level::Info, "never rendered"));

        assert!(writer.lines().is_empty());
        let errors = errors.0.lock().unwrap().clone();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("render: failed to format record time"));
    }
}
