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

//! Named logging entry points.

use std::fmt;
use std::sync::Arc;

use crate::Filter;
use crate::Level;
use crate::record::Record;
use crate::record::Source;

/// A named logging entry point owning an ordered chain of [`Filter`]s.
///
/// Every logging call builds one [`Record`] and offers it to each filter in the order the
/// filters were added, synchronously on the calling thread. Only the writers behind the
/// filters work asynchronously. A category without filters discards everything.
///
/// The call site is captured with `#[track_caller]`: wrappers around these methods should
/// carry the attribute as well to report their own caller. Adapters that know the real
/// location can pass it through [`Category::log_at`].
///
/// For format strings, use the [`info!`](crate::info) family of macros.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use catlog::Category;
/// use catlog::ConsoleWriter;
/// use catlog::Filter;
/// use catlog::Layout;
/// use catlog::Level;
///
/// let console = Arc::new(ConsoleWriter::new());
/// let layout = Arc::new(Layout::compile("%L %C %M"));
/// let net = Category::new("net").with_filter(
///     Filter::new("net", Level::Info, layout).with_writer(console),
/// );
///
/// net.info("connected");
/// net.debug("dropped by the filter");
/// catlog::warn!(net, "retrying in {}s", 5);
/// ```
#[derive(Clone, Debug)]
pub struct Category {
    name: Arc<str>,
    filters: Vec<Filter>,
}

impl Category {
    /// Create a category without filters.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            filters: vec![],
        }
    }

    /// Add a filter after the existing ones.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.add_filter(filter);
        self
    }

    /// Add a filter after the existing ones.
    pub fn add_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// The category name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The filters, in evaluation order.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Whether any filter would accept a record of this level.
    pub fn enabled(&self, level: Level) -> bool {
        self.filters.iter().any(|filter| filter.enabled(level))
    }

    /// Log at [`Level::Critical`].
    #[track_caller]
    pub fn critical(&self, message: impl fmt::Display) {
        self.log(Level::Critical, message);
    }

    /// Log at [`Level::Error`].
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::Error, message);
    }

    /// Log at [`Level::Warning`].
    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::Warning, message);
    }

    /// Log at [`Level::Info`].
    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::Info, message);
    }

    /// Log at [`Level::Debug`].
    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::Debug, message);
    }

    /// Log at [`Level::Trace`].
    #[track_caller]
    pub fn trace(&self, message: impl fmt::Display) {
        self.log(Level::Trace, message);
    }

    /// Log at the given level.
    #[track_caller]
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        if self.enabled(level) {
            self.log_at(level, Source::caller(), message);
        }
    }

    /// Log pre-formatted arguments at the given level.
    ///
    /// Static format strings are copied without running the formatter.
    #[track_caller]
    pub fn log_args(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.enabled(level) {
            self.log_at(level, Source::caller(), args);
        }
    }

    /// Log at the given level with an explicit call site.
    pub fn log_at(&self, level: Level, source: Source, message: impl fmt::Display) {
        if !self.enabled(level) {
            return;
        }

        let record = Record::new(self.name.clone(), level, message.to_string(), source);
        self.dispatch(&record);
    }

    /// Offer a prepared record to every filter, in order.
    pub fn dispatch(&self, record: &Record) {
        for filter in &self.filters {
            filter.accept(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::Error;
    use crate::Layout;
    use crate::Writer;
    use crate::record::FormattedRecord;

    #[derive(Debug, Default)]
    struct Collect(Mutex<Vec<String>>);

    impl Collect {
        fn lines(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Writer for Collect {
        fn write(&self, record: Arc<FormattedRecord>) -> Result<(), Error> {
            self.0.lock().unwrap().push(record.formatted().to_string());
            Ok(())
        }

        fn close(&self) {}
    }

    fn category(template: &str, threshold: Level) -> (Category, Arc<Collect>) {
        let writer = Arc::new(Collect::default());
        let filter = Filter::new("app", threshold, Arc::new(Layout::compile(template)))
            .with_writer(writer.clone());
        (Category::new("app").with_filter(filter), writer)
    }

    #[track_caller]
    fn wrapped_info(category: &Category, message: &str) {
        category.info(message);
    }

    #[test]
    fn test_level_methods() {
        let (app, writer) = category("%l %M", Level::Debug);

        app.debug("d");
        app.trace("t");
        app.info("i");
        app.warn("w");
        app.error("e");
        app.critical("c");
        app.log(Level::Info, 42);

        assert_eq!(writer.lines(), ["D d", "T t", "I i", "W w", "E e", "C c", "I 42"]);
    }

    #[test]
    fn test_captures_call_site() {
        let (app, writer) = category("%S", Level::Debug);

        let line = line!() + 1;
        app.info("here");
        let wrapped_line = line!() + 1;
        wrapped_info(&app, "through a wrapper");

        assert_eq!(
            writer.lines(),
            [format!("category.rs:{line}"), format!("category.rs:{wrapped_line}")]
        );
    }

    #[test]
    fn test_explicit_source() {
        let (app, writer) = category("%S %M", Level::Debug);

        app.log_at(Level::Error, Source::new("src/adapter.rs", 77), "adapted");

        assert_eq!(writer.lines(), ["adapter.rs:77 adapted"]);
    }

    #[test]
    fn test_filters_run_in_order_with_their_own_layout() {
        let writer = Arc::new(Collect::default());
        let app = Category::new("app")
            .with_filter(
                Filter::new("app", Level::Debug, Arc::new(Layout::compile("first %M")))
                    .with_writer(writer.clone()),
            )
            .with_filter(
                Filter::new("app", Level::Error, Arc::new(Layout::compile("second %l")))
                    .with_writer(writer.clone()),
            );

        app.info("a");
        app.error("b");

        assert_eq!(writer.lines(), ["first a", "first b", "second E"]);
    }

    #[test]
    fn test_without_filters_is_silent() {
        let app = Category::new("app");
        assert!(!app.enabled(Level::Critical));
        app.critical("nobody listens");
        assert!(app.filters().is_empty());
    }

    #[test]
    fn test_macros() {
        let (app, writer) = category("%l %M", Level::Info);
        let shared = Arc::new(app);

        crate::info!(shared, "{} + {} = {}", 1, 2, 1 + 2);
        crate::debug!(shared, "filtered {}", "out");
        crate::log!(shared, Level::Warning, "plain");
        crate::critical!(&*shared, "{:>4}", 7);

        assert_eq!(writer.lines(), ["I 1 + 2 = 3", "W plain", "C    7"]);
    }

    #[test]
    fn test_function_name() {
        let source = Source::new(file!(), line!()).with_function(crate::__function_name!());
        assert_eq!(source.function(), Some("test_function_name"));

        let in_closure = || crate::__function_name!();
        assert_eq!(in_closure(), "test_function_name");
    }

    #[test]
    fn test_log_args() {
        let (app, writer) = category("%M", Level::Debug);

        app.log_args(Level::Info, format_args!("static"));
        app.log_args(Level::Info, format_args!("{}-{}", "a", 1));

        assert_eq!(writer.lines(), ["static", "a-1"]);
    }
}
