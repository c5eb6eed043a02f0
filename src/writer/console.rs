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

//! A writer printing records to standard output.

use std::io;
use std::io::Write;
use std::sync::Arc;

use crate::DefaultTrap;
use crate::Error;
use crate::Trap;
use crate::record::FormattedRecord;
use crate::writer::Writer;
use crate::writer::worker::AsyncState;
use crate::writer::worker::Sink;

/// A writer that prints each record on its own line to standard output.
///
/// A [`Registry`](crate::Registry) creates exactly one console writer and shares it with every
/// category that logs to the console. It is only closed by [`Registry::close`] or an explicit
/// [`Writer::close`].
///
/// # Examples
///
/// ```
/// use catlog::ConsoleWriter;
/// use catlog::Writer;
///
/// let console = ConsoleWriter::new();
/// console.close();
/// ```
///
/// [`Registry::close`]: crate::Registry::close
#[derive(Debug)]
pub struct ConsoleWriter {
    state: AsyncState,
}

impl Default for ConsoleWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleWriter {
    /// Create a console writer with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new [`ConsoleWriterBuilder`].
    pub fn builder() -> ConsoleWriterBuilder {
        ConsoleWriterBuilder::new()
    }
}

impl Writer for ConsoleWriter {
    fn write(&self, record: Arc<FormattedRecord>) -> Result<(), Error> {
        self.state.send(record)
    }

    fn close(&self) {
        self.state.close();
    }
}

/// A builder for configuring a [`ConsoleWriter`].
#[derive(Debug)]
pub struct ConsoleWriterBuilder {
    thread_name: String,
    buffered_lines_limit: usize,
    trap: Arc<dyn Trap>,
}

impl Default for ConsoleWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleWriterBuilder {
    /// The queue capacity used unless configured otherwise.
    pub const DEFAULT_BUFFERED_LINES_LIMIT: usize = 16;

    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            thread_name: "catlog-console".to_string(),
            buffered_lines_limit: Self::DEFAULT_BUFFERED_LINES_LIMIT,
            trap: Arc::new(DefaultTrap::default()),
        }
    }

    /// Set the name of the background thread.
    pub fn thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Set how many records may wait in the queue before producers block.
    pub fn buffered_lines_limit(mut self, buffered_lines_limit: usize) -> Self {
        self.buffered_lines_limit = buffered_lines_limit;
        self
    }

    /// Set the trap receiving write errors.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Trap) -> Self {
        self.trap = Arc::new(trap);
        self
    }

    pub(crate) fn shared_trap(mut self, trap: Arc<dyn Trap>) -> Self {
        self.trap = trap;
        self
    }

    /// Spawn the background thread and return the writer.
    pub fn build(self) -> ConsoleWriter {
        let Self {
            thread_name,
            buffered_lines_limit,
            trap,
        } = self;

        let state = AsyncState::spawn(thread_name, Stdout, buffered_lines_limit, trap);
        ConsoleWriter { state }
    }
}

struct Stdout;

impl Sink for Stdout {
    fn consume(&mut self, record: &FormattedRecord) -> Result<(), Error> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(record.formatted().as_bytes())
            .and_then(|()| stdout.write_all(b"\n"))
            .map_err(Error::from_io_error)
    }

    fn shutdown(&mut self) -> Result<(), Error> {
        io::stdout().flush().map_err(Error::from_io_error)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Zoned;

    use super::*;

    #[test]
    fn test_write_then_close_twice() {
        let console = ConsoleWriter::builder()
            .thread_name("test-console")
            .buffered_lines_limit(1)
            .build();

        for i in 0..10 {
            let record = FormattedRecord::new(Zoned::now(), format!("console line {i}"));
            console.write(Arc::new(record)).unwrap();
        }

        console.close();
        console.close();

        let record = FormattedRecord::new(Zoned::now(), "too late");
        assert!(console.write(Arc::new(record)).is_err());
    }
}
