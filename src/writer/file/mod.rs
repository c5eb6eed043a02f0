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

//! A writer appending records to a file, with size, day and line-count rotation.
//!
//! # Example
//!
//! ```
//! use catlog::FileWriter;
//! use catlog::Writer;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let writer = FileWriter::builder(dir.path().join("app"))
//!     .daily(true)
//!     .max_size(10 * 1024 * 1024)
//!     .build();
//!
//! assert_eq!(writer.path(), dir.path().join("app.log"));
//! writer.close();
//! ```

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crate::DefaultTrap;
use crate::Error;
use crate::Trap;
use crate::record::FormattedRecord;
use crate::writer::Writer;
use crate::writer::worker::AsyncState;

mod rolling;

use self::rolling::RollingFile;

/// When a [`FileWriter`] retires its current file.
///
/// Retired files are renamed next to the active one: `<base>_<YYYYMMDD>.log` in daily mode,
/// `<base>_<n>.log` otherwise, with a further `_<n>` counter in daily mode when the name is
/// already taken.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Master switch. Without it the file only ever grows.
    pub rotate: bool,
    /// Roll over when the calendar day of a record differs from the day the file was opened.
    pub daily: bool,
    /// Roll over before a line would push the file past this many bytes. `0` disables it.
    pub max_size: u64,
    /// Roll over once the file holds this many lines. `0` disables it.
    pub max_lines: u64,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            rotate: true,
            daily: true,
            max_size: 10 * 1024 * 1024,
            max_lines: 0,
        }
    }
}

/// A writer appending records to a file.
///
/// The file is opened lazily by the background thread when the first record arrives. I/O
/// errors are reported to the writer's [`Trap`]; the failed record is lost and the next one
/// triggers a fresh open.
#[derive(Debug)]
pub struct FileWriter {
    path: PathBuf,
    policy: RotationPolicy,
    state: AsyncState,
}

impl FileWriter {
    /// Create a new [`FileWriterBuilder`]. A `.log` extension is added to `filename` when
    /// missing.
    pub fn builder(filename: impl Into<PathBuf>) -> FileWriterBuilder {
        FileWriterBuilder::new(filename)
    }

    /// The path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The rotation policy.
    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }
}

impl Writer for FileWriter {
    fn write(&self, record: Arc<FormattedRecord>) -> Result<(), Error> {
        self.state
            .send(record)
            .map_err(|err| err.with_context("path", self.path.display()))
    }

    fn close(&self) {
        self.state.close();
    }
}

/// A builder for configuring a [`FileWriter`].
#[derive(Debug)]
pub struct FileWriterBuilder {
    filename: PathBuf,
    policy: RotationPolicy,
    thread_name: String,
    buffered_lines_limit: usize,
    trap: Arc<dyn Trap>,
}

impl FileWriterBuilder {
    /// The queue capacity used unless configured otherwise.
    pub const DEFAULT_BUFFERED_LINES_LIMIT: usize = 32;

    /// Create a new builder with the default [`RotationPolicy`].
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            policy: RotationPolicy::default(),
            thread_name: "catlog-file".to_string(),
            buffered_lines_limit: Self::DEFAULT_BUFFERED_LINES_LIMIT,
            trap: Arc::new(DefaultTrap::default()),
        }
    }

    /// Replace the whole rotation policy.
    pub fn policy(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable rotation.
    pub fn rotate(mut self, rotate: bool) -> Self {
        self.policy.rotate = rotate;
        self
    }

    /// Enable or disable rolling over when the day changes.
    pub fn daily(mut self, daily: bool) -> Self {
        self.policy.daily = daily;
        self
    }

    /// Set the size threshold in bytes, `0` to disable.
    pub fn max_size(mut self, max_size: u64) -> Self {
        self.policy.max_size = max_size;
        self
    }

    /// Set the line-count threshold, `0` to disable.
    pub fn max_lines(mut self, max_lines: u64) -> Self {
        self.policy.max_lines = max_lines;
        self
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

    /// Set the trap receiving I/O errors.
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
    pub fn build(self) -> FileWriter {
        let Self {
            filename,
            policy,
            thread_name,
            buffered_lines_limit,
            trap,
        } = self;

        let path = with_log_extension(filename);
        let sink = RollingFile::new(path.clone(), policy);
        let state = AsyncState::spawn(thread_name, sink, buffered_lines_limit, trap);
        FileWriter {
            path,
            policy,
            state,
        }
    }
}

fn with_log_extension(filename: PathBuf) -> PathBuf {
    if filename.to_string_lossy().ends_with(".log") {
        return filename;
    }

    let mut filename = filename.into_os_string();
    filename.push(".log");
    filename.into()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use jiff::Zoned;
    use tempfile::TempDir;

    use super::*;

    #[derive(Debug, Default, Clone)]
    struct Collect(Arc<Mutex<Vec<String>>>);

    impl Trap for Collect {
        fn trap(&self, err: &Error) {
            self.0.lock().unwrap().push(err.to_string());
        }
    }

    #[test]
    fn test_log_extension() {
        assert_eq!(with_log_extension("app".into()), PathBuf::from("app.log"));
        assert_eq!(with_log_extension("app.log".into()), PathBuf::from("app.log"));
        assert_eq!(with_log_extension("app.txt".into()), PathBuf::from("app.txt.log"));
        assert_eq!(with_log_extension("logs/app".into()), PathBuf::from("logs/app.log"));
    }

    #[test]
    fn test_writes_every_record_before_close_returns() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let writer = FileWriter::builder(temp_dir.path().join("app"))
            .buffered_lines_limit(2)
            .build();

        let now = Zoned::now();
        for i in 0..500 {
            let record = FormattedRecord::new(now.clone(), format!("record {i}"));
            writer.write(Arc::new(record)).unwrap();
        }
        writer.close();

        let content = fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 500);
        assert_eq!(lines[0], "record 0");
        assert_eq!(lines[499], "record 499");
    }

    #[test]
    fn test_close_twice_and_write_after_close() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let writer = FileWriter::builder(temp_dir.path().join("app")).build();

        writer.close();
        writer.close();

        let record = FormattedRecord::new(Zoned::now(), "late");
        let err = writer.write(Arc::new(record)).unwrap_err();
        assert_eq!(err.message(), "writer is closed");
        assert!(err.context("path").is_some_and(|p| p.ends_with("app.log")));
        assert!(!writer.path().exists());
    }

    #[test]
    fn test_io_errors_go_to_trap() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let path = temp_dir.path().join("app.log");
        fs::create_dir(&path).unwrap();

        let trap = Collect::default();
        let writer = FileWriter::builder(&path)
            .rotate(false)
            .trap(trap.clone())
            .build();

        let record = FormattedRecord::new(Zoned::now(), "lost");
        writer.write(Arc::new(record)).unwrap();
        writer.close();

        let errors = trap.0.lock().unwrap().clone();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("io: failed to open log file"));
    }
}
