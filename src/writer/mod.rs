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

//! Asynchronous sinks for formatted records.
//!
//! Every writer owns one background thread that is the only consumer of a bounded queue and
//! the only owner of the sink state (stdout handle, file handle, rotation counters). Producers
//! block while the queue is full, so a slow sink slows the logging callers down instead of
//! losing records.

use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::record::FormattedRecord;

pub mod console;
pub mod file;
mod worker;

pub use self::console::ConsoleWriter;
pub use self::console::ConsoleWriterBuilder;
pub use self::file::FileWriter;
pub use self::file::FileWriterBuilder;
pub use self::file::RotationPolicy;

/// A destination for formatted records.
///
/// One writer may be shared by many filters across many categories.
pub trait Writer: fmt::Debug + Send + Sync + 'static {
    /// Submit a record.
    ///
    /// Blocks while the writer's queue is full. Records are never dropped silently: a writer
    /// that can no longer accept input returns an error.
    fn write(&self, record: Arc<FormattedRecord>) -> Result<(), Error>;

    /// Stop accepting records, wait until everything queued has been written and the
    /// background thread has exited.
    ///
    /// Calling `close` more than once is a no-op.
    fn close(&self);
}
