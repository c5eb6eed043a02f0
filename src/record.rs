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

//! Log records and their rendered form.

use std::borrow::Cow;
use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use jiff::Zoned;

use crate::Level;

/// Where a record was emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    thread_id: u64,
    file: Cow<'static, str>,
    function: Option<Cow<'static, str>>,
    line: u32,
}

impl Source {
    /// Create a source for the given file and line on the current thread.
    ///
    /// Only the base name of `file` is kept.
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        let file = match file.into() {
            Cow::Borrowed(path) => Cow::Borrowed(base_name(path)),
            Cow::Owned(path) => Cow::Owned(base_name(&path).to_owned()),
        };

        Self {
            thread_id: current_thread_id(),
            file,
            function: None,
            line,
        }
    }

    /// Capture the location of the caller.
    ///
    /// Functions marked `#[track_caller]` between the logging call and this one are skipped, so
    /// wrappers stay transparent as long as they carry the attribute too.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }

    /// Set the enclosing function name.
    pub fn with_function(mut self, function: impl Into<Cow<'static, str>>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Override the thread identifier.
    pub fn with_thread_id(mut self, thread_id: u64) -> Self {
        self.thread_id = thread_id;
        self
    }

    /// The identifier of the emitting thread, see [`current_thread_id`].
    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }

    /// The base name of the source file.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The enclosing function, if known.
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// The source line.
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// A small process-local identifier of the current thread.
///
/// Identifiers are handed out sequentially starting at 1 the first time a thread asks for one.
pub fn current_thread_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);

    thread_local! {
        static THREAD_ID: u64 = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    }

    THREAD_ID.with(|id| *id)
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[doc(hidden)]
pub fn function_base_name(path: &'static str) -> &'static str {
    let mut path = path;
    while let Some(stripped) = path.strip_suffix("::{{closure}}") {
        path = stripped;
    }
    path.rsplit("::").next().unwrap_or(path)
}

/// A single log event.
///
/// Built once per logging call and shared by reference with every filter of the category.
#[derive(Clone, Debug)]
pub struct Record {
    category: Arc<str>,
    level: Level,
    created: Zoned,
    message: String,
    source: Source,
}

impl Record {
    /// Create a record stamped with the current time.
    pub fn new(
        category: impl Into<Arc<str>>,
        level: Level,
        message: impl Into<String>,
        source: Source,
    ) -> Self {
        Self {
            category: category.into(),
            level,
            created: Zoned::now(),
            message: message.into(),
            source,
        }
    }

    /// Replace the creation time.
    pub fn with_created(mut self, created: Zoned) -> Self {
        self.created = created;
        self
    }

    /// The name of the category that emitted this record.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The severity.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The creation time.
    pub fn created(&self) -> &Zoned {
        &self.created
    }

    /// The message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The call site.
    pub fn source(&self) -> &Source {
        &self.source
    }
}

/// A record rendered by one layout, ready for a writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattedRecord {
    created: Zoned,
    formatted: String,
}

impl FormattedRecord {
    /// Create a formatted record. `formatted` carries no trailing newline.
    pub fn new(created: Zoned, formatted: impl Into<String>) -> Self {
        Self {
            created,
            formatted: formatted.into(),
        }
    }

    /// The creation time of the originating record.
    pub fn created(&self) -> &Zoned {
        &self.created
    }

    /// The rendered line.
    pub fn formatted(&self) -> &str {
        &self.formatted
    }
}
