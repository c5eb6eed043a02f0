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

use std::fmt;
use std::io;

/// What went wrong, in broad strokes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A configuration could not be read, parsed or resolved.
    InvalidConfig,
    /// A layout failed to render a record.
    Render,
    /// A file or stream operation failed.
    Io,
    /// A writer no longer accepts records.
    Closed,
    /// A record could not be delivered by a filter.
    Dispatch,
    /// Anything else.
    Unexpected,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidConfig => "invalid config",
            ErrorKind::Render => "render",
            ErrorKind::Io => "io",
            ErrorKind::Closed => "closed",
            ErrorKind::Dispatch => "dispatch",
            ErrorKind::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error struct of catlog.
///
/// Configuration loading returns it to the caller. Everything that happens while a record
/// travels through filters and writers is reported to a [`Trap`](crate::Trap) instead.
///
/// The display form is `<kind>: <message> [<key>=<value>, ..]: <source>: ..`.
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
    sources: Vec<anyhow::Error>,
}

impl Error {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: vec![],
            sources: vec![],
        }
    }

    /// Attach a key value pair describing the failing operation.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// The broad class of this failure.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The message without kind, context or sources.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The value of the first context pair with this key.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find_map(|(k, v)| (*k == key).then_some(v.as_str()))
    }

    /// The underlying errors, outermost first.
    pub fn sources(&self) -> impl ExactSizeIterator<Item = &(dyn std::error::Error + 'static)> {
        self.sources.iter().map(|source| source.as_ref())
    }

    pub(crate) fn from_io_error(err: io::Error) -> Error {
        Error::new(ErrorKind::Io, "failed to perform io").with_source(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;

        let mut pairs = self.context.iter();
        if let Some((key, value)) = pairs.next() {
            write!(f, " [{key}={value}")?;
            for (key, value) in pairs {
                write!(f, ", {key}={value}")?;
            }
            f.write_str("]")?;
        }

        for source in &self.sources {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f
                .debug_struct("Error")
                .field("kind", &self.kind)
                .field("message", &self.message)
                .field("context", &self.context)
                .field("sources", &self.sources)
                .finish();
        }

        writeln!(f, "{} ({})", self.message, self.kind)?;
        for (key, value) in &self.context {
            writeln!(f, "    {key}: {value}")?;
        }
        for (idx, source) in self.sources.iter().enumerate() {
            writeln!(f, "  caused by [{idx}]: {source:#}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.sources.first().map(|source| source.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_context_and_sources() {
        let err = Error::new(ErrorKind::InvalidConfig, "output not found")
            .with_context("category", "net")
            .with_context("output", "audit")
            .with_source(io::Error::new(io::ErrorKind::NotFound, "missing"));

        assert_eq!(
            err.to_string(),
            "invalid config: output not found [category=net, output=audit]: missing"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert_eq!(err.message(), "output not found");
        assert_eq!(err.context("output"), Some("audit"));
        assert_eq!(err.context("layout"), None);
        assert_eq!(err.sources().len(), 1);
    }

    #[test]
    fn test_plain_display() {
        let err = Error::new(ErrorKind::Closed, "writer is closed");
        assert_eq!(err.to_string(), "closed: writer is closed");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_debug() {
        let err = Error::from_io_error(io::Error::other("disk full")).with_context("path", "a.log");
        assert_eq!(
            format!("{err:?}"),
            "failed to perform io (io)\n    path: a.log\n  caused by [0]: disk full\n"
        );
        assert!(format!("{err:#?}").starts_with("Error {\n    kind: Io,"));
    }
}
