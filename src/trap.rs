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

//! Where pipeline errors go.

use std::fmt;
use std::io;
use std::io::Write;
use std::sync::Arc;

use crate::Error;

/// Receives errors raised after a logging call has been accepted.
///
/// Rendering failures, rejected submissions and sink I/O errors are never returned to the code
/// that logged. Filters and writers hand them to their trap instead.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Receive a failure that could not be returned to a caller.
    fn trap(&self, err: &Error);
}

impl<T: Trap + ?Sized> Trap for Arc<T> {
    fn trap(&self, err: &Error) {
        T::trap(self, err);
    }
}

/// Prints each error on its own line to standard output, prefixed with `catlog:`.
///
/// Nothing happens when standard output is gone.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct DefaultTrap {}

impl Trap for DefaultTrap {
    fn trap(&self, err: &Error) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "catlog: {err}");
    }
}
