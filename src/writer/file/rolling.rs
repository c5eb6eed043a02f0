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

use std::fs;
use std::fs::File;
use std::fs::Metadata;
use std::fs::OpenOptions;
use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;

use crate::Error;
use crate::ErrorKind;
use crate::record::FormattedRecord;
use crate::writer::file::RotationPolicy;
use crate::writer::worker::Sink;

/// The file state behind a [`FileWriter`](super::FileWriter).
///
/// Only the writer's worker thread ever touches it.
#[derive(Debug)]
pub(crate) struct RollingFile {
    path: PathBuf,
    policy: RotationPolicy,
    file: Option<File>,
    current_size: u64,
    current_lines: u64,
    current_date: Option<Date>,
}

impl RollingFile {
    pub(crate) fn new(path: PathBuf, policy: RotationPolicy) -> Self {
        Self {
            path,
            policy,
            file: None,
            current_size: 0,
            current_lines: 0,
            current_date: None,
        }
    }

    pub(crate) fn write_record(&mut self, record: &FormattedRecord) -> Result<(), Error> {
        let date = record.created().date();
        let line = record.formatted().as_bytes();
        let line_size = line.len() as u64 + 1;

        if self.file.is_none() {
            self.rotate(date, false)?;
        }
        if self.should_rollover(date, line_size) {
            self.rotate(date, true)?;
        }

        let Some(file) = self.file.as_mut() else {
            return Err(Error::new(ErrorKind::Io, "log file is not open")
                .with_context("path", self.path.display()));
        };

        match file.write_all(line).and_then(|()| file.write_all(b"\n")) {
            Ok(()) => {
                self.current_size += line_size;
                self.current_lines += 1;
                Ok(())
            }
            Err(err) => {
                // start over with a fresh open and rotation check on the next record
                self.file = None;
                Err(Error::from_io_error(err).with_context("path", self.path.display()))
            }
        }
    }

    fn should_rollover(&self, date: Date, line_size: u64) -> bool {
        let RotationPolicy {
            rotate,
            daily,
            max_size,
            max_lines,
        } = self.policy;

        if !rotate {
            return false;
        }

        // records racing across midnight may arrive slightly out of order
        let day_changed = daily && self.current_date.is_some_and(|current| date > current);
        let size_exceeded =
            max_size > 0 && self.current_size > 0 && self.current_size + line_size > max_size;
        let lines_exceeded = max_lines > 0 && self.current_lines >= max_lines;
        day_changed || size_exceeded || lines_exceeded
    }

    /// Close the current file, retire it by renaming if needed, and open a fresh one.
    ///
    /// `triggered` is set when a rollover condition fired on the open file; otherwise the
    /// existing file on disk is only retired when it is stale or oversized.
    fn rotate(&mut self, date: Date, triggered: bool) -> Result<(), Error> {
        self.file = None;

        if self.policy.rotate {
            match fs::metadata(&self.path) {
                Ok(metadata) => {
                    let (retire, file_date) = if triggered {
                        (true, self.current_date.unwrap_or(date))
                    } else {
                        let modified = modified_date(&metadata).unwrap_or(date);
                        let stale = self.policy.daily && modified != date;
                        let oversized =
                            self.policy.max_size > 0 && metadata.len() > self.policy.max_size;
                        (stale || oversized, modified)
                    };

                    if retire {
                        self.retire(file_date)?;
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(Error::new(ErrorKind::Io, "failed to inspect log file")
                        .with_context("path", self.path.display())
                        .with_source(err));
                }
            }
        }

        let file = open_append(&self.path)?;
        self.current_size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.current_lines = if self.policy.max_lines > 0 && self.current_size > 0 {
            count_lines(&self.path)?
        } else {
            0
        };
        self.current_date = Some(date);
        self.file = Some(file);
        Ok(())
    }

    fn retire(&self, file_date: Date) -> Result<(), Error> {
        let target = if self.policy.daily {
            let date = file_date.strftime("%Y%m%d").to_string();
            self.free_path(0, |idx| match idx {
                0 => format!("_{date}"),
                n => format!("_{date}_{n}"),
            })
        } else {
            self.free_path(1, |idx| format!("_{idx}"))
        };

        fs::rename(&self.path, &target).map_err(|err| {
            Error::new(ErrorKind::Io, "failed to rename log file")
                .with_context("from", self.path.display())
                .with_context("to", target.display())
                .with_source(err)
        })
    }

    /// The first `<base><suffix>.log` sibling that does not exist yet.
    fn free_path(&self, start: usize, suffix: impl Fn(usize) -> String) -> PathBuf {
        let filename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = filename.strip_suffix(".log").unwrap_or(&filename);

        let mut idx = start;
        loop {
            let candidate = self.path.with_file_name(format!("{base}{}.log", suffix(idx)));
            if !candidate.exists() {
                return candidate;
            }
            idx += 1;
        }
    }
}

impl Sink for RollingFile {
    fn consume(&mut self, record: &FormattedRecord) -> Result<(), Error> {
        self.write_record(record)
    }

    fn shutdown(&mut self) -> Result<(), Error> {
        match self.file.take() {
            Some(mut file) => file.flush().map_err(Error::from_io_error),
            None => Ok(()),
        }
    }
}

fn open_append(path: &Path) -> Result<File, Error> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|err| {
            Error::new(ErrorKind::Io, "failed to create log directory")
                .with_context("path", dir.display())
                .with_source(err)
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| {
            Error::new(ErrorKind::Io, "failed to open log file")
                .with_context("path", path.display())
                .with_source(err)
        })
}

fn count_lines(path: &Path) -> Result<u64, Error> {
    let with_path = |err: io::Error| Error::from_io_error(err).with_context("path", path.display());

    let mut file = File::open(path).map_err(with_path)?;
    let mut buf = [0u8; 8192];
    let mut lines = 0;
    loop {
        let read = match file.read(&mut buf) {
            Ok(0) => return Ok(lines),
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(with_path(err)),
        };
        lines += buf[..read].iter().filter(|b| **b == b'\n').count() as u64;
    }
}

fn modified_date(metadata: &Metadata) -> Option<Date> {
    let modified = metadata.modified().ok()?;
    let timestamp = Timestamp::try_from(modified).ok()?;
    Some(timestamp.to_zoned(TimeZone::system()).date())
}
