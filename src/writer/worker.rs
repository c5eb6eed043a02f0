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
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;

use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::record::FormattedRecord;

/// The I/O side of a writer, driven by exactly one worker thread.
pub(crate) trait Sink: Send + 'static {
    fn consume(&mut self, record: &FormattedRecord) -> Result<(), Error>;

    fn shutdown(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

struct Worker<S> {
    sink: S,
    receiver: Receiver<Arc<FormattedRecord>>,
    trap: Arc<dyn Trap>,
}

impl<S: Sink> Worker<S> {
    fn run(self) {
        let Self {
            mut sink,
            receiver,
            trap,
        } = self;

        // ends once every sender is gone and the queue is drained
        while let Ok(record) = receiver.recv() {
            if let Err(err) = sink.consume(&record) {
                trap.trap(&err);
            }
        }

        if let Err(err) = sink.shutdown() {
            trap.trap(&err);
        }
    }
}

/// Submission side of a worker: the queue sender and the thread handle.
pub(crate) struct AsyncState {
    state: Mutex<Option<State>>,
    trap: Arc<dyn Trap>,
}

struct State {
    sender: Sender<Arc<FormattedRecord>>,
    handle: JoinHandle<()>,
}

impl fmt::Debug for AsyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncState")
            .field("closed", &self.is_closed())
            .field("trap", &self.trap)
            .finish()
    }
}

impl AsyncState {
    pub(crate) fn spawn<S: Sink>(
        thread_name: String,
        sink: S,
        buffered_lines_limit: usize,
        trap: Arc<dyn Trap>,
    ) -> AsyncState {
        let (sender, receiver) = crossbeam_channel::bounded(buffered_lines_limit);

        let worker = Worker {
            sink,
            receiver,
            trap: trap.clone(),
        };
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())
            .expect("failed to spawn writer thread");

        AsyncState {
            state: Mutex::new(Some(State { sender, handle })),
            trap,
        }
    }

    pub(crate) fn send(&self, record: Arc<FormattedRecord>) -> Result<(), Error> {
        // clone the sender so a full queue does not hold the lock against `close`
        let sender = match self.state().as_ref() {
            Some(state) => state.sender.clone(),
            None => return Err(Error::new(ErrorKind::Closed, "writer is closed")),
        };

        sender
            .send(record)
            .map_err(|_| Error::new(ErrorKind::Closed, "failed to send record to writer"))
    }

    pub(crate) fn close(&self) {
        let Some(State { sender, handle }) = self.state().take() else {
            return;
        };

        // drop our sender, the worker breaks the loop after draining the queue
        drop(sender);

        if handle.join().is_err() {
            let err = Error::new(ErrorKind::Unexpected, "writer thread panicked");
            self.trap.trap(&err);
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state().is_none()
    }

    fn state(&self) -> MutexGuard<'_, Option<State>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for AsyncState {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::time::Duration;

    use jiff::Zoned;

    use super::*;
    use crate::DefaultTrap;
    use crate::Filter;
    use crate::Layout;
    use crate::Level;
    use crate::Writer;
    use crate::record::Record;
    use crate::record::Source;

    #[derive(Debug, Default, Clone)]
    struct Lines(Arc<Mutex<Vec<String>>>);

    impl Lines {
        fn get(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct Collect {
        lines: Lines,
        gate: Option<Arc<Barrier>>,
    }

    impl Sink for Collect {
        fn consume(&mut self, record: &FormattedRecord) -> Result<(), Error> {
            if let Some(gate) = self.gate.take() {
                gate.wait();
            }
            self.lines.0.lock().unwrap().push(record.formatted().to_string());
            Ok(())
        }
    }

    fn record(text: &str) -> Arc<FormattedRecord> {
        Arc::new(FormattedRecord::new(Zoned::now(), text))
    }

    #[test]
    fn test_close_drains_queue_in_order() {
        let lines = Lines::default();
        let sink = Collect {
            lines: lines.clone(),
            gate: None,
        };
        let state = AsyncState::spawn("test-drain".into(), sink, 4, Arc::new(DefaultTrap::default()));

        for i in 0..100 {
            state.send(record(&format!("line {i}"))).unwrap();
        }
        state.close();

        let expected: Vec<_> = (0..100).map(|i| format!("line {i}")).collect();
        assert_eq!(lines.get(), expected);
    }

    #[test]
    fn test_close_is_idempotent() {
        let sink = Collect {
            lines: Lines::default(),
            gate: None,
        };
        let state = AsyncState::spawn("test-close".into(), sink, 1, Arc::new(DefaultTrap::default()));

        assert!(!state.is_closed());
        state.close();
        assert!(state.is_closed());
        state.close();

        let err = state.send(record("late")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        assert_eq!(err.message(), "writer is closed");
    }

    #[test]
    fn test_full_queue_blocks_producer() {
        let lines = Lines::default();
        let gate = Arc::new(Barrier::new(2));
        let sink = Collect {
            lines: lines.clone(),
            gate: Some(gate.clone()),
        };
        let state = Arc::new(AsyncState::spawn(
            "test-backpressure".into(),
            sink,
            1,
            Arc::new(DefaultTrap::default()),
        ));

        // the worker holds "a" at the gate, "b" fills the queue, "c" must wait
        state.send(record("a")).unwrap();
        state.send(record("b")).unwrap();
        let producer = {
            let state = state.clone();
            std::thread::spawn(move || state.send(record("c")))
        };

        std::thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished());

        gate.wait();
        producer.join().unwrap().unwrap();
        state.close();
        assert_eq!(lines.get(), ["a", "b", "c"]);
    }

    #[derive(Debug)]
    struct Queued(AsyncState);

    impl Writer for Queued {
        fn write(&self, record: Arc<FormattedRecord>) -> Result<(), Error> {
            self.0.send(record)
        }

        fn close(&self) {
            self.0.close();
        }
    }

    #[test]
    fn test_blocked_writer_delays_but_does_not_corrupt_the_other() {
        let gate = Arc::new(Barrier::new(2));
        let slow_lines = Lines::default();
        let fast_lines = Lines::default();
        let slow = Arc::new(Queued(AsyncState::spawn(
            "test-slow".into(),
            Collect {
                lines: slow_lines.clone(),
                gate: Some(gate.clone()),
            },
            1,
            Arc::new(DefaultTrap::default()),
        )));
        let fast = Arc::new(Queued(AsyncState::spawn(
            "test-fast".into(),
            Collect {
                lines: fast_lines.clone(),
                gate: None,
            },
            1,
            Arc::new(DefaultTrap::default()),
        )));
        let filter = Filter::new("X", Level::Debug, Arc::new(Layout::compile("%l %M")))
            .with_writer(slow.clone())
            .with_writer(fast.clone());

        let producer = std::thread::spawn(move || {
            for i in 0..5 {
                let message = format!("line {i}");
                filter.accept(&Record::new("X", Level::Info, message, Source::new("a.rs", 1)));
            }
        });

        // the slow worker holds "line 0" and its queue holds "line 1", so "line 2" blocks
        while fast_lines.get().len() < 2 {
            std::thread::sleep(Duration::from_millis(1));
        }
        std::thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished());
        assert_eq!(fast_lines.get(), ["I line 0", "I line 1"]);
        assert!(slow_lines.get().is_empty());

        gate.wait();
        producer.join().unwrap();
        slow.close();
        fast.close();

        let expected: Vec<_> = (0..5).map(|i| format!("I line {i}")).collect();
        assert_eq!(slow_lines.get(), expected);
        assert_eq!(fast_lines.get(), expected);
    }
}
