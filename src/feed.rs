use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cricapi::DataSource;
use crate::model::FetchResult;
use crate::schedule::PollClock;
use crate::state::Delta;

/// One completed request, tagged so the shell can drop out-of-order results.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub generation: u64,
    pub search: String,
    pub result: FetchResult,
}

impl From<Fetched> for Delta {
    fn from(f: Fetched) -> Self {
        Delta::FetchFinished {
            generation: f.generation,
            search: f.search,
            result: f.result,
        }
    }
}

/// Issues requests against a [`DataSource`] and remembers the last search so
/// `retry` can repeat it verbatim.
pub struct FetchScheduler<S: DataSource> {
    source: S,
    last_search: Option<String>,
    generation: u64,
}

impl<S: DataSource> FetchScheduler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last_search: None,
            generation: 0,
        }
    }

    pub fn poll(&mut self, search: &str) -> Fetched {
        let search = search.trim().to_string();
        self.last_search = Some(search.clone());
        self.generation += 1;
        let result = self.source.fetch(&search);
        Fetched {
            generation: self.generation,
            search,
            result,
        }
    }

    /// Repeats the previous `poll`; the default feed if nothing ran yet.
    pub fn retry(&mut self) -> Fetched {
        let search = self.last_search.clone().unwrap_or_default();
        self.poll(&search)
    }

    /// Generation the next `poll` will carry.
    pub fn next_generation(&self) -> u64 {
        self.generation + 1
    }

    pub fn last_search(&self) -> Option<&str> {
        self.last_search.as_deref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerCommand {
    /// A newly committed search: fetch now and restart the interval.
    SetSearch(String),
    /// Repeat the last request now.
    Retry,
    Shutdown,
}

/// Owns the poller thread. Dropping it stops the thread.
pub struct PollerHandle {
    cmd_tx: Sender<PollerCommand>,
    join: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn set_search(&self, search: impl Into<String>) -> bool {
        self.cmd_tx
            .send(PollerCommand::SetSearch(search.into()))
            .is_ok()
    }

    pub fn retry(&self) -> bool {
        self.cmd_tx.send(PollerCommand::Retry).is_ok()
    }

    /// Stops polling and waits for an in-flight request to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.cmd_tx.send(PollerCommand::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Starts the poller: one fetch right away with `initial_search`, then one
/// every `interval`, plus whatever the handle asks for. Results arrive on
/// `tx` as [`Delta`]s.
pub fn spawn_poller<S>(
    source: S,
    interval: Duration,
    initial_search: String,
    tx: Sender<Delta>,
) -> PollerHandle
where
    S: DataSource + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let join = thread::spawn(move || run_poller(source, interval, initial_search, tx, cmd_rx));
    PollerHandle {
        cmd_tx,
        join: Some(join),
    }
}

fn run_poller<S: DataSource>(
    source: S,
    interval: Duration,
    initial_search: String,
    tx: Sender<Delta>,
    cmd_rx: Receiver<PollerCommand>,
) {
    let _ = tx.send(Delta::Log(format!(
        "[INFO] Polling {} every {}s",
        source.name(),
        interval.as_secs()
    )));
    let mut scheduler = FetchScheduler::new(source);
    let mut clock = PollClock::new(interval);

    if !run_fetch(&mut scheduler, &tx, &initial_search) {
        return;
    }
    clock.arm(Instant::now());

    loop {
        let timeout = clock.remaining(Instant::now()).unwrap_or(interval);
        let sent = match cmd_rx.recv_timeout(timeout) {
            Ok(PollerCommand::SetSearch(search)) => {
                let sent = run_fetch(&mut scheduler, &tx, &search);
                clock.arm(Instant::now());
                sent
            }
            Ok(PollerCommand::Retry) => {
                let search = scheduler.last_search().unwrap_or_default().to_string();
                let sent = run_fetch(&mut scheduler, &tx, &search);
                clock.arm(Instant::now());
                sent
            }
            Ok(PollerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if clock.fire(Instant::now()) {
                    let search = scheduler.last_search().unwrap_or_default().to_string();
                    run_fetch(&mut scheduler, &tx, &search)
                } else {
                    true
                }
            }
        };
        if !sent {
            break;
        }
    }
    clock.cancel();
    debug!("poller stopped");
}

/// Announces, runs and reports one request. False once the shell has gone
/// away.
fn run_fetch<S: DataSource>(
    scheduler: &mut FetchScheduler<S>,
    tx: &Sender<Delta>,
    search: &str,
) -> bool {
    let started = Delta::FetchStarted {
        generation: scheduler.next_generation(),
        search: search.trim().to_string(),
    };
    if tx.send(started).is_err() {
        return false;
    }
    let fetched = scheduler.poll(search);
    tx.send(fetched.into()).is_ok()
}
