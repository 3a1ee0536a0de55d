//! Long-lived query subscriptions
//!
//! A [`QueryObserver`] owns a background task that keeps one query fresh:
//! initial fetch, interval polling, refetch on regained focus and key
//! switching. Dropping the observer stops the task and aborts its request.

use super::client::{Query, QueryClient};
use super::key::CacheKey;
use super::state::{QueryState, QueryStatus};
use crate::error::{ClientError, Result};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct Snapshot {
    key: CacheKey,
    use_error_boundary: bool,
    state: QueryState<Value>,
}

#[derive(Debug)]
enum Command {
    Refetch,
    SetQuery(Query),
}

enum Cycle {
    Done,
    Switched,
    Shutdown,
}

/// Subscription to one query's state
#[derive(Debug)]
pub struct QueryObserver {
    snapshots: watch::Receiver<Snapshot>,
    commands: mpsc::UnboundedSender<Command>,
    shutdown: CancellationToken,
}

impl QueryObserver {
    pub(crate) fn spawn(client: QueryClient, query: Query) -> Self {
        let initial = Snapshot {
            key: query.key().clone(),
            use_error_boundary: query.options().use_error_boundary,
            state: client.state(&query),
        };
        let (tx, snapshots) = watch::channel(initial);
        let (commands, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let worker = Worker {
            focus: client.subscribe_focus(),
            client,
            query,
            tx,
            commands: rx,
            shutdown: shutdown.clone(),
            previous: None,
        };
        tokio::spawn(worker.run());

        Self {
            snapshots,
            commands,
            shutdown,
        }
    }

    /// Latest state, without waiting
    pub fn state(&self) -> QueryState<Value> {
        self.snapshots.borrow().state.clone()
    }

    /// Key currently observed
    pub fn key(&self) -> CacheKey {
        self.snapshots.borrow().key.clone()
    }

    /// Wait for the next state update.
    ///
    /// Settled failures of error-boundary queries come back as
    /// [`ClientError::Escalated`]. [`ClientError::Cancelled`] means the
    /// background task has stopped.
    pub async fn changed(&mut self) -> Result<QueryState<Value>> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| ClientError::Cancelled)?;
        let snapshot = self.snapshots.borrow_and_update().clone();
        escalate(snapshot)
    }

    /// Wait until no request is in flight and return that state
    pub async fn settled(&mut self) -> Result<QueryState<Value>> {
        loop {
            let state = self.changed().await?;
            if !state.is_fetching {
                return Ok(state);
            }
        }
    }

    /// Fetch again now
    pub fn refetch(&self) {
        let _ = self.commands.send(Command::Refetch);
    }

    /// Switch to another query. An in-flight request for the old key is
    /// aborted.
    pub fn set_query(&self, query: Query) {
        let _ = self.commands.send(Command::SetQuery(query));
    }
}

impl Drop for QueryObserver {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn escalate(snapshot: Snapshot) -> Result<QueryState<Value>> {
    if snapshot.use_error_boundary && !snapshot.state.is_fetching {
        if let Some(source) = snapshot.state.error.clone() {
            return Err(ClientError::Escalated {
                key: snapshot.key.to_string(),
                source,
            });
        }
    }
    Ok(snapshot.state)
}

// ============================================================================
// Background task
// ============================================================================

struct Worker {
    client: QueryClient,
    query: Query,
    tx: watch::Sender<Snapshot>,
    commands: mpsc::UnboundedReceiver<Command>,
    shutdown: CancellationToken,
    focus: watch::Receiver<bool>,
    /// Last data delivered for any key, for `keep_previous_data`
    previous: Option<Value>,
}

impl Worker {
    async fn run(mut self) {
        let mut pending = self.query.options().enabled;
        let mut poll = self.poll_interval();

        loop {
            if pending {
                pending = false;
                match self.fetch_once().await {
                    Cycle::Done => {}
                    Cycle::Switched => {
                        pending = self.query.options().enabled;
                        poll = self.poll_interval();
                        continue;
                    }
                    Cycle::Shutdown => break,
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                command = self.commands.recv() => match command {
                    None => break,
                    Some(Command::Refetch) => pending = true,
                    Some(Command::SetQuery(next)) => {
                        self.switch(next);
                        pending = self.query.options().enabled;
                        poll = self.poll_interval();
                    }
                },
                _ = tick(&mut poll) => {
                    let focused = *self.focus.borrow();
                    if focused || self.query.options().refetch_interval_in_background {
                        debug!(key = %self.query.key(), "polling");
                        pending = true;
                    }
                },
                changed = self.focus.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let focused = *self.focus.borrow_and_update();
                    if focused && self.query.options().refetch_on_window_focus {
                        debug!(key = %self.query.key(), "refetch on focus");
                        pending = true;
                    }
                },
            }
        }
        debug!(key = %self.query.key(), "observer stopped");
    }

    async fn fetch_once(&mut self) -> Cycle {
        self.publish(true);

        let request = self.shutdown.child_token();
        let fetch = {
            let client = self.client.clone();
            let query = self.query.clone();
            let request = request.clone();
            async move { client.fetch(&query, &request).await }
        };
        tokio::pin!(fetch);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Cycle::Shutdown,
                result = &mut fetch => {
                    // Escalated failures are already stored in the cache and
                    // resurface through the published state.
                    let _ = result;
                    self.publish(false);
                    return Cycle::Done;
                }
                command = self.commands.recv() => match command {
                    None => return Cycle::Shutdown,
                    Some(Command::Refetch) => {}
                    Some(Command::SetQuery(next)) => {
                        if next.key() == self.query.key() {
                            self.query = next;
                            continue;
                        }
                        request.cancel();
                        info!(
                            from = %self.query.key(),
                            to = %next.key(),
                            "superseded in-flight request"
                        );
                        self.switch(next);
                        return Cycle::Switched;
                    }
                },
            }
        }
    }

    /// Enabled queries publish on their next fetch; disabled ones now
    fn switch(&mut self, next: Query) {
        self.query = next;
        if !self.query.options().enabled {
            self.publish(false);
        }
    }

    fn publish(&mut self, is_fetching: bool) {
        let mut state = self.client.state(&self.query);
        state.is_fetching = state.is_fetching || is_fetching;

        if state.data.is_some() {
            self.previous = state.data.clone();
        } else if state.error.is_none() && self.query.options().keep_previous_data {
            if let Some(previous) = self.previous.clone() {
                state.data = Some(previous);
                state.status = QueryStatus::Success;
                state.is_previous_data = true;
            }
        }

        self.tx.send_replace(Snapshot {
            key: self.query.key().clone(),
            use_error_boundary: self.query.options().use_error_boundary,
            state,
        });
    }

    fn poll_interval(&self) -> Option<Interval> {
        let options = self.query.options();
        if !options.enabled {
            return None;
        }
        options.refetch_interval.map(|period| {
            let period = period.max(Duration::from_millis(1));
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        })
    }
}

async fn tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
