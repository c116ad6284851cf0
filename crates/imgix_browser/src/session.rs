// SPDX-License-Identifier: Apache-2.0

//! Cooperative event loop around a [`Controller`].
//!
//! One task owns the controller. It takes actions from a channel, applies
//! everything that is ready as a single batch, and keeps fetches in flight
//! concurrently so new actions are handled while the network is busy.
//! A source change waits out the page-debounce window before it is fetched,
//! so a page change right after it costs no extra request.
//! Every state change is published as a [`Snapshot`].

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use crate::controller::{Action, Applied, Controller, FetchRequest, Snapshot};
use crate::error::ApiError;
use crate::fetch::CollectionApi;
use crate::models::payload::RawCollectionPayload;

pub struct Session<A> {
    controller: Controller,
    api: Arc<A>,
}

/// Sending side of a running session.
#[derive(Clone)]
pub struct SessionHandle {
    actions: mpsc::UnboundedSender<Action>,
    snapshots: watch::Receiver<Snapshot>,
}

impl SessionHandle {
    /// Queues an action. Returns false once the session has stopped.
    pub fn send(&self, action: Action) -> bool {
        self.actions.send(action).is_ok()
    }

    /// Queues several actions so they are reconciled together.
    pub fn send_batch<I>(&self, actions: I) -> bool
    where
        I: IntoIterator<Item = Action>,
    {
        actions.into_iter().all(|action| self.send(action))
    }

    pub fn snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// No-argument callback that refreshes the current page, for the upload
    /// sink.
    pub fn refresher(&self) -> impl Fn() + Send + Sync + 'static {
        let actions = self.actions.clone();
        move || {
            if actions.send(Action::Refresh).is_err() {
                debug!("Refresh requested after the session stopped");
            }
        }
    }
}

async fn fetch<A: CollectionApi>(
    api: Arc<A>,
    request: FetchRequest,
) -> (FetchRequest, Result<RawCollectionPayload, ApiError>) {
    let outcome = api.request(&request.resource_path()).await;
    (request, outcome)
}

impl<A: CollectionApi + 'static> Session<A> {
    /// Wraps an already mounted controller.
    pub fn new(controller: Controller, api: Arc<A>) -> Self {
        Self { controller, api }
    }

    /// Spawns the event loop on the current runtime. The task ends, returning
    /// the controller, once every handle is dropped and in-flight requests
    /// have settled.
    pub fn spawn(self) -> (SessionHandle, JoinHandle<Controller>) {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(self.controller.snapshot());
        let task = tokio::spawn(self.run(action_rx, snapshot_tx));
        (
            SessionHandle {
                actions: action_tx,
                snapshots: snapshot_rx,
            },
            task,
        )
    }

    pub async fn run(
        mut self,
        mut actions: mpsc::UnboundedReceiver<Action>,
        snapshots: watch::Sender<Snapshot>,
    ) -> Controller {
        let mut in_flight = FuturesUnordered::new();
        snapshots.send_replace(self.controller.snapshot());

        loop {
            let hold = self.controller.hold_deadline();
            tokio::select! {
                received = actions.recv() => {
                    let Some(first) = received else { break };
                    let mut batch = vec![first];
                    while let Ok(next) = actions.try_recv() {
                        batch.push(next);
                    }
                    debug!("Dispatching {} actions", batch.len());
                    if let Some(request) = self.controller.dispatch_held(batch) {
                        in_flight.push(fetch(Arc::clone(&self.api), request));
                    }
                    snapshots.send_replace(self.controller.snapshot());
                }
                Some((request, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                    if self.controller.apply(&request, outcome) == Applied::Current {
                        snapshots.send_replace(self.controller.snapshot());
                    }
                }
                () = sleep_until(hold.unwrap_or_else(Instant::now)), if hold.is_some() => {
                    if let Some(request) = self.controller.release_hold() {
                        in_flight.push(fetch(Arc::clone(&self.api), request));
                    }
                    snapshots.send_replace(self.controller.snapshot());
                }
            }
        }

        // Nothing can follow a held source fetch any more.
        if let Some(request) = self.controller.release_hold() {
            in_flight.push(fetch(Arc::clone(&self.api), request));
            snapshots.send_replace(self.controller.snapshot());
        }

        while let Some((request, outcome)) = in_flight.next().await {
            if self.controller.apply(&request, outcome) == Applied::Current {
                snapshots.send_replace(self.controller.snapshot());
            }
        }
        self.controller
    }
}
