//! Runs a dispatch engine off the event-delivery thread

use crate::{DispatchEngine, KeyEvent, KeyKind, KeyMap, KeyResponse};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// One action executing plus one buffered
const MAX_OUTSTANDING_ACTIONS: usize = 2;

/// What happened to a submitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Queued,
    /// Dropped: an action is running and another is already waiting
    Coalesced,
    /// The worker has stopped
    Closed,
}

/// Engine on a dedicated thread. Events are processed strictly in order, so
/// at most one file operation is in flight. Modifier and key-up events are
/// never dropped.
pub struct DispatchWorker {
    events: Option<Sender<KeyEvent>>,
    responses: Receiver<KeyResponse>,
    outstanding: Arc<AtomicUsize>,
    keymap: KeyMap,
    handle: Option<JoinHandle<DispatchEngine>>,
}

impl DispatchWorker {
    pub fn spawn(mut engine: DispatchEngine) -> std::io::Result<Self> {
        let (event_tx, event_rx) = unbounded::<KeyEvent>();
        let (response_tx, response_rx) = unbounded();
        let outstanding = Arc::new(AtomicUsize::new(0));
        let keymap = engine.keymap().clone();

        let worker_outstanding = Arc::clone(&outstanding);
        let worker_keymap = keymap.clone();
        let handle = thread::Builder::new()
            .name("dispatch".into())
            .spawn(move || {
                for event in event_rx {
                    let is_action = counts_as_action(&worker_keymap, &event);
                    let response = engine.handle(&event);
                    if is_action {
                        worker_outstanding.fetch_sub(1, Ordering::SeqCst);
                    }

                    if response != KeyResponse::Ignored && response_tx.send(response).is_err() {
                        tracing::debug!("Response receiver dropped");
                    }
                }
                tracing::debug!("Dispatch worker stopped");
                engine
            })?;

        Ok(Self {
            events: Some(event_tx),
            responses: response_rx,
            outstanding,
            keymap,
            handle: Some(handle),
        })
    }

    pub fn submit(&self, event: KeyEvent) -> Submission {
        let Some(events) = &self.events else {
            return Submission::Closed;
        };

        let is_action = counts_as_action(&self.keymap, &event);
        if is_action {
            let admitted = self
                .outstanding
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    (n < MAX_OUTSTANDING_ACTIONS).then_some(n + 1)
                })
                .is_ok();

            if !admitted {
                tracing::debug!("Key {} coalesced, action already pending", event.code);
                return Submission::Coalesced;
            }
        }

        if events.send(event).is_err() {
            if is_action {
                self.outstanding.fetch_sub(1, Ordering::SeqCst);
            }
            return Submission::Closed;
        }

        Submission::Queued
    }

    /// Non-ignored responses, in event order
    pub fn responses(&self) -> &Receiver<KeyResponse> {
        &self.responses
    }

    /// Actions admitted but not finished
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Drain queued events, stop the thread and hand the engine back
    pub fn shutdown(mut self) -> Option<DispatchEngine> {
        self.stop()
    }

    fn stop(&mut self) -> Option<DispatchEngine> {
        self.events.take();
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(engine) => Some(engine),
            Err(_) => {
                tracing::error!("Dispatch worker panicked");
                None
            }
        }
    }
}

impl Drop for DispatchWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn counts_as_action(keymap: &KeyMap, event: &KeyEvent) -> bool {
    event.kind == KeyKind::Down && keymap.role(event.code).map_or(false, |r| r.is_action())
}
