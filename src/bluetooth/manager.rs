// Copyright 2026 Daniel Pelikan
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

//! Link manager: owns the connection state and the worker tasks.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::connect::ConnectWorker;
use super::error::LinkError;
use super::event::{emit, EventSender, LinkEvent};
use super::io::IoWorker;
use super::peer::{resolve, PeerDescriptor};
use super::protocol::{encode_text, FlightFrame};
use super::transport::Transport;
use crate::config::LinkConfig;
use crate::state::LinkState;

/// State guarded by the manager lock.
struct Inner<T: Transport> {
    state: LinkState,
    /// Bumped whenever the workers are replaced, so results from a
    /// superseded attempt are discarded.
    generation: u64,
    peer: Option<PeerDescriptor>,
    connect_worker: Option<ConnectWorker>,
    io_worker: Option<IoWorker<T::Socket>>,
}

impl<T: Transport> Inner<T> {
    fn transition(&mut self, next: LinkState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal link transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("Link state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Cancel both workers and return to `Idle`. Returns the new generation.
    fn reset(&mut self) -> u64 {
        if let Some(worker) = self.connect_worker.take() {
            worker.cancel();
        }
        if let Some(worker) = self.io_worker.take() {
            worker.cancel();
        }
        self.generation += 1;
        self.transition(LinkState::Idle);
        self.generation
    }
}

/// State shared between the manager and its worker tasks.
pub(crate) struct Shared<T: Transport> {
    transport: T,
    config: LinkConfig,
    event_tx: EventSender,
    inner: Mutex<Inner<T>>,
}

impl<T: Transport> Shared<T> {
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub(crate) fn event_sender(&self) -> EventSender {
        self.event_tx.clone()
    }

    fn start_connect(self: &Arc<Self>, peer: PeerDescriptor) {
        let mut inner = self.inner.lock();
        if inner.state != LinkState::Idle {
            info!("Restarting link ({})", inner.state.as_str());
        }

        let generation = inner.reset();
        inner.transition(LinkState::Connecting);
        inner.peer = Some(peer.clone());
        inner.connect_worker = Some(ConnectWorker::spawn(self.clone(), peer, generation));
    }

    /// Called by the connect worker once its attempt has finished.
    pub(crate) fn connect_finished(
        self: &Arc<Self>,
        generation: u64,
        peer: &PeerDescriptor,
        result: Result<T::Socket, LinkError>,
    ) {
        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.state != LinkState::Connecting {
            debug!("Discarding result of superseded connect attempt");
            return;
        }

        // The worker is finishing on its own
        inner.connect_worker = None;

        match result {
            Ok(socket) => {
                inner.transition(LinkState::Connected);
                inner.io_worker = Some(IoWorker::spawn(self.clone(), socket, generation));
                info!("Connected to {}", peer.name);
                emit(
                    &self.event_tx,
                    LinkEvent::Connected {
                        device_name: peer.name.clone(),
                    },
                );
            }
            Err(e) => {
                error!("{}", e);
                inner.transition(LinkState::Idle);
                emit(&self.event_tx, LinkEvent::ConnectionFailed(e.to_string()));
            }
        }
    }

    /// Tear down the session of `generation` after a read or write failure.
    pub(crate) fn io_failed(&self, generation: u64, reason: String) {
        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.state != LinkState::Connected {
            return;
        }

        warn!("Connection lost: {}", reason);
        inner.reset();
        emit(&self.event_tx, LinkEvent::ConnectionLost(reason));
    }
}

/// Public handle to the link. Cheap to clone; clones share the same link.
pub struct LinkManager<T: Transport> {
    shared: Arc<Shared<T>>,
}

impl<T: Transport> Clone for LinkManager<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Transport> LinkManager<T> {
    /// Create a manager. Events are delivered on `event_tx`.
    pub fn new(transport: T, config: LinkConfig, event_tx: EventSender) -> Result<Self, LinkError> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                transport,
                config,
                event_tx,
                inner: Mutex::new(Inner {
                    state: LinkState::Idle,
                    generation: 0,
                    peer: None,
                    connect_worker: None,
                    io_worker: None,
                }),
            }),
        })
    }

    /// Resolve the configured peer and start connecting to it.
    ///
    /// Returns once the attempt is running; the outcome arrives as a
    /// `Connected` or `ConnectionFailed` event. A call while already
    /// connecting or connected cancels the current session first.
    pub async fn connect(&self) -> Result<PeerDescriptor, LinkError> {
        let bonded = match self.shared.transport.bonded_devices().await {
            Ok(bonded) => bonded,
            Err(e) => {
                error!("Failed to list bonded devices: {}", e);
                emit(&self.shared.event_tx, LinkEvent::ConnectionFailed(e.to_string()));
                return Err(e);
            }
        };

        let peer = match resolve(&self.shared.config, &bonded) {
            Ok(peer) => peer,
            Err(e) => {
                warn!("{}", e);
                emit(&self.shared.event_tx, LinkEvent::ConnectionFailed(e.to_string()));
                return Err(e);
            }
        };

        self.shared.start_connect(peer.clone());
        Ok(peer)
    }

    /// Cancel whichever worker is active and return to `Idle`.
    pub fn disconnect(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.state == LinkState::Idle {
            debug!("Disconnect requested while idle");
            return;
        }

        inner.reset();
        info!("Link disconnected");
    }

    /// Write `bytes` to the peer as one buffer.
    pub async fn send(&self, bytes: &[u8]) -> Result<(), LinkError> {
        let writer = {
            let inner = self.shared.inner.lock();
            match (&inner.io_worker, inner.state) {
                (Some(worker), LinkState::Connected) => worker.writer(),
                _ => {
                    warn!(
                        "Dropping {} byte write: link is {}",
                        bytes.len(),
                        inner.state.as_str()
                    );
                    return Err(LinkError::NotConnected);
                }
            }
        };

        match writer.write(bytes).await {
            Ok(()) => Ok(()),
            Err(_) if writer.is_closed() => {
                warn!("Write of {} bytes interrupted: link closed", bytes.len());
                Err(LinkError::NotConnected)
            }
            Err(e) => {
                error!("Write error: {}", e);
                self.shared
                    .io_failed(writer.generation(), format!("write failed: {}", e));
                Err(LinkError::Io(e))
            }
        }
    }

    /// Send a UTF-8 text message.
    pub async fn send_text(&self, text: &str) -> Result<(), LinkError> {
        self.send(&encode_text(text)).await
    }

    /// Send a `[throttle, yaw, pitch, roll]` flight frame.
    pub async fn send_flight_frame(
        &self,
        throttle: i8,
        yaw: i8,
        pitch: i8,
        roll: i8,
    ) -> Result<(), LinkError> {
        let frame = FlightFrame::new(throttle, yaw, pitch, roll);
        self.send(&frame.to_bytes()).await
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    pub fn state(&self) -> LinkState {
        self.shared.inner.lock().state
    }

    /// Peer of the current or most recent connection attempt.
    pub fn peer(&self) -> Option<PeerDescriptor> {
        self.shared.inner.lock().peer.clone()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.shared.config
    }

    #[cfg(test)]
    fn worker_counts(&self) -> (usize, usize) {
        let inner = self.shared.inner.lock();
        (
            inner.connect_worker.is_some() as usize,
            inner.io_worker.is_some() as usize,
        )
    }

    #[cfg(test)]
    fn generation(&self) -> u64 {
        self.shared.inner.lock().generation
    }

    #[cfg(test)]
    fn shared(&self) -> &Arc<Shared<T>> {
        &self.shared
    }
}
