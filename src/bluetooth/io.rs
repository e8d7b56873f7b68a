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

//! IO worker for an open link socket.

use std::io;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::event::{emit, EventSender, LinkEvent};
use super::manager::Shared;
use super::transport::{LinkSocket, Transport};

/// Owner of an open socket: a read loop on its own task plus a shared writer.
pub(crate) struct IoWorker<S: LinkSocket> {
    writer: IoWriter<S>,
    reader: JoinHandle<()>,
    closed: watch::Sender<bool>,
}

impl<S: LinkSocket> IoWorker<S> {
    /// Split `socket` and start the read loop.
    pub(crate) fn spawn<T>(shared: Arc<Shared<T>>, socket: S, generation: u64) -> Self
    where
        T: Transport<Socket = S>,
    {
        let (reader, writer) = tokio::io::split(socket);
        let buffer_size = shared.config().read_buffer_size;
        let event_tx = shared.event_sender();
        let (closed, closed_rx) = watch::channel(false);

        let read_task = tokio::spawn(async move {
            let reason = read_loop(reader, buffer_size, shared.event_sender()).await;
            shared.io_failed(generation, reason);
        });

        Self {
            writer: IoWriter {
                generation,
                writer: Arc::new(Mutex::new(Some(writer))),
                closed: closed_rx,
                event_tx,
            },
            reader: read_task,
            closed,
        }
    }

    /// Snapshot of the writer, usable outside the state lock.
    pub(crate) fn writer(&self) -> IoWriter<S> {
        self.writer.clone()
    }

    /// Close the socket. The read half goes with the aborted task. The write
    /// half is dropped here when idle, otherwise by the write it interrupts.
    pub(crate) fn cancel(self) {
        debug!("Cancelling IO worker");
        self.reader.abort();
        self.closed.send_replace(true);
        if let Ok(mut writer) = self.writer.writer.try_lock() {
            writer.take();
        }
    }
}

/// Shared write access to the socket of one IO worker.
pub(crate) struct IoWriter<S: LinkSocket> {
    generation: u64,
    /// `None` once the worker has been cancelled.
    writer: Arc<Mutex<Option<WriteHalf<S>>>>,
    closed: watch::Receiver<bool>,
    event_tx: EventSender,
}

impl<S: LinkSocket> Clone for IoWriter<S> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            writer: self.writer.clone(),
            closed: self.closed.clone(),
            event_tx: self.event_tx.clone(),
        }
    }
}

impl<S: LinkSocket> IoWriter<S> {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the owning worker has been cancelled.
    pub(crate) fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Write `bytes` as a single buffer and report it as sent.
    ///
    /// Fails with `NotConnected` once the worker is cancelled, including
    /// while the write is blocked on a peer that stopped reading.
    pub(crate) async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut closed = self.closed.clone();
        let cancelled = tokio::select! {
            biased;
            _ = closed.wait_for(|done| *done) => true,
            result = self.write_all(bytes) => {
                result?;
                false
            }
        };

        if cancelled || self.is_closed() {
            // Release the socket if the interrupted write was still holding it
            self.writer.lock().await.take();
            debug!("Dropped {} byte write: link closed", bytes.len());
            return Err(closed_error());
        }

        debug!("Sent {} bytes: {}", bytes.len(), hex::encode(bytes));
        emit(&self.event_tx, LinkEvent::DataSent(bytes.to_vec()));
        Ok(())
    }

    async fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or_else(closed_error)?;
        writer.write_all(bytes).await?;
        writer.flush().await
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "link closed")
}

/// Read until the socket fails or closes, returning the reason.
async fn read_loop<S: LinkSocket>(
    mut reader: ReadHalf<S>,
    buffer_size: usize,
    event_tx: EventSender,
) -> String {
    let mut buffer = vec![0u8; buffer_size];

    loop {
        match reader.read(&mut buffer).await {
            Ok(0) => {
                info!("Connection closed by remote");
                return "connection closed by remote".to_string();
            }
            Ok(len) => {
                debug!("Received {} bytes: {}", len, hex::encode(&buffer[..len]));
                emit(
                    &event_tx,
                    LinkEvent::DataReceived {
                        len,
                        data: buffer[..len].to_vec(),
                    },
                );
            }
            Err(e) => {
                error!("Read error: {}", e);
                return format!("read failed: {}", e);
            }
        }
    }
}
