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

//! In-memory transport for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tokio::sync::mpsc;

use super::error::LinkError;
use super::peer::PeerDescriptor;
use super::transport::{BondedDevice, SocketMode, Transport};

/// What the next `open` call does.
#[derive(Debug, Clone, Copy)]
pub(crate) enum OpenOutcome {
    Succeed,
    Fail(io::ErrorKind),
    /// Never completes; logs `cancelled <n>` when dropped.
    Hang,
}

/// Socket backed by one end of a duplex pipe.
pub(crate) struct MockSocket {
    inner: DuplexStream,
    fail_writes: bool,
}

pub(crate) fn socket_pair(fail_writes: bool) -> (MockSocket, DuplexStream) {
    let (local, remote) = tokio::io::duplex(4096);
    (
        MockSocket {
            inner: local,
            fail_writes,
        },
        remote,
    )
}

impl AsyncRead for MockSocket {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for MockSocket {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.fail_writes {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe")));
        }
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

struct DropLog {
    log: Arc<Mutex<Vec<String>>>,
    entry: String,
}

impl Drop for DropLog {
    fn drop(&mut self) {
        self.log.lock().push(std::mem::take(&mut self.entry));
    }
}

/// Scripted transport recording every call it receives.
pub(crate) struct MockTransport {
    bonded: Vec<BondedDevice>,
    script: Mutex<VecDeque<OpenOutcome>>,
    log: Arc<Mutex<Vec<String>>>,
    opens: Arc<AtomicUsize>,
    fail_writes: bool,
    remote_tx: mpsc::UnboundedSender<DuplexStream>,
    remote_rx: Mutex<Option<mpsc::UnboundedReceiver<DuplexStream>>>,
}

impl MockTransport {
    pub(crate) fn new(bonded: Vec<BondedDevice>) -> Self {
        let (remote_tx, remote_rx) = mpsc::unbounded_channel();
        Self {
            bonded,
            script: Mutex::new(VecDeque::new()),
            log: Arc::new(Mutex::new(Vec::new())),
            opens: Arc::new(AtomicUsize::new(0)),
            fail_writes: false,
            remote_tx,
            remote_rx: Mutex::new(Some(remote_rx)),
        }
    }

    pub(crate) fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Queue outcomes for upcoming `open` calls. Unscripted calls succeed.
    pub(crate) fn script(&self, outcomes: impl IntoIterator<Item = OpenOutcome>) {
        self.script.lock().extend(outcomes);
    }

    pub(crate) fn log(&self) -> Arc<Mutex<Vec<String>>> {
        self.log.clone()
    }

    pub(crate) fn open_counter(&self) -> Arc<AtomicUsize> {
        self.opens.clone()
    }

    /// Remote ends of every socket opened, in order. Untaken remotes stay
    /// open for the life of the transport.
    pub(crate) fn take_remotes(&self) -> mpsc::UnboundedReceiver<DuplexStream> {
        self.remote_rx
            .lock()
            .take()
            .expect("remotes already taken")
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Socket = MockSocket;

    async fn bonded_devices(&self) -> Result<Vec<BondedDevice>, LinkError> {
        Ok(self.bonded.clone())
    }

    async fn cancel_discovery(&self) -> Result<(), LinkError> {
        self.log.lock().push("cancel-discovery".to_string());
        Ok(())
    }

    async fn open(&self, _peer: &PeerDescriptor, mode: SocketMode) -> io::Result<MockSocket> {
        let n = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.lock().push(format!("open {} {:?}", n, mode));

        let outcome = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(OpenOutcome::Succeed);

        match outcome {
            OpenOutcome::Succeed => {
                let (socket, remote) = socket_pair(self.fail_writes);
                let _ = self.remote_tx.send(remote);
                Ok(socket)
            }
            OpenOutcome::Fail(kind) => Err(io::Error::new(kind, "scripted failure")),
            OpenOutcome::Hang => {
                let _guard = DropLog {
                    log: self.log.clone(),
                    entry: format!("cancelled {}", n),
                };
                std::future::pending().await
            }
        }
    }
}
