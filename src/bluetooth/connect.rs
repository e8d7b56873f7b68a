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

//! Background socket-open attempt.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::LinkError;
use super::manager::Shared;
use super::peer::PeerDescriptor;
use super::transport::{SocketMode, Transport};

/// Handle to an in-flight connection attempt.
pub(crate) struct ConnectWorker {
    handle: JoinHandle<()>,
}

impl ConnectWorker {
    /// Start opening a socket to `peer` on a background task.
    pub(crate) fn spawn<T: Transport>(
        shared: Arc<Shared<T>>,
        peer: PeerDescriptor,
        generation: u64,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let result = open_socket(shared.transport(), &peer, shared.config().rfcomm_channel).await;
            shared.connect_finished(generation, &peer, result);
        });

        Self { handle }
    }

    /// Abort the attempt. Dropping the pending open closes its socket; the
    /// task reports nothing.
    pub(crate) fn cancel(self) {
        debug!("Cancelling connect worker");
        self.handle.abort();
    }
}

/// Open a socket to `peer`, falling back to an insecure channel socket once.
pub(crate) async fn open_socket<T: Transport>(
    transport: &T,
    peer: &PeerDescriptor,
    channel: u8,
) -> Result<T::Socket, LinkError> {
    if let Err(e) = transport.cancel_discovery().await {
        warn!("Failed to cancel discovery: {}", e);
    }

    info!("Connecting to {} ({})...", peer.name, peer.address);

    match transport.open(peer, SocketMode::Secure).await {
        Ok(socket) => return Ok(socket),
        Err(e) => {
            warn!(
                "Secure connect to {} failed: {}; retrying on channel {}",
                peer.address, e, channel
            );
        }
    }

    transport
        .open(peer, SocketMode::Insecure { channel })
        .await
        .map_err(|e| LinkError::ConnectFailed(format!("unable to connect to {}: {}", peer.name, e)))
}
