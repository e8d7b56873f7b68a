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

//! Platform transport abstraction.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};

use super::error::LinkError;
use super::peer::PeerDescriptor;

/// A connected stream socket.
pub trait LinkSocket: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<S> LinkSocket for S where S: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// A device bonded with the local adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondedDevice {
    pub name: String,
    pub address: String,
}

impl BondedDevice {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// How a socket to the peer is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketMode {
    /// Authenticated and encrypted channel for the peer's service.
    Secure,
    /// Unauthenticated socket on a raw RFCOMM channel.
    Insecure { channel: u8 },
}

/// Bluetooth adapter operations the link manager depends on.
///
/// Implementations must be `Send + Sync` so that workers running on other
/// tasks can share them.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Socket: LinkSocket;

    /// Devices currently bonded with the adapter.
    async fn bonded_devices(&self) -> Result<Vec<BondedDevice>, LinkError>;

    /// Stop any discovery in progress. Discovery and connection attempts are
    /// mutually exclusive on the radio.
    async fn cancel_discovery(&self) -> Result<(), LinkError>;

    /// Open a stream socket to the peer, blocking until connected.
    async fn open(&self, peer: &PeerDescriptor, mode: SocketMode) -> io::Result<Self::Socket>;
}
