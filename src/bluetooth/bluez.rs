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

//! BlueZ RFCOMM transport.

use async_trait::async_trait;
use bluer::rfcomm::{Profile, Role, SocketAddr, Stream};
use bluer::{Adapter, Address, Device, Session};
use futures::StreamExt;
use std::io;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::LinkError;
use super::peer::PeerDescriptor;
use super::transport::{BondedDevice, SocketMode, Transport};

/// Transport over the default BlueZ adapter.
pub struct BluezTransport {
    session: Session,
    adapter: Adapter,
}

impl BluezTransport {
    /// Open a BlueZ session on the default adapter.
    pub async fn new() -> Result<Self, LinkError> {
        info!("Initializing Bluetooth transport...");

        // Create BlueZ session
        let session = Session::new().await?;
        info!("BlueZ session created");

        // Get the default adapter
        let adapter = session.default_adapter().await?;
        info!("Using Bluetooth adapter: {}", adapter.name());

        // Ensure adapter is powered on
        if !adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            adapter.set_powered(true).await?;
        }

        Ok(Self { session, adapter })
    }

    /// Connect the service `uuid` on `device` through an authenticated
    /// client profile and accept the stream BlueZ hands back.
    async fn connect_profile(&self, device: &Device, uuid: Uuid) -> io::Result<Stream> {
        let profile = Profile {
            uuid,
            role: Some(Role::Client),
            require_authentication: Some(true),
            require_authorization: Some(false),
            auto_connect: Some(false),
            ..Default::default()
        };
        // Unregistered when the handle drops
        let mut handle = self.session.register_profile(profile).await.map_err(to_io)?;

        let connect = device.connect_profile(&uuid);
        tokio::pin!(connect);
        let mut requested = false;

        loop {
            tokio::select! {
                result = &mut connect, if !requested => {
                    result.map_err(to_io)?;
                    requested = true;
                }
                request = handle.next() => {
                    let request = request.ok_or_else(|| {
                        io::Error::new(io::ErrorKind::ConnectionAborted, "profile unregistered")
                    })?;
                    debug!("Profile connection from {}", request.device());
                    return request.accept().map_err(to_io);
                }
            }
        }
    }

    fn parse_address(address: &str) -> io::Result<Address> {
        address
            .parse::<Address>()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))
    }
}

#[async_trait]
impl Transport for BluezTransport {
    type Socket = Stream;

    async fn bonded_devices(&self) -> Result<Vec<BondedDevice>, LinkError> {
        let mut devices = Vec::new();

        for addr in self.adapter.device_addresses().await? {
            let device = self.adapter.device(addr)?;
            if device.is_paired().await? {
                let name = device.alias().await.unwrap_or_else(|_| addr.to_string());
                devices.push(BondedDevice::new(name, addr.to_string()));
            }
        }

        debug!("{} bonded devices", devices.len());
        Ok(devices)
    }

    async fn cancel_discovery(&self) -> Result<(), LinkError> {
        // BlueZ stops a discovery session when its owner drops it. This
        // transport never holds one, so only another client can be scanning.
        if self.adapter.is_discovering().await? {
            warn!("Adapter is discovering on behalf of another client; connecting may be slow");
        }
        Ok(())
    }

    async fn open(&self, peer: &PeerDescriptor, mode: SocketMode) -> io::Result<Stream> {
        let address = Self::parse_address(&peer.address)?;

        match mode {
            SocketMode::Secure => {
                debug!("Connecting service {} on {}", peer.service_uuid, address);
                let device = self.adapter.device(address).map_err(to_io)?;
                self.connect_profile(&device, peer.service_uuid).await
            }
            SocketMode::Insecure { channel } => {
                debug!("Opening RFCOMM socket to {} on channel {}", address, channel);
                Stream::connect(SocketAddr::new(address, channel)).await
            }
        }
    }
}

fn to_io(e: bluer::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}
