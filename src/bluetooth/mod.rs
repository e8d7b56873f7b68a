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

//! Bluetooth communication module.
//!
//! Manages the RFCOMM link to the quadcopter receiver: peer resolution,
//! connection attempts with fallback, and the IO session.

#[cfg(feature = "bluez")]
mod bluez;
mod connect;
mod error;
mod event;
mod io;
mod manager;
#[cfg(test)]
pub(crate) mod mock;
mod peer;
pub mod protocol;
mod transport;

#[cfg(feature = "bluez")]
pub use bluez::BluezTransport;
pub use error::LinkError;
pub use event::{event_channel, EventReceiver, EventSender, LinkEvent};
pub use manager::LinkManager;
pub use peer::{resolve, PeerDescriptor};
pub use protocol::{FlightFrame, SPP_UUID};
pub use transport::{BondedDevice, LinkSocket, SocketMode, Transport};
