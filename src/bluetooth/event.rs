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

//! Link events.

use tokio::sync::mpsc;

/// Events emitted by the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Socket opened to the peer.
    Connected { device_name: String },
    /// Neither the primary nor the fallback socket could be opened.
    ConnectionFailed(String),
    /// An open connection dropped.
    ConnectionLost(String),
    /// Bytes read from the peer.
    DataReceived { len: usize, data: Vec<u8> },
    /// Bytes written to the peer.
    DataSent(Vec<u8>),
}

/// Sending half of the link event channel.
pub type EventSender = mpsc::UnboundedSender<LinkEvent>;

/// Receiving half of the link event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<LinkEvent>;

/// Create a link event channel.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

pub(crate) fn emit(tx: &EventSender, event: LinkEvent) {
    // Nobody listening is not an error for the link
    let _ = tx.send(event);
}
