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

//! Link event processing.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::bluetooth::{EventReceiver, LinkEvent};
use crate::state::ControllerState;

/// Process events from the link into controller state and the log.
pub struct EventProcessor {
    state: Arc<ControllerState>,
}

impl EventProcessor {
    pub fn new(state: Arc<ControllerState>) -> Self {
        Self { state }
    }

    /// Process a single event.
    pub fn process_event(&mut self, event: &LinkEvent) {
        match event {
            LinkEvent::Connected { device_name } => {
                info!("Connected to {}", device_name);
                self.state.set_connected(device_name.clone());
            }
            LinkEvent::ConnectionFailed(reason) => {
                error!("Connection failed: {}", reason);
                self.state.set_disconnected(Some(reason.clone()));
            }
            LinkEvent::ConnectionLost(reason) => {
                warn!("Connection lost: {}", reason);
                self.state.set_disconnected(Some(reason.clone()));
            }
            LinkEvent::DataReceived { len, data } => {
                debug!("Received {} bytes", len);
                let end = (*len).min(data.len());
                self.state.record_received(&data[..end]);
                if let Some(text) = self.state.get_last_text() {
                    info!("Receiver: {}", text);
                }
            }
            LinkEvent::DataSent(data) => {
                debug!("Sent {} bytes", data.len());
                self.state.record_sent(data.len());
            }
        }
    }

    /// Process events until the channel closes.
    pub async fn run(mut self, mut event_rx: EventReceiver) {
        while let Some(event) = event_rx.recv().await {
            self.process_event(&event);
        }
        debug!("Link event channel closed");
    }
}
