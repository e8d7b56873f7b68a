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

//! Periodic resend of the current flight frame.
//!
//! The receiver drops the link when it sees no traffic for a while, so the
//! last frame is repeated on a fixed interval while connected.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::bluetooth::{FlightFrame, LinkManager, Transport};

/// Latest stick positions, shared between the input surface and the
/// keep-alive task.
#[derive(Debug, Clone, Default)]
pub struct FlightControls {
    frame: Arc<RwLock<FlightFrame>>,
}

impl FlightControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, frame: FlightFrame) {
        *self.frame.write() = frame;
    }

    pub fn get(&self) -> FlightFrame {
        *self.frame.read()
    }
}

/// Background task resending the current frame.
pub struct KeepAlive {
    handle: JoinHandle<()>,
}

impl KeepAlive {
    pub fn spawn<T: Transport>(
        manager: LinkManager<T>,
        controls: FlightControls,
        interval: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if !manager.is_connected() {
                    continue;
                }

                let frame = controls.get();
                if let Err(e) = manager
                    .send_flight_frame(frame.throttle, frame.yaw, frame.pitch, frame.roll)
                    .await
                {
                    debug!("Keep-alive frame not sent: {}", e);
                }
            }
        });

        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::event_channel;
    use crate::bluetooth::mock::MockTransport;
    use crate::bluetooth::{BondedDevice, LinkEvent};
    use crate::config::LinkConfig;

    #[test]
    fn test_controls_start_neutral() {
        let controls = FlightControls::new();
        assert_eq!(controls.get(), FlightFrame::NEUTRAL);

        let shared = controls.clone();
        shared.set(FlightFrame::new(40, 0, 0, 0));
        assert_eq!(controls.get().throttle, 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resends_last_frame_while_connected() {
        let transport = MockTransport::new(vec![BondedDevice::new("HC-06", "00:14:03:06:02:47")]);
        let (tx, mut rx) = event_channel();
        let manager = LinkManager::new(transport, LinkConfig::for_name("HC-06"), tx).unwrap();

        let controls = FlightControls::new();
        controls.set(FlightFrame::new(10, 127, -20, 5));
        let keepalive = KeepAlive::spawn(manager.clone(), controls.clone(), Duration::from_millis(1000));

        manager.connect().await.unwrap();
        assert!(matches!(rx.recv().await, Some(LinkEvent::Connected { .. })));

        assert_eq!(rx.recv().await, Some(LinkEvent::DataSent(vec![10, 127, 236, 5])));

        controls.set(FlightFrame::NEUTRAL);
        assert_eq!(rx.recv().await, Some(LinkEvent::DataSent(vec![0, 127, 127, 127])));

        keepalive.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_while_idle() {
        let transport = MockTransport::new(Vec::new());
        let log = transport.log();
        let (tx, mut rx) = event_channel();
        let manager = LinkManager::new(transport, LinkConfig::default(), tx).unwrap();

        let keepalive = KeepAlive::spawn(manager, FlightControls::new(), Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(1050)).await;

        assert!(rx.try_recv().is_err());
        assert!(log.lock().is_empty());
        keepalive.stop();
    }
}
