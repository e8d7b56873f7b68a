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

//! Link and controller state.

use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Connection state of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Idle,
    Connecting,
    Connected,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Idle => "Idle",
            LinkState::Connecting => "Connecting...",
            LinkState::Connected => "Connected",
        }
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: LinkState) -> bool {
        matches!(
            (self, next),
            (LinkState::Idle, LinkState::Connecting)
                | (LinkState::Connecting, LinkState::Connected)
                | (LinkState::Connecting, LinkState::Idle)
                | (LinkState::Connected, LinkState::Idle)
        )
    }
}

/// Shared controller status, fed from link events.
#[derive(Debug, Default)]
pub struct ControllerState {
    /// Name of the connected receiver.
    pub connected_device: RwLock<Option<String>>,

    /// Last failure reported by the link.
    pub last_error: RwLock<Option<String>>,

    /// Last text received from the receiver.
    pub last_text: RwLock<Option<String>>,

    /// Time of the last data exchanged.
    pub last_activity: RwLock<Option<DateTime<Local>>>,

    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
}

impl ControllerState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_connected(&self, device_name: String) {
        *self.connected_device.write() = Some(device_name);
        *self.last_error.write() = None;
    }

    pub fn set_disconnected(&self, reason: Option<String>) {
        *self.connected_device.write() = None;
        *self.last_error.write() = reason;
    }

    pub fn get_device_name(&self) -> Option<String> {
        self.connected_device.read().clone()
    }

    pub fn get_last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    pub fn record_sent(&self, len: usize) {
        self.bytes_sent.fetch_add(len as u64, Ordering::Relaxed);
        *self.last_activity.write() = Some(Local::now());
    }

    pub fn record_received(&self, data: &[u8]) {
        self.bytes_received
            .fetch_add(data.len() as u64, Ordering::Relaxed);
        *self.last_activity.write() = Some(Local::now());

        let text = String::from_utf8_lossy(data).trim().to_string();
        if !text.is_empty() {
            *self.last_text.write() = Some(text);
        }
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    pub fn get_last_text(&self) -> Option<String> {
        self.last_text.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LinkState; 3] = [LinkState::Idle, LinkState::Connecting, LinkState::Connected];

    #[test]
    fn test_transition_graph() {
        let mut legal = Vec::new();
        for from in ALL {
            for to in ALL {
                if from.can_transition_to(to) {
                    legal.push((from, to));
                }
            }
        }

        assert_eq!(
            legal,
            vec![
                (LinkState::Idle, LinkState::Connecting),
                (LinkState::Connecting, LinkState::Idle),
                (LinkState::Connecting, LinkState::Connected),
                (LinkState::Connected, LinkState::Idle),
            ]
        );
    }

    #[test]
    fn test_idle_cannot_jump_to_connected() {
        assert!(!LinkState::Idle.can_transition_to(LinkState::Connected));
        assert!(!LinkState::Connected.can_transition_to(LinkState::Connecting));
    }

    #[test]
    fn test_controller_counters() {
        let state = ControllerState::new();
        state.record_sent(4);
        state.record_sent(4);
        state.record_received(b"OK\r\n");

        assert_eq!(state.bytes_sent(), 8);
        assert_eq!(state.bytes_received(), 4);
        assert_eq!(state.get_last_text().as_deref(), Some("OK"));
        assert!(state.last_activity.read().is_some());
    }

    #[test]
    fn test_connect_clears_error() {
        let state = ControllerState::new();
        state.set_disconnected(Some("socket closed".to_string()));
        assert_eq!(state.get_last_error().as_deref(), Some("socket closed"));

        state.set_connected("HC-06".to_string());
        assert_eq!(state.get_device_name().as_deref(), Some("HC-06"));
        assert!(state.get_last_error().is_none());
    }
}
