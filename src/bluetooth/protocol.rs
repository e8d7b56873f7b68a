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

//! Wire format for data sent to the receiver.
//!
//! The link carries raw bytes with no framing: a flight frame is exactly four
//! signed bytes, a text message is its UTF-8 encoding written in one call.

use uuid::Uuid;

/// Standard SPP UUID.
pub const SPP_UUID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// RFCOMM channel used by serial-port receivers such as the HC-06.
pub const DEFAULT_RFCOMM_CHANNEL: u8 = 1;

/// Size of the read buffer used by the IO worker.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Length of an encoded flight frame.
pub const FLIGHT_FRAME_LEN: usize = 4;

/// A single flight-control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightFrame {
    pub throttle: i8,
    pub yaw: i8,
    pub pitch: i8,
    pub roll: i8,
}

impl FlightFrame {
    /// Sticks released: zero throttle, centred yaw/pitch/roll.
    pub const NEUTRAL: FlightFrame = FlightFrame {
        throttle: 0,
        yaw: 127,
        pitch: 127,
        roll: 127,
    };

    pub fn new(throttle: i8, yaw: i8, pitch: i8, roll: i8) -> Self {
        Self {
            throttle,
            yaw,
            pitch,
            roll,
        }
    }

    /// Encode as `[throttle, yaw, pitch, roll]`.
    pub fn to_bytes(&self) -> [u8; FLIGHT_FRAME_LEN] {
        [
            self.throttle as u8,
            self.yaw as u8,
            self.pitch as u8,
            self.roll as u8,
        ]
    }

    /// Decode a frame from exactly four bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [t, y, p, r] => Some(Self::new(*t as i8, *y as i8, *p as i8, *r as i8)),
            _ => None,
        }
    }
}

impl Default for FlightFrame {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Encode a text message for the link.
pub fn encode_text(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}
