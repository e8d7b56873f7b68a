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

//! Link error types.

/// Errors surfaced by the link manager.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("No bonded device matches {0}")]
    PeerNotFound(String),

    #[error("Link is not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid link configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "bluez")]
impl From<bluer::Error> for LinkError {
    fn from(e: bluer::Error) -> Self {
        LinkError::Transport(e.to_string())
    }
}
