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

//! Resolution of the target receiver among bonded devices.

use tracing::debug;
use uuid::Uuid;

use super::error::LinkError;
use super::transport::BondedDevice;
use crate::config::LinkConfig;

/// Identity of the peer a link is opened against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDescriptor {
    pub name: String,
    pub address: String,
    pub service_uuid: Uuid,
}

/// Find the configured target among `bonded`.
///
/// Returns the first device whose name equals the target name or whose
/// address equals the target address. Addresses are compared
/// case-insensitively since adapters report them in either case.
pub fn resolve(config: &LinkConfig, bonded: &[BondedDevice]) -> Result<PeerDescriptor, LinkError> {
    let target_name = config.target_name.as_deref().filter(|n| !n.is_empty());
    let target_address = config.target_address.as_deref().filter(|a| !a.is_empty());

    let found = bonded.iter().find(|device| {
        target_name.is_some_and(|name| device.name == name)
            || target_address.is_some_and(|address| device.address.eq_ignore_ascii_case(address))
    });

    match found {
        Some(device) => {
            debug!("Resolved peer {} at {}", device.name, device.address);
            Ok(PeerDescriptor {
                name: device.name.clone(),
                address: device.address.clone(),
                service_uuid: config.service_uuid,
            })
        }
        None => Err(LinkError::PeerNotFound(config.target_label())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bonded() -> Vec<BondedDevice> {
        vec![
            BondedDevice::new("phoneX", "AA:BB"),
            BondedDevice::new("quadReceiver", "00:14:03:06:02:47"),
        ]
    }

    #[test]
    fn test_resolve_by_name() {
        let peer = resolve(&LinkConfig::for_name("quadReceiver"), &bonded()).unwrap();
        assert_eq!(peer.name, "quadReceiver");
        assert_eq!(peer.address, "00:14:03:06:02:47");
    }

    #[test]
    fn test_resolve_by_address_ignores_case() {
        let devices = vec![BondedDevice::new("HC-06", "98:D3:31:FB:2A:1C")];
        let peer = resolve(&LinkConfig::for_address("98:d3:31:fb:2a:1c"), &devices).unwrap();
        assert_eq!(peer.name, "HC-06");
    }

    #[test]
    fn test_not_found() {
        let devices = vec![BondedDevice::new("phoneX", "AA:BB")];
        let result = resolve(&LinkConfig::for_name("quadReceiver"), &devices);
        assert!(matches!(result, Err(LinkError::PeerNotFound(_))));
    }

    #[test]
    fn test_empty_bonded_set() {
        let result = resolve(&LinkConfig::default(), &[]);
        assert!(matches!(result, Err(LinkError::PeerNotFound(_))));
    }

    #[test]
    fn test_first_match_wins() {
        let devices = vec![
            BondedDevice::new("quadReceiver", "11:11"),
            BondedDevice::new("quadReceiver", "22:22"),
        ];
        let peer = resolve(&LinkConfig::for_name("quadReceiver"), &devices).unwrap();
        assert_eq!(peer.address, "11:11");
    }

    #[test]
    fn test_descriptor_carries_service_uuid() {
        let mut config = LinkConfig::for_name("quadReceiver");
        config.service_uuid = Uuid::from_u128(42);
        let peer = resolve(&config, &bonded()).unwrap();
        assert_eq!(peer.service_uuid, Uuid::from_u128(42));
    }
}
