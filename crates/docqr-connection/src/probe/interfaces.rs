//! Local network interface enumeration

use super::{InterfaceInfo, ProbeStageError};

/// List local interfaces with the addresses bound to them, in system order.
#[cfg(unix)]
pub(super) fn list_interfaces() -> Result<Vec<InterfaceInfo>, ProbeStageError> {
    use nix::net::if_::InterfaceFlags;
    use std::net::IpAddr;

    let addresses =
        nix::ifaddrs::getifaddrs().map_err(|e| ProbeStageError::Interfaces(e.to_string()))?;

    let mut interfaces: Vec<InterfaceInfo> = Vec::new();
    for ifaddr in addresses {
        let ip = ifaddr.address.as_ref().and_then(|address| {
            if let Some(v4) = address.as_sockaddr_in() {
                Some(IpAddr::V4(v4.ip()))
            } else {
                address.as_sockaddr_in6().map(|v6| IpAddr::V6(v6.ip()))
            }
        });

        let index = match interfaces
            .iter()
            .position(|i| i.name == ifaddr.interface_name)
        {
            Some(index) => index,
            None => {
                interfaces.push(InterfaceInfo {
                    name: ifaddr.interface_name.clone(),
                    addresses: Vec::new(),
                    is_up: ifaddr.flags.contains(InterfaceFlags::IFF_UP),
                    is_loopback: ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK),
                });
                interfaces.len() - 1
            }
        };

        if let Some(ip) = ip
            && !interfaces[index].addresses.contains(&ip)
        {
            interfaces[index].addresses.push(ip);
        }
    }

    Ok(interfaces)
}

#[cfg(not(unix))]
pub(super) fn list_interfaces() -> Result<Vec<InterfaceInfo>, ProbeStageError> {
    Err(ProbeStageError::Interfaces(
        "unsupported platform".to_string(),
    ))
}
