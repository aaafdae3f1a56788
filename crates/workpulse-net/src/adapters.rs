//! Adapter enumeration

use std::net::{IpAddr, Ipv4Addr};
use sysinfo::Networks;
use tracing::debug;

/// One IPv4 address on a local adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub name: String,
    pub ipv4: Ipv4Addr,
    pub mac: Option<String>,
}

impl AdapterInfo {
    pub fn new(name: impl Into<String>, ipv4: Ipv4Addr, mac: Option<String>) -> Self {
        Self {
            name: name.into(),
            ipv4,
            mac,
        }
    }
}

/// List every non-loopback IPv4 address on the host, ordered by adapter name
pub fn enumerate_adapters() -> Vec<AdapterInfo> {
    let networks = Networks::new_with_refreshed_list();

    let mut adapters: Vec<AdapterInfo> = networks
        .list()
        .iter()
        .flat_map(|(name, data)| {
            let mac = data.mac_address();
            let mac = (!mac.is_unspecified()).then(|| mac.to_string());

            data.ip_networks()
                .iter()
                .filter_map(|network| match network.addr {
                    IpAddr::V4(ip) if !ip.is_loopback() => Some(ip),
                    _ => None,
                })
                .map(move |ip| AdapterInfo::new(name.clone(), ip, mac.clone()))
                .collect::<Vec<_>>()
        })
        .collect();

    adapters.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(count = adapters.len(), "Enumerated IPv4 adapters");
    adapters
}
