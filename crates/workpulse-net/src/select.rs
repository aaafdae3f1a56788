//! Adapter scoring and selection

use std::net::Ipv4Addr;
use tracing::debug;
use workpulse_api::NetworkInfo;

use crate::{AdapterInfo, enumerate_adapters};

/// Lowercase name fragments that disqualify an adapter
const BLOCKLIST: &[&str] = &[
    "virtual",
    "vmware",
    "vpn",
    "tunnel",
    "tun",
    "tap",
    "clash",
    "wsl",
    "docker",
    "veth",
    "bluetooth",
    "蓝牙",
    "wireless",
    "wi-fi",
    "wifi",
    "无线",
    "wlan",
    "wlp",
    "loopback",
];

const LOCALIZED_ETHERNET: &str = "以太网";

/// Name fragments of wired adapters that do not say "ethernet"
const WIRED_HINTS: &[&str] = &["local area connection", "本地连接", "lan", "bond", "usb"];

pub const PRIORITY_LOCALIZED_ETHERNET: u32 = 100;
pub const PRIORITY_ETHERNET: u32 = 90;
pub const PRIORITY_WIRED: u32 = 80;
pub const PRIORITY_PRIVATE: u32 = 50;

/// A scored adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterCandidate {
    pub name: String,
    pub ipv4: Ipv4Addr,
    pub mac: Option<String>,
    pub priority: u32,
}

impl From<AdapterCandidate> for NetworkInfo {
    fn from(candidate: AdapterCandidate) -> Self {
        NetworkInfo {
            mac: candidate.mac,
            ipv4: Some(candidate.ipv4),
        }
    }
}

fn is_blocked(name: &str) -> bool {
    let lower = name.to_lowercase();
    BLOCKLIST.iter().any(|word| lower.contains(word))
}

fn looks_wired(lower: &str, ip: Ipv4Addr) -> bool {
    !ip.is_loopback() && !ip.is_link_local() && WIRED_HINTS.iter().any(|hint| lower.contains(hint))
}

fn priority(name: &str, ip: Ipv4Addr) -> u32 {
    let lower = name.to_lowercase();

    if name.contains(LOCALIZED_ETHERNET) {
        PRIORITY_LOCALIZED_ETHERNET
    } else if lower.contains("ethernet") || lower.starts_with("eth") || lower.starts_with("en") {
        PRIORITY_ETHERNET
    } else if looks_wired(&lower, ip) {
        PRIORITY_WIRED
    } else if ip.is_private() {
        PRIORITY_PRIVATE
    } else {
        0
    }
}

/// Filter and score adapters, best first. Ties keep input order.
pub fn rank_adapters(adapters: &[AdapterInfo]) -> Vec<AdapterCandidate> {
    let mut candidates: Vec<AdapterCandidate> = adapters
        .iter()
        .filter(|a| !a.ipv4.is_loopback() && !is_blocked(&a.name))
        .map(|a| AdapterCandidate {
            name: a.name.clone(),
            ipv4: a.ipv4,
            mac: a.mac.clone(),
            priority: priority(&a.name, a.ipv4),
        })
        .collect();

    candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
    candidates
}

/// Pick the best adapter from a given list
pub fn select_from(adapters: &[AdapterInfo]) -> NetworkInfo {
    match rank_adapters(adapters).into_iter().next() {
        Some(best) => {
            debug!(adapter = %best.name, priority = best.priority, "Selected adapter");
            best.into()
        }
        None => {
            debug!("No qualifying adapter");
            NetworkInfo::default()
        }
    }
}

/// Pick the best adapter on this host, or nulls if none qualifies
pub fn select_best_adapter() -> NetworkInfo {
    select_from(&enumerate_adapters())
}
