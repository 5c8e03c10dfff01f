use crate::graph::{INTERNAL_MARKER, interface_labels};
use crate::topology::Topology;
use anyhow::{Context, Result};
use std::fmt::Write as _;

/// Human-readable dump of the collected topology, printed ahead of the graph
/// in verbose mode.
pub fn verbose_report(topology: &Topology) -> Result<String> {
    let mut out = String::new();

    for container in &topology.containers {
        let _ = writeln!(out, "{}", interface_labels(container).join("|"));
    }

    for network in &topology.networks {
        let marker = if network.internal { INTERNAL_MARKER } else { "" };
        let _ = writeln!(
            out,
            "Network: {}{marker} gw:{}",
            network.name,
            network.gateway.as_deref().unwrap_or("")
        );

        for member in network.members.values() {
            let json = serde_json::to_string_pretty(member)
                .with_context(|| format!("Failed to serialize member {}", member.name))?;
            let _ = writeln!(out, "{json}");
            let addresses = [&member.ipv4_address, &member.ipv6_address]
                .into_iter()
                .filter(|address| !address.is_empty())
                .fold(String::new(), |acc, address| acc + " " + address);
            let _ = writeln!(out, " * {}{addresses}", member.name);
        }
    }

    Ok(out)
}
