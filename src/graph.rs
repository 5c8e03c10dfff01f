//! Node/edge description of a [`Topology`].
//!
//! Containers and networks both become record-shaped nodes. Each container
//! record has one field per interface, addressed by its endpoint id, so an
//! edge lands on the exact interface that joins the network.

use crate::color::ColorAllocator;
use crate::topology::{Attachment, Container, Network, Topology};
use rand::Rng;

pub const RECORD_SHAPE: &str = "record";
pub const CONTAINER_FILL: &str = "#ff9999";
/// Port of the gateway field in every network record.
pub const GATEWAY_PORT: &str = "gw_iface";
pub const INTERNAL_MARKER: &str = " Internal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub shape: &'static str,
    pub label: String,
    pub fill_color: String,
}

/// A field inside a record node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub node: String,
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: Port,
    pub to: Port,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Node(Node),
    Edge(Edge),
}

/// Append-only list of declarations, kept in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    statements: Vec<Statement>,
}

impl Graph {
    fn push_node(&mut self, node: Node) {
        self.statements.push(Statement::Node(node));
    }

    fn push_edge(&mut self, edge: Edge) {
        self.statements.push(Statement::Edge(edge));
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Node(node) => Some(node),
            Statement::Edge(_) => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Edge(edge) => Some(edge),
            Statement::Node(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

pub fn container_node_id(container_id: &str) -> String {
    format!("container_{container_id}")
}

pub fn network_node_id(network_name: &str) -> String {
    format!("net_{network_name}")
}

/// `<endpoint> address`: a record field addressable by its endpoint id.
pub fn interface_label(attachment: &Attachment) -> String {
    format!("<{}> {}", attachment.endpoint_id, attachment.ipv4_address)
}

pub fn interface_labels(container: &Container) -> Vec<String> {
    container.attachments.values().map(interface_label).collect()
}

pub fn container_label(container: &Container) -> String {
    format!(
        "{{ {} | {{ {} }} }}",
        container.name,
        interface_labels(container).join("|")
    )
}

pub fn network_label(network: &Network) -> String {
    let marker = if network.internal { INTERNAL_MARKER } else { "" };
    format!(
        "{{<{GATEWAY_PORT}> {} | {}{marker}}}",
        network.gateway.as_deref().unwrap_or(""),
        network.name
    )
}

/// Builds the graph. Networks draw their colors from `colors` in the order
/// they appear in `topology`, one color each.
pub fn build<R: Rng>(topology: &Topology, colors: &mut ColorAllocator<R>) -> Graph {
    let mut graph = Graph::default();

    for container in &topology.containers {
        graph.push_node(Node {
            id: container_node_id(&container.id),
            shape: RECORD_SHAPE,
            label: container_label(container),
            fill_color: CONTAINER_FILL.to_string(),
        });
    }

    for network in &topology.networks {
        let color = colors.next_color();
        let node_id = network_node_id(&network.name);

        graph.push_node(Node {
            id: node_id.clone(),
            shape: RECORD_SHAPE,
            label: network_label(network),
            fill_color: color.clone(),
        });

        for (container_id, member) in &network.members {
            graph.push_edge(Edge {
                from: Port {
                    node: container_node_id(container_id),
                    port: member.endpoint_id.clone(),
                },
                to: Port {
                    node: node_id.clone(),
                    port: GATEWAY_PORT.to_string(),
                },
                color: color.clone(),
            });
        }
    }

    graph
}
