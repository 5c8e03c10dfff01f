//! DOT serialization and image rendering through the Graphviz layout programs.

use crate::error::GraphError;
use crate::graph::{Edge, Graph, Node, Port, Statement};
use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use log::{debug, info};
use std::fmt::Write as _;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub const GRAPH_COMMENT: &str = "Docker Network Graph";
/// Output format handed to the layout program.
pub const IMAGE_FORMAT: &str = "png";

/// Consumes node and edge declarations, then produces text and images.
#[async_trait]
pub trait GraphRenderer: Send + Sync {
    fn declare_node(&mut self, node: &Node);
    fn declare_edge(&mut self, edge: &Edge);
    /// Text description of everything declared so far.
    fn source(&self) -> String;
    async fn render(&self, path: &Path) -> Result<()>;
}

/// Feeds every statement of `graph` to `renderer`, in declaration order.
pub fn declare<R>(graph: &Graph, renderer: &mut R)
where
    R: GraphRenderer + ?Sized,
{
    for statement in graph.statements() {
        match statement {
            Statement::Node(node) => renderer.declare_node(node),
            Statement::Edge(edge) => renderer.declare_edge(edge),
        }
    }
}

/// Force-directed Graphviz layout programs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    #[default]
    Sfdp,
    Fdp,
    Neato,
}

impl Layout {
    pub fn program(self) -> &'static str {
        match self {
            Layout::Sfdp => "sfdp",
            Layout::Fdp => "fdp",
            Layout::Neato => "neato",
        }
    }
}

/// Undirected DOT graph rendered by an external Graphviz program.
pub struct Graphviz {
    layout: Layout,
    body: String,
}

impl Graphviz {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            body: String::with_capacity(4096),
        }
    }

    fn attrs(attrs: &[(&str, &str)]) -> String {
        attrs
            .iter()
            .map(|(key, value)| format!("{key}={}", quote(value)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Graphviz {
    fn default() -> Self {
        Self::new(Layout::default())
    }
}

#[async_trait]
impl GraphRenderer for Graphviz {
    fn declare_node(&mut self, node: &Node) {
        let attrs = Self::attrs(&[
            ("label", node.label.as_str()),
            ("fillcolor", node.fill_color.as_str()),
            ("shape", node.shape),
            ("style", "filled"),
        ]);
        let _ = writeln!(self.body, "\t{} [{attrs}]", id(&node.id));
    }

    fn declare_edge(&mut self, edge: &Edge) {
        let attrs = Self::attrs(&[("color", edge.color.as_str())]);
        let _ = writeln!(
            self.body,
            "\t{} -- {} [{attrs}]",
            port_ref(&edge.from),
            port_ref(&edge.to)
        );
    }

    fn source(&self) -> String {
        format!(
            "// {GRAPH_COMMENT}\ngraph {{\n\tgraph [splines=true]\n{}}}\n",
            self.body
        )
    }

    async fn render(&self, path: &Path) -> Result<()> {
        let program = self.layout.program();
        info!("Rendering {} with {program}", path.display());

        run_layout(program, &self.source(), path).await?;

        debug!("{program} wrote {}", path.display());
        Ok(())
    }
}

/// Pipes `source` into `program` and has it write a PNG to `path`.
///
/// A program that exits early breaks the pipe; its exit status and stderr
/// are reported in preference to the write error.
async fn run_layout(program: &'static str, source: &str, path: &Path) -> Result<()> {
    let mut child = Command::new(program)
        .arg(format!("-T{IMAGE_FORMAT}"))
        .arg("-o")
        .arg(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| GraphError::RendererUnavailable { program, source })?;

    let written = match child.stdin.take() {
        // Dropping stdin at the end of the arm closes the pipe.
        Some(mut stdin) => stdin.write_all(source.as_bytes()).await,
        None => Ok(()),
    };

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("Failed to wait for {program}"))?;

    if !output.status.success() {
        return Err(GraphError::RenderFailed {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    written.with_context(|| format!("Failed to write graph to {program}"))?;
    Ok(())
}

/// True for strings DOT accepts unquoted as an ID.
fn is_plain_id(input: &str) -> bool {
    let mut chars = input.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Escape special characters for DOT strings.
fn escape(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}

fn quote(input: &str) -> String {
    format!("\"{}\"", escape(input))
}

fn id(input: &str) -> String {
    if is_plain_id(input) {
        input.to_string()
    } else {
        quote(input)
    }
}

fn port_ref(port: &Port) -> String {
    format!("{}:{}", id(&port.node), id(&port.port))
}
