//! Draws which containers sit on which Docker networks.
//!
//! One pass: [`topology::collect`] queries the daemon, [`graph::build`] turns
//! the snapshot into record nodes and colored edges, and a
//! [`render::GraphRenderer`] prints the DOT text and optionally an image.

pub mod color;
pub mod docker_client;
pub mod error;
pub mod graph;
pub mod render;
pub mod report;
pub mod topology;

use anyhow::{Context, Result};
use color::ColorAllocator;
use graph::Graph;
use log::info;
use render::GraphRenderer;
use std::io::Write;
use std::path::PathBuf;
use topology::TopologySource;

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub verbose: bool,
    /// Render an image here in addition to printing the DOT text.
    pub output: Option<PathBuf>,
}

/// Collects the topology from `source`, prints its graph to `out` and renders
/// the image if `options.output` is set.
pub async fn generate<S, R, W>(
    source: &S,
    renderer: &mut R,
    out: &mut W,
    options: &Options,
) -> Result<Graph>
where
    S: TopologySource + ?Sized,
    R: GraphRenderer + ?Sized,
    W: Write,
{
    let topology = topology::collect(source).await?;

    if options.verbose {
        out.write_all(report::verbose_report(&topology)?.as_bytes())
            .context("Failed to write report")?;
    }

    let graph = graph::build(&topology, &mut ColorAllocator::new());
    info!(
        "Graph has {} nodes and {} edges",
        graph.nodes().count(),
        graph.edges().count()
    );

    render::declare(&graph, renderer);
    writeln!(out, "{}", renderer.source()).context("Failed to write graph")?;
    out.flush().context("Failed to write graph")?;

    if let Some(path) = &options.output {
        renderer.render(path).await?;
    }

    Ok(graph)
}
