//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::codegen::{Evaluator, ExpressionCompiler};
use crate::mirror::{JsonLinesTransport, Mirror, MirrorConfig, MirrorMessage, RemoteGraph, Snapshot, Transport};
use crate::ugen::{mul, Map, MapRange, NodeRef, Sequence, Value};

/// Rebuild a graph from a snapshot file, print its expression and
/// optionally `ticks` evaluated samples.
pub fn compile(path: &Path, ticks: usize) -> Result<()> {
    info!("Compiling snapshot: {}", path.display());

    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot: Snapshot =
        serde_json::from_str(&text).with_context(|| format!("Invalid snapshot in {}", path.display()))?;

    let mut graph = RemoteGraph::new();
    let value = graph.build(&snapshot).context("Failed to rebuild graph")?;
    let Some(root) = value.as_node() else {
        bail!("{} does not describe a node", path.display());
    };

    let expression = ExpressionCompiler::default()
        .compile(root)
        .context("Failed to compile graph")?;
    println!("{}", expression);

    if ticks > 0 {
        let samples = Evaluator::default()
            .render(root, ticks)
            .context("Failed to evaluate graph")?;
        for sample in samples {
            println!("{}", sample);
        }
    }

    Ok(())
}

/// Apply a file of mirror messages and list the resulting objects.
pub fn replay(path: &Path) -> Result<()> {
    info!("Replaying messages: {}", path.display());

    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut graph = RemoteGraph::new();
    let mut applied = 0;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let message = MirrorMessage::from_json(line).with_context(|| format!("Line {}: invalid message", number + 1))?;
        graph
            .apply(&message)
            .with_context(|| format!("Line {}: failed to apply message", number + 1))?;
        applied += 1;
    }

    info!(applied, objects = graph.len(), "Replay complete");

    let compiler = ExpressionCompiler::default();
    for id in graph.ids() {
        let Some(node) = graph.get(id) else {
            continue;
        };
        let name = node.read().name().to_string();
        let expression = compiler.compile(node).unwrap_or_else(|e| format!("<{}>", e));
        println!("{}\t{}\t{}", id, name, expression);
    }

    Ok(())
}

/// Mirror a tremolo graph, writing each message to stdout as a JSON line.
pub fn demo(config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(path) => {
            MirrorConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => MirrorConfig::worklet(),
    };
    info!(mode = ?config.mode, active = config.is_active(), "Running demo");

    let transport: Arc<dyn Transport> = Arc::new(JsonLinesTransport::new(io::stdout()));
    let mirror = Mirror::new(config, transport);

    let output = build_tremolo(&mirror)?;
    let expression = output.compile()?;
    info!(announced = mirror.registry().len(), "Demo complete: {}", expression);

    Ok(())
}

/// Gain node modulated by a stepped LFO, then edited through its wrappers.
fn build_tremolo(mirror: &Mirror) -> Result<NodeRef> {
    let lfo = mirror.wrap_shared(Sequence::new([0.0, 1.0], 4.0)?, "sequence")?;
    let depth = mirror.wrap_shared(
        Map::new(&lfo, MapRange::new(0.5, 1.0, 0.0, 1.0)),
        ["ugens", "map"],
    )?;
    let output = mirror.wrap_shared(mul([Value::from(0.8), Value::from(&depth)])?, "mul")?;

    output.invoke("set", &[Value::from(0.0), Value::from(0.6)])?;
    depth.invoke("set", &[Value::from("outputMin"), Value::from(0.25)])?;
    lfo.invoke("stop", &[])?;
    depth.invoke("set", &[Value::from("input"), Value::from(&lfo)])?;

    Ok(output)
}
