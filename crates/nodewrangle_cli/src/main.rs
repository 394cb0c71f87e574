// SPDX-License-Identifier: MIT OR Apache-2.0
//! `nodewrangle` - apply node graph operators from the command line.
//!
//! Graphs are read from and written to RON files. Operators are given as
//! RON values of [`OperatorCall`], for example:
//!
//! ```text
//! nodewrangle apply --graph material.ron --op 'merge_nodes(mode: Mix)' --op 'align_nodes()'
//! ```

use clap::{Parser, Subcommand};
use nodewrangle_graph::Graph;
use nodewrangle_ops::{
    run_recorded, History, HistoryError, OperatorCall, OperatorStatus, ReportLevel, SettingsError, WranglerSettings,
    SETTINGS_FILE_NAME,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "nodewrangle=info";

#[derive(Debug, Parser)]
#[command(name = "nodewrangle", version, about = "Apply node graph operators to RON graph files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run operators against a graph and save the result
    Apply {
        /// Graph file to read
        #[arg(long)]
        graph: PathBuf,
        /// Operator to run, as RON; repeat to run several in order
        #[arg(long = "op", required = true)]
        ops: Vec<String>,
        /// Settings file; defaults to nodewrangle.ron next to the graph
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Where to write the result; defaults to the input file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Undo this many finished operators before saving
        #[arg(long, default_value_t = 0)]
        undo: usize,
        /// Run without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a summary of a graph
    Inspect {
        /// Graph file to read
        #[arg(long)]
        graph: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid graph file {}: {source}", path.display())]
    GraphFile {
        path: PathBuf,
        source: ron::error::SpannedError,
    },

    #[error("Invalid operator `{text}`: {source}")]
    Operator {
        text: String,
        source: ron::error::SpannedError,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Failed to serialise graph: {0}")]
    Serialize(#[from] ron::Error),

    #[error(transparent)]
    History(#[from] HistoryError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "nodewrangle failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Apply {
            graph,
            ops,
            settings,
            output,
            undo,
            dry_run,
        } => {
            let calls = parse_ops(&ops)?;
            let settings = load_settings(&graph, settings.as_deref())?;
            let mut document = load_graph(&graph)?;
            apply(&mut document, &settings, &calls, undo)?;
            if dry_run {
                tracing::info!("dry run, nothing written");
                return Ok(());
            }
            let output = output.unwrap_or(graph);
            save_graph(&document, &output)
        }
        Command::Inspect { graph } => {
            let document = load_graph(&graph)?;
            print!("{}", summary(&document));
            Ok(())
        }
    }
}

fn parse_ops(ops: &[String]) -> Result<Vec<OperatorCall>, CliError> {
    ops.iter()
        .map(|text| {
            ron::from_str(text).map_err(|source| CliError::Operator {
                text: text.clone(),
                source,
            })
        })
        .collect()
}

fn apply(graph: &mut Graph, settings: &WranglerSettings, calls: &[OperatorCall], undo: usize) -> Result<(), CliError> {
    let mut history = History::new();
    for call in calls {
        let outcome = run_recorded(graph, settings, call, &mut history)?;
        let warnings = outcome.reports.iter().filter(|r| r.level == ReportLevel::Warning).count();
        match outcome.status {
            OperatorStatus::Cancelled => tracing::warn!(operator = call.name(), "operator cancelled"),
            status => tracing::info!(operator = call.name(), ?status, warnings, "operator ran"),
        }
    }
    for _ in 0..undo {
        let operator = history.undo(graph)?;
        tracing::info!(operator = %operator, "undone");
    }
    Ok(())
}

fn load_settings(graph_path: &Path, explicit: Option<&Path>) -> Result<WranglerSettings, CliError> {
    if let Some(path) = explicit {
        return Ok(WranglerSettings::load(path)?);
    }
    let beside = graph_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(SETTINGS_FILE_NAME);
    if beside.exists() {
        Ok(WranglerSettings::load(&beside)?)
    } else {
        tracing::debug!("no settings file, using defaults");
        Ok(WranglerSettings::default())
    }
}

fn load_graph(path: &Path) -> Result<Graph, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = ron::from_str(&content).map_err(|source| CliError::GraphFile {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "graph loaded");
    Ok(graph)
}

fn save_graph(graph: &Graph, path: &Path) -> Result<(), CliError> {
    let config = ron::ser::PrettyConfig::default();
    let content = ron::ser::to_string_pretty(graph, config)?;
    std::fs::write(path, content).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "graph saved");
    Ok(())
}

fn summary(graph: &Graph) -> String {
    let mut out = format!(
        "{} ({:?}): {} nodes, {} links, {}\n",
        graph.name,
        graph.tree_type(),
        graph.node_count(),
        graph.link_count(),
        if graph.topological_order().is_ok() { "acyclic" } else { "cyclic" },
    );
    for node in graph.nodes() {
        let marker = match (graph.active() == Some(node.id), node.selected) {
            (true, _) => '*',
            (false, true) => '+',
            (false, false) => ' ',
        };
        out.push_str(&format!(
            "{marker} {} [{:?}] at ({}, {})\n",
            node.display_name(),
            node.kind,
            node.position[0],
            node.position[1]
        ));
    }
    out
}
