use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use gnd::constants::{DEFAULT_SET_SIZE, clamp_window_size};
use gnd::{GndConfig, GndViewer, HttpTransport, IndexRange, SearchOutcome, split_request_range};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Fetch and render Genome Neighborhood Diagrams",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search a GND job and write the diagrams as SVG.
    Render {
        #[arg(long, default_value = "gnd.toml")]
        config: PathBuf,
        /// Cluster number, UniProt id or other search term.
        #[arg(long)]
        query: Option<String>,
        /// Show the members of this UniRef cluster instead of running a query.
        #[arg(long)]
        uniref_id: Option<String>,
        #[arg(long)]
        window: Option<u32>,
        /// Fetch every diagram instead of a single batch.
        #[arg(long)]
        all: bool,
        #[arg(short, long, default_value = "gnd.svg")]
        output: PathBuf,
        /// Highlight a Pfam or InterPro family; repeatable.
        #[arg(long = "family")]
        families: Vec<String>,
        /// Highlight every family whose id or name contains this text.
        #[arg(long)]
        family_search: Option<String>,
        /// Highlight SwissProt-reviewed genes only.
        #[arg(long)]
        swissprot: bool,
        /// Print the emitted events as JSON lines on stdout.
        #[arg(long)]
        events: bool,
    },
    /// Print the request blocks for an index range.
    Split {
        /// JSON list of `[start, end]` pairs, or `@file.json`.
        index_range: String,
        #[arg(long, default_value_t = DEFAULT_SET_SIZE)]
        set_size: usize,
    },
}

fn load_json_arg(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Could not read JSON file '{path}'"))
        }
        None => Ok(value.to_string()),
    }
}

fn split(index_range: &str, set_size: usize) -> Result<()> {
    let text = load_json_arg(index_range)?;
    let pairs: Vec<[i64; 2]> =
        serde_json::from_str(&text).context("index range must be a list of [start, end] pairs")?;
    let map = split_request_range(&pairs, set_size)?;
    let blocks: Vec<_> = map
        .iter()
        .map(|(block, ranges)| {
            json!({
                "block": block,
                "size": ranges.iter().map(IndexRange::len).sum::<usize>(),
                "range": map.range_param(block),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&blocks)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn render(
    config_path: PathBuf,
    query: Option<String>,
    uniref_id: Option<String>,
    window: Option<u32>,
    all: bool,
    output: PathBuf,
    families: Vec<String>,
    family_search: Option<String>,
    swissprot: bool,
    print_events: bool,
) -> Result<()> {
    let mut config = GndConfig::load(&config_path)
        .with_context(|| format!("Could not load config '{}'", config_path.display()))?;
    if uniref_id.is_some() {
        config.sequence.uniref_id = uniref_id;
    }
    if let Some(window) = window {
        config.retrieval.window_size = clamp_window_size(window);
    }
    let query = query
        .or_else(|| config.sequence.initial_query.clone())
        .unwrap_or_default();
    if query.is_empty() && config.sequence.uniref_id.is_none() {
        bail!("nothing to search: pass --query or --uniref-id");
    }

    let transport = HttpTransport::new(config.api.timeout())?;
    let mut viewer = GndViewer::new(config, transport);
    let params = viewer.params_for_query(&query);

    match viewer.search(params).context("GND search failed")? {
        SearchOutcome::Empty => {
            warn!(query = %query, "search returned no diagrams");
        }
        SearchOutcome::Ready { total_records } => {
            info!(total_records, "search ready");
            if all {
                viewer.show_all()?;
            } else {
                viewer.show_more()?;
            }
            for family in &families {
                viewer.toggle_family(&family.to_uppercase(), true);
            }
            if let Some(text) = family_search {
                viewer.search_families(&text);
            }
            if swissprot {
                viewer.toggle_swissprots(true);
            }
        }
    }

    fs::write(&output, viewer.svg_string())
        .with_context(|| format!("Could not write '{}'", output.display()))?;
    info!(path = %output.display(), "wrote SVG");

    if print_events {
        for event in viewer.take_events() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    if let Some(footer) = viewer.footer() {
        eprintln!("{}", footer.text);
    }
    if viewer.highlight().has_highlighted_families() {
        eprintln!("{}", viewer.highlight_count_text());
    }
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render {
            config,
            query,
            uniref_id,
            window,
            all,
            output,
            families,
            family_search,
            swissprot,
            events,
        } => render(
            config,
            query,
            uniref_id,
            window,
            all,
            output,
            families,
            family_search,
            swissprot,
            events,
        ),
        Command::Split {
            index_range,
            set_size,
        } => split(&index_range, set_size),
    }
}
