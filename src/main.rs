use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use intel_curator::config::{default_config_path, Config};
use intel_curator::{
    Curator, CuratorError, ExportBuilder, ExportError, Filter, SelectedEntry, SessionError,
    SessionStore, TabStat, TaggedEntry,
};

/// Characters of description text shown per entry.
const SNIPPET_CHARS: usize = 280;

#[derive(Parser, Debug)]
#[command(
    name = "intel-curator",
    about = "Browse, tag and export threat-intelligence blog feeds"
)]
struct Args {
    /// Config file (defaults to ~/.config/intel-curator/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Source to display (defaults to the first configured source)
    #[arg(short, long, value_name = "NAME")]
    source: Option<String>,

    /// Search by title or description (case-insensitive)
    #[arg(short = 'q', long, value_name = "QUERY", default_value = "")]
    search: String,

    /// Only show entries carrying this tag (repeatable, any-of)
    #[arg(short, long = "tag", value_name = "TAG")]
    tags: Vec<String>,

    /// Select the Nth displayed entry for export (1-based, repeatable)
    #[arg(long = "select", value_name = "N")]
    select: Vec<usize>,

    /// Export the selected entries
    #[arg(long)]
    export: bool,

    /// Export destination (overrides export_path from the config)
    #[arg(short, long, value_name = "FILE", requires = "export")]
    output: Option<PathBuf>,

    /// Print entries and statistics as JSON
    #[arg(long)]
    json: bool,

    /// Skip per-source tab statistics
    #[arg(long)]
    no_stats: bool,

    /// List configured sources and exit
    #[arg(long)]
    list_sources: bool,

    /// List the tag vocabulary and exit
    #[arg(long)]
    list_tags: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    source: &'a str,
    error: Option<String>,
    entries: &'a [TaggedEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a [TabStat]>,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let path = match path.cloned().or_else(default_config_path) {
        Some(p) => p,
        None => {
            tracing::debug!("HOME not set and no --config given, using defaults");
            return Ok(Config::default());
        }
    };
    Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display()))
}

fn snippet(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= SNIPPET_CHARS {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}

fn print_entries(entries: &[TaggedEntry]) {
    if entries.is_empty() {
        println!("No matching entries.");
        return;
    }
    for (i, tagged) in entries.iter().enumerate() {
        let entry = &tagged.entry;
        println!("[{}] {}", i + 1, entry.title);
        if !entry.published.is_empty() {
            println!("    Date: {}", entry.published);
        }
        let description = snippet(&tagged.text);
        if !description.is_empty() {
            println!("    {}", description);
        }
        if !entry.link.is_empty() {
            println!("    Read the full article: {}", entry.link);
        }
        if !tagged.tags.is_empty() {
            println!("    Tags: {}", tagged.tags.join(", "));
        }
        println!();
    }
}

fn print_stats(stats: &[TabStat]) {
    println!("Tab Statistics");
    for stat in stats {
        if stat.failed {
            println!("  {}: {} entries (fetch failed)", stat.source, stat.count);
        } else {
            println!("  {}: {} entries", stat.source, stat.count);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so --json output stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    if args.list_tags {
        for keyword in config.vocabulary().keywords() {
            println!("{}", keyword);
        }
        return Ok(());
    }

    let curator = Curator::from_config(&config).context("Invalid configuration")?;

    if args.list_sources {
        for source in curator.registry().iter() {
            println!("{}\t{}", source.name, source.url);
        }
        return Ok(());
    }

    let vocabulary = curator.extractor().vocabulary();
    for tag in &args.tags {
        if !vocabulary.contains(&tag.trim().to_lowercase()) {
            eprintln!("Warning: tag '{}' is not in the vocabulary and will never match", tag);
        }
    }

    let filter = Filter::new().with_query(&args.search).with_tags(&args.tags);
    let source_name = args
        .source
        .clone()
        .unwrap_or_else(|| curator.registry().first().name.clone());

    let view = match curator.view(&source_name, &filter).await {
        Ok(view) => view,
        Err(CuratorError::UnknownSource(name)) => {
            eprintln!("Warning: unknown source '{}'. Configured sources:", name);
            for known in curator.registry().names() {
                eprintln!("  {}", known);
            }
            return Ok(());
        }
    };
    if let Some(e) = &view.error {
        eprintln!("Error fetching RSS feed for {}: {}", view.source, e);
    }

    let store = SessionStore::new();
    let session = store.open_session();
    for &n in &args.select {
        match n.checked_sub(1).and_then(|i| view.entries.get(i)) {
            Some(tagged) => {
                store.select(session, SelectedEntry::from(tagged))?;
            }
            None => eprintln!(
                "Warning: --select {} is out of range (1..={})",
                n,
                view.entries.len()
            ),
        }
    }

    let stats = if args.no_stats {
        None
    } else {
        Some(curator.tab_statistics(&filter).await)
    };

    if args.json {
        let output = JsonOutput {
            source: &view.source,
            error: view.error.as_ref().map(|e| e.to_string()),
            entries: &view.entries,
            stats: stats.as_deref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", view.source);
        println!();
        print_entries(&view.entries);
        if let Some(stats) = &stats {
            print_stats(stats);
        }
    }

    if args.export {
        let path = args.output.clone().unwrap_or_else(|| config.export_path.clone());
        match store.export(session, &ExportBuilder::new(), &path) {
            Ok(count) => eprintln!(
                "Exported {} selected entries to {}",
                count,
                path.display()
            ),
            Err(SessionError::Export(ExportError::Empty)) => {
                eprintln!("Warning: No selected entries to export")
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    store.close(session);
    Ok(())
}
