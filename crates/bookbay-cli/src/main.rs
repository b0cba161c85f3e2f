use anyhow::{Context, Result};
use bookbay_core::{filter, SearchParams};
use bookbay_storage::{persistent::load_state, CatalogStore, StaticCatalog};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bookbay")]
#[command(about = "BookBay catalog and data-dir tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Filter the catalog and print matches as JSON.
    Search {
        #[arg(long, default_value = "")]
        q: String,
        /// Comma-separated category tags
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated conditions
        #[arg(long)]
        condition: Option<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        /// relevance, price-low-high, price-high-low or newest
        #[arg(long)]
        sort: Option<String>,
        /// JSON array of books; the sample catalog when absent
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Replay a server data directory and print record counts.
    Inspect {
        data_dir: PathBuf,
        /// Also write the replayed records as JSON lines.
        #[arg(long)]
        dump: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Search {
            q,
            category,
            condition,
            min_price,
            max_price,
            sort,
            catalog,
        } => {
            let catalog = match catalog {
                Some(path) => StaticCatalog::from_path(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => StaticCatalog::sample(),
            };
            let params = SearchParams {
                q,
                category,
                condition,
                sort,
                min_price,
                max_price,
            };
            let books = filter(catalog.books(), &params.q, &params.filters());
            println!("{}", serde_json::to_string_pretty(&books)?);
        }
        Cmd::Inspect { data_dir, dump } => {
            let (mem, manifest) = load_state(&data_dir)
                .with_context(|| format!("replaying {}", data_dir.display()))?;
            if let Some(path) = dump {
                let mut s = String::new();
                for rec in mem.records() {
                    s.push_str(&serde_json::to_string(&rec)?);
                    s.push('\n');
                }
                std::fs::write(path, s)?;
            }
            let report = serde_json::json!({
                "snapshot": manifest.current_snapshot,
                "segments": manifest.segments,
                "stats": mem.snapshot_stats(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
