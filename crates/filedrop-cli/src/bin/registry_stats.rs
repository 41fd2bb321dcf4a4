use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use filedrop_core::config::DEFAULT_SNAPSHOT_PATH;
use filedrop_core::models::FileKind;
use filedrop_store::{JsonSnapshot, RegistryStore};

#[derive(Parser, Debug)]
#[command(name = "registry_stats")]
#[command(about = "Get statistics about the file registry")]
struct Args {
    /// Snapshot file to read (defaults to FILE_REGISTRY_PATH or the built-in path)
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Output format: json or table (default: table)
    #[arg(long, default_value = "table")]
    format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let path = args.snapshot.unwrap_or_else(|| {
        std::env::var("FILE_REGISTRY_PATH")
            .unwrap_or_else(|_| DEFAULT_SNAPSHOT_PATH.to_string())
            .into()
    });

    let store = RegistryStore::load(Arc::new(JsonSnapshot::new(&path))).await;
    let stats = calculate_stats(&store);

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        _ => {
            print_stats_table(&stats, &path);
        }
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct RegistryStats {
    total_files: usize,
    documents: usize,
    photos: usize,
    videos: usize,
    audios: usize,
    unknown: usize,
    distinct_uploaders: usize,
}

fn calculate_stats(store: &RegistryStore) -> RegistryStats {
    let entries = store.list(|_, _| true);

    let count_kind =
        |kind: FileKind| entries.iter().filter(|(_, r)| r.kind == kind).count();

    let uploaders: HashSet<&str> = entries.iter().map(|(_, r)| r.uploader.as_str()).collect();

    RegistryStats {
        total_files: entries.len(),
        documents: count_kind(FileKind::Document),
        photos: count_kind(FileKind::Photo),
        videos: count_kind(FileKind::Video),
        audios: count_kind(FileKind::Audio),
        unknown: count_kind(FileKind::Unknown),
        distinct_uploaders: uploaders.len(),
    }
}

fn print_stats_table(stats: &RegistryStats, path: &std::path::Path) {
    println!("\n=== Registry Statistics ===\n");
    println!("Snapshot: {}", path.display());
    println!();
    println!("{:<20} {:>8}", "Total files", stats.total_files);
    println!("{:<20} {:>8}", "Documents", stats.documents);
    println!("{:<20} {:>8}", "Photos", stats.photos);
    println!("{:<20} {:>8}", "Videos", stats.videos);
    println!("{:<20} {:>8}", "Audios", stats.audios);
    println!("{:<20} {:>8}", "Unknown", stats.unknown);
    println!("{:<20} {:>8}", "Uploaders", stats.distinct_uploaders);
    println!();
}
