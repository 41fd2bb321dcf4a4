use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use filedrop_core::config::DEFAULT_SNAPSHOT_PATH;
use filedrop_core::models::FileKind;
use filedrop_store::{JsonSnapshot, RegistryStore};

#[derive(Parser, Debug)]
#[command(name = "list_files")]
#[command(about = "List registered files from the registry snapshot")]
struct Args {
    /// Only show files registered by this uploader
    #[arg(long)]
    uploader: Option<String>,

    /// Optional kind filter: document, photo, video, audio, unknown
    #[arg(long, value_name = "KIND")]
    kind: Option<String>,

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

    let kind_filter: Option<FileKind> = if let Some(ref kind) = args.kind {
        Some(match kind.as_str() {
            "document" => FileKind::Document,
            "photo" => FileKind::Photo,
            "video" => FileKind::Video,
            "audio" => FileKind::Audio,
            "unknown" => FileKind::Unknown,
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid kind. Must be: document, photo, video, audio, or unknown"
                ))
            }
        })
    } else {
        None
    };

    let path = snapshot_path(args.snapshot);
    let store = RegistryStore::load(Arc::new(JsonSnapshot::new(&path))).await;

    let mut rows: Vec<FileRow> = store
        .list(|_, record| {
            args.uploader
                .as_deref()
                .map(|u| record.uploader == u)
                .unwrap_or(true)
                && kind_filter.map(|k| record.kind == k).unwrap_or(true)
        })
        .into_iter()
        .map(|(id, record)| FileRow {
            id: id.as_str().to_string(),
            kind: record.kind.as_str().to_string(),
            uploader: record.uploader,
            uploaded_at: record.uploaded_at,
        })
        .collect();

    // Sort by uploaded_at descending
    rows.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            print_file_table(&rows, &path);
        }
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct FileRow {
    id: String,
    kind: String,
    uploader: String,
    uploaded_at: chrono::DateTime<chrono::Utc>,
}

fn snapshot_path(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(|| {
        std::env::var("FILE_REGISTRY_PATH")
            .unwrap_or_else(|_| DEFAULT_SNAPSHOT_PATH.to_string())
            .into()
    })
}

fn print_file_table(rows: &[FileRow], path: &std::path::Path) {
    println!("\n=== Registered Files ===\n");
    println!("Snapshot: {}", path.display());
    println!("Total: {} files", rows.len());

    if rows.is_empty() {
        println!("\nNo files registered.");
        return;
    }

    println!(
        "\n{:<24} {:<10} {:<24} {:>20}",
        "ID", "Kind", "Uploader", "Uploaded At"
    );
    println!("{}", "-".repeat(82));

    for row in rows {
        println!(
            "{:<24} {:<10} {:<24} {:>20}",
            row.id,
            row.kind,
            truncate_string(&row.uploader, 24),
            row.uploaded_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    println!();
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}
