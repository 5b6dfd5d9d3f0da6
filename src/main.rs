//! Main entry point for the zipview CLI application.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use zipview::cli::{Command, is_http_url};
use zipview::convert::{ConvertRequest, ConvertSettings, TargetFormat, convert};
use zipview::{
    ArchiveEntry, ArchiveError, Cli, EntryKind, HttpRangeReader, ListingSnapshot, LocalFileReader,
    PublishOutcome, ReadAt, Severity, UploadProgress, ViewerSession,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let session = ViewerSession::new(cli.config());

    match &cli.command {
        Command::List { archive, long } => {
            let snapshot = open(&session, archive, cli.quiet).await?;
            print_listing(&snapshot, *long);
        }
        Command::Cat { archive, path } => {
            let snapshot = open(&session, archive, cli.quiet).await?;
            let entry = find_entry(&snapshot, path)?;
            let data = session.load_content(entry).map_err(|e| match e {
                ArchiveError::SizeExceeded(msg) => {
                    anyhow::anyhow!("{msg}; use `zipview extract` to save it instead")
                }
                other => report(other),
            })?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
        Command::Extract {
            archive,
            paths,
            extract_dir,
            overwrite,
        } => {
            let snapshot = open(&session, archive, cli.quiet).await?;
            let selected: Vec<&ArchiveEntry> = if paths.is_empty() {
                snapshot.entries.iter().collect()
            } else {
                paths
                    .iter()
                    .map(|p| find_entry(&snapshot, p))
                    .collect::<Result<_>>()?
            };
            for entry in selected {
                extract_entry(&session, entry, extract_dir, *overwrite, cli.quiet).await?;
            }
        }
        Command::Convert {
            input,
            format,
            output,
            quality,
            max_width,
            strip_metadata,
            web_optimized,
        } => {
            let image = tokio::fs::read(input)
                .await
                .with_context(|| format!("cannot read {}", input.display()))?;
            let request = ConvertRequest {
                image: &image,
                format: format.parse::<TargetFormat>()?,
                settings: ConvertSettings {
                    quality: *quality,
                    auto_resize: max_width.is_some(),
                    max_width: *max_width,
                    strip_metadata: *strip_metadata,
                    web_optimized: *web_optimized,
                },
            };
            let converted = convert(&request)?;
            tokio::fs::write(output, &converted.bytes).await?;
            if !cli.quiet {
                println!(
                    "wrote {} ({}, {}x{}, {})",
                    output.display(),
                    converted.content_type(),
                    converted.width,
                    converted.height,
                    format_size(converted.bytes.len() as u64)
                );
            }
        }
    }

    Ok(())
}

/// Upload an archive from a path or URL into the session.
async fn open(session: &ViewerSession, source: &str, quiet: bool) -> Result<ListingSnapshot> {
    let outcome = if is_http_url(source) {
        let reader = HttpRangeReader::new(source).await?;
        let name = reader.file_name();
        let outcome = upload(session, &name, &reader, quiet).await;
        tracing::debug!(transferred = reader.transferred_bytes(), "remote archive read");
        outcome
    } else {
        let path = Path::new(source);
        let reader = LocalFileReader::new(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string());
        upload(session, &name, &reader, quiet).await
    };

    match outcome {
        PublishOutcome::Published(_) => Ok(session.snapshot()),
        PublishOutcome::Failed(err) => Err(report(err)),
        PublishOutcome::Superseded => bail!("upload was superseded"),
    }
}

async fn upload<R: ReadAt>(session: &ViewerSession, name: &str, reader: &R, quiet: bool) -> PublishOutcome {
    session
        .upload_with(name, reader, |progress: UploadProgress| {
            if !quiet {
                eprint!("\rreading {name}: {:>5.1}%", progress.percent());
                if progress.is_complete() {
                    eprintln!();
                }
            }
        })
        .await
}

/// Turn an archive error into the message shown to the user.
fn report(err: ArchiveError) -> anyhow::Error {
    let label = match err.severity() {
        Severity::Notice => "note",
        Severity::Rejection => "rejected",
        Severity::Failure => "error",
    };
    anyhow::anyhow!("{label} ({}): {}", err.kind(), err.message())
}

fn find_entry<'a>(snapshot: &'a ListingSnapshot, path: &str) -> Result<&'a ArchiveEntry> {
    snapshot
        .find(path)
        .or_else(|| snapshot.find(&format!("{path}/")))
        .with_context(|| format!("no entry named {path} in the archive"))
}

fn print_listing(snapshot: &ListingSnapshot, long: bool) {
    for line in listing_lines(snapshot, long) {
        println!("{line}");
    }
}

fn listing_lines(snapshot: &ListingSnapshot, long: bool) -> Vec<String> {
    let mut lines = Vec::with_capacity(snapshot.entries.len() + 4);

    if long {
        lines.push(format!("{:>10}  {:<4}  Name", "Length", "Type"));
        lines.push("-".repeat(50));
    }

    for entry in &snapshot.entries {
        if long {
            let (size, kind) = match entry.kind {
                EntryKind::Directory => (String::new(), "dir"),
                EntryKind::File => (entry.size.unwrap_or(0).to_string(), "file"),
            };
            lines.push(format!("{:>10}  {:<4}  {}", size, kind, entry.path));
        } else {
            lines.push(entry.name.clone());
        }
    }

    if let Some(stats) = snapshot.stats {
        if long {
            lines.push("-".repeat(50));
        }
        lines.push(format!(
            "{} file{}, {} director{}, {}",
            stats.file_count,
            if stats.file_count == 1 { "" } else { "s" },
            stats.directory_count,
            if stats.directory_count == 1 { "y" } else { "ies" },
            format_size(stats.total_size)
        ));
    }

    lines
}

/// Resolve `entry_path` under `dir`, refusing anything that escapes it.
fn safe_output_path(dir: &Path, entry_path: &str) -> Result<PathBuf> {
    let relative = Path::new(entry_path);
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => bail!("refusing to extract {entry_path}: path escapes the destination"),
        }
    }
    Ok(dir.join(relative))
}

async fn extract_entry(
    session: &ViewerSession,
    entry: &ArchiveEntry,
    dir: &Path,
    overwrite: bool,
    quiet: bool,
) -> Result<()> {
    let output_path = safe_output_path(dir, &entry.path)?;

    if entry.is_dir() {
        tokio::fs::create_dir_all(&output_path).await?;
        return Ok(());
    }

    if output_path.exists() && !overwrite {
        if !quiet {
            eprintln!("Skipping: {} (use -o to overwrite)", entry.path);
        }
        return Ok(());
    }

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    if !quiet {
        println!("  extracting: {}", entry.path);
    }

    let data = session.download(entry).map_err(report)?;
    let mut file = tokio::fs::File::create(&output_path).await?;
    file.write_all(&data).await?;
    file.flush().await?;
    Ok(())
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.1} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1} KB", size as f64 / KB as f64)
    } else {
        format!("{} B", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(2060), "2.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }

    #[test]
    fn output_paths_stay_inside_destination() {
        let dir = Path::new("/tmp/out");
        assert_eq!(
            safe_output_path(dir, "img/b.png").unwrap(),
            PathBuf::from("/tmp/out/img/b.png")
        );
        assert!(safe_output_path(dir, "../etc/passwd").is_err());
        assert!(safe_output_path(dir, "/etc/passwd").is_err());
    }

    #[test]
    fn long_listing_has_header_rows_and_totals() {
        let store = zipview::ContentStore::new();
        let snapshot = ListingSnapshot {
            entries: vec![
                ArchiveEntry::directory("img/"),
                ArchiveEntry::file("a.txt", 12, store.create(b"hello world!".to_vec())),
            ],
            stats: Some(zipview::ArchiveStats {
                file_count: 1,
                directory_count: 1,
                total_size: 12,
            }),
            ..Default::default()
        };

        assert_eq!(
            listing_lines(&snapshot, false),
            ["img", "a.txt", "1 file, 1 directory, 12 B"]
        );

        let long = listing_lines(&snapshot, true);
        assert_eq!(long.len(), 6);
        assert_eq!(long[2], format!("{:>10}  {:<4}  img/", "", "dir"));
        assert_eq!(long[3], format!("{:>10}  {:<4}  a.txt", 12, "file"));
        assert_eq!(long[5], "1 file, 1 directory, 12 B");
    }
}
