//! Folder ingestion and XML validation pipeline.
//!
//! Coordinates one scan: directory check → top-level enumeration →
//! `.xml` filter → per-file validation and classification → aggregation
//! into a [`FolderRecord`].
//!
//! Only the immediate children of the folder are considered and files keep
//! the order in which the filesystem lists them. Per-file validation runs
//! concurrently; a failure on one file is recorded on that file's record and
//! never aborts the scan. A failure to read the directory itself is logged
//! and yields an empty record so callers always get something usable.
//!
//! The pipeline never writes to the filesystem and does not enforce the
//! sandbox; callers validate paths with [`crate::sandbox`] first.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

use accobot_core::models::{FolderRecord, XmlFileRecord};

use crate::classify::classify;
use crate::config::Config;
use crate::error::IngestError;
use crate::sandbox;
use crate::xml;

/// Files larger than this are reported invalid without being parsed.
pub const MAX_XML_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Fails when `path` is missing, unreadable, or not a directory.
pub async fn check_directory(path: &Path) -> Result<(), IngestError> {
    let metadata = fs::metadata(path).await.map_err(|source| IngestError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(IngestError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

pub async fn scan_folder(path: &Path) -> FolderRecord {
    let scanned_at = Utc::now();
    let folder = path.display().to_string();

    let candidates = match list_xml_candidates(path).await {
        Ok(candidates) => candidates,
        Err(e) => {
            error!(path = %folder, error = %e, "folder scan failed; returning empty result");
            return FolderRecord::empty(folder, scanned_at);
        }
    };

    let files = join_all(
        candidates
            .iter()
            .map(|candidate| validate_file(candidate, scanned_at)),
    )
    .await;

    let record = FolderRecord::new(folder, files, scanned_at);
    info!(
        path = %record.path(),
        files = record.files().len(),
        valid = record.valid_count(),
        invalid = record.invalid_count(),
        "folder scanned"
    );
    record
}

/// Case-insensitive `.xml` extension check.
pub fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

/// Top-level `.xml` entries in listing order. Entries that are not regular
/// files are skipped; entries whose metadata cannot be read are kept so the
/// access failure shows up on their record.
async fn list_xml_candidates(path: &Path) -> Result<Vec<PathBuf>, IngestError> {
    check_directory(path).await?;

    let not_found = |source| IngestError::NotFound {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(path).await.map_err(not_found)?;
    let mut candidates = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(not_found)? {
        let entry_path = entry.path();
        if !has_xml_extension(&entry_path) {
            continue;
        }
        match fs::metadata(&entry_path).await {
            Ok(metadata) if metadata.is_file() => candidates.push(entry_path),
            Ok(_) => debug!(path = %entry_path.display(), "skipping non-file entry"),
            Err(_) => candidates.push(entry_path),
        }
    }
    Ok(candidates)
}

/// Read, parse, and classify a single file.
pub async fn validate_file(path: &Path, scanned_at: DateTime<Utc>) -> XmlFileRecord {
    let file_path = path.display().to_string();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let metadata = match fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) => return access_failure(file_path, file_name, scanned_at, e),
    };
    let size = metadata.len();
    let modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or(scanned_at);

    if size > MAX_XML_FILE_BYTES {
        warn!(file = %file_path, size, "file exceeds validation size limit");
        return XmlFileRecord::invalid(
            file_path,
            file_name,
            size,
            modified,
            format!(
                "File too large to validate ({} bytes, limit {} bytes)",
                size, MAX_XML_FILE_BYTES
            ),
        );
    }

    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => return access_failure(file_path, file_name, scanned_at, e),
    };

    match xml::parse_bytes(&bytes) {
        Ok(root) => {
            let classification = classify(&root);
            let mut record = XmlFileRecord::valid(file_path, file_name, size, modified);
            record.document_type = classification.document_type;
            record.period = classification.period;
            record.company = classification.company;
            record
        }
        Err(e) => {
            warn!(file = %file_path, error = %e, "xml parsing failed");
            XmlFileRecord::invalid(
                file_path,
                file_name,
                size,
                modified,
                format!("XML parsing failed: {}", e),
            )
        }
    }
}

fn access_failure(
    file_path: String,
    file_name: String,
    scanned_at: DateTime<Utc>,
    err: std::io::Error,
) -> XmlFileRecord {
    warn!(file = %file_path, error = %err, "file access failed");
    XmlFileRecord::invalid(
        file_path,
        file_name,
        0,
        scanned_at,
        format!("File access failed: {}", err),
    )
}

/// CLI entry point for `accobot scan`.
pub async fn run_scan(config: &Config, raw_path: &str, json: bool) -> Result<()> {
    let path = sandbox::validate_path_request(raw_path, &config.sandbox.root)?;
    check_directory(&path).await?;
    let record = scan_folder(&path).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!(
        "scan {} ({})",
        record.path(),
        record.scanned_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  xml files: {} (valid: {}, invalid: {})",
        record.files().len(),
        record.valid_count(),
        record.invalid_count()
    );
    if record.files().is_empty() {
        return Ok(());
    }
    println!();
    println!(
        "{:<32} {:<7} {:<20} {:<12} COMPANY",
        "FILE", "VALID", "TYPE", "PERIOD"
    );
    for file in record.files() {
        println!(
            "{:<32} {:<7} {:<20} {:<12} {}",
            file.file_name,
            if file.is_valid { "yes" } else { "no" },
            file.document_type.as_deref().unwrap_or("-"),
            file.period.as_deref().unwrap_or("-"),
            file.company.as_deref().unwrap_or("-"),
        );
        for err in file.errors.iter().flatten() {
            println!("    ! {}", err);
        }
    }

    Ok(())
}
