use crate::store::{DataStore, DbPath};
use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const TREE_ENTRY: &str = "data/tree.json";
pub const BUNDLE_FORMAT_V1: &str = "resultsd-tree-v1";
pub const PLAIN_JSON_FORMAT: &str = "plain-json";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub top_level_keys: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub top_level_keys: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

pub fn export_bundle(store: &dyn DataStore, out_path: &Path) -> anyhow::Result<ExportSummary> {
    let tree = store
        .get(&DbPath::root())
        .context("failed to read data tree")?;
    let top_level_keys = tree.as_object().map(|o| o.len()).unwrap_or(0);
    let tree_bytes = serde_json::to_vec_pretty(&tree).context("failed to serialize data tree")?;

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "treeSha256": sha256_hex(&tree_bytes),
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(TREE_ENTRY, opts)
        .context("failed to start tree entry")?;
    zip.write_all(&tree_bytes)
        .context("failed to write tree entry")?;

    zip.finish().context("failed to finalize zip bundle")?;
    info!(out = %out_path.to_string_lossy(), top_level_keys, "bundle exported");

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2,
        top_level_keys,
    })
}

/// Replaces the whole tree with the bundle's content. A file that is not a
/// zip archive is read as a plain JSON tree.
pub fn import_bundle(store: &dyn DataStore, in_path: &Path) -> anyhow::Result<ImportSummary> {
    let (format, tree_bytes) = if is_zip_file(in_path)? {
        (BUNDLE_FORMAT_V1, read_zip_tree(in_path)?)
    } else {
        let bytes = std::fs::read(in_path)
            .with_context(|| format!("failed to read {}", in_path.to_string_lossy()))?;
        (PLAIN_JSON_FORMAT, bytes)
    };

    let tree: serde_json::Value =
        serde_json::from_slice(&tree_bytes).context("tree is invalid JSON")?;
    if !(tree.is_object() || tree.is_null()) {
        return Err(anyhow!("tree root must be a JSON object"));
    }
    let top_level_keys = tree.as_object().map(|o| o.len()).unwrap_or(0);
    store
        .set(&DbPath::root(), tree)
        .context("failed to write data tree")?;
    info!(format, top_level_keys, "bundle imported");

    Ok(ImportSummary {
        bundle_format_detected: format.to_string(),
        top_level_keys,
    })
}

fn read_zip_tree(in_path: &Path) -> anyhow::Result<Vec<u8>> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let mut tree_bytes = Vec::new();
    archive
        .by_name(TREE_ENTRY)
        .context("bundle missing data/tree.json")?
        .read_to_end(&mut tree_bytes)
        .context("failed to extract tree entry")?;

    let expected = manifest
        .get("treeSha256")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if sha256_hex(&tree_bytes) != expected {
        return Err(anyhow!("tree checksum mismatch"));
    }
    Ok(tree_bytes)
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
