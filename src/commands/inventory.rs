use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::model::{DocumentDump, DumpEntry, DumpInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.input_root)?;

    if args.dry_run {
        info!(
            document_count = manifest.document_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.input_root.join("manifests").join("dump_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(document_count = manifest.document_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(input_root: &Path) -> Result<DumpInventoryManifest> {
    let mut dump_paths = discover_dumps(input_root)?;
    dump_paths.sort();

    if dump_paths.is_empty() {
        bail!("no document dumps found in {}", input_root.display());
    }

    let mut documents = Vec::with_capacity(dump_paths.len());
    for path in dump_paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let sha256 = sha256_file(&path)?;
        let page_count = match read_dump(&path) {
            Ok(dump) => dump.pages.len(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "dump is not readable as a document");
                0
            }
        };

        documents.push(DumpEntry {
            filename,
            sha256,
            page_count,
        });
    }

    Ok(DumpInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: input_root.display().to_string(),
        document_count: documents.len(),
        documents,
    })
}

pub fn discover_dumps(input_root: &Path) -> Result<Vec<PathBuf>> {
    let mut dumps = Vec::new();

    let entries = fs::read_dir(input_root)
        .with_context(|| format!("failed to read {}", input_root.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", input_root.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_dump = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_dump {
            dumps.push(path);
        }
    }

    Ok(dumps)
}

pub fn read_dump(path: &Path) -> Result<DocumentDump> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let dump: DocumentDump = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(dump)
}
