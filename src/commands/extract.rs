use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::ExtractArgs;
use crate::commands::inventory::{discover_dumps, read_dump};
use crate::model::{
    DocumentResult, DumpEntry, ExtractCounts, ExtractPaths, ExtractRunManifest, LineItem,
    ToolVersions,
};
use crate::patterns::InvoicePatterns;
use crate::pipeline::process_document;
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
};

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let out_dir = args.out_dir.clone();
    ensure_directory(&out_dir)?;

    let run_manifest_path = args
        .run_manifest_path
        .clone()
        .unwrap_or_else(|| out_dir.join(format!("extract_run_{}.json", utc_compact_string(started_ts))));
    let rows_path = args
        .rows_path
        .clone()
        .unwrap_or_else(|| out_dir.join("rows.json"));

    info!(out_dir = %out_dir.display(), run_id = %run_id, "starting extract");

    let dump_paths = gather_inputs(&args)?;
    let patterns = InvoicePatterns::new()?;

    let mut counts = ExtractCounts {
        documents_total: dump_paths.len(),
        ..ExtractCounts::default()
    };
    let mut source_hashes = Vec::new();
    let mut warnings = Vec::new();
    let mut all_rows: Vec<LineItem> = Vec::new();

    for path in &dump_paths {
        // One bad document never aborts its siblings in the batch.
        match process_one(&patterns, path, &out_dir) {
            Ok((entry, result)) => {
                counts.documents_processed += 1;
                counts.items_total += result.actual_item_count;
                counts.unparsed_total += result.unparsed.len();

                record_document_warnings(&entry.filename, &result, &mut warnings);
                if result.count_mismatch {
                    counts.count_mismatch_documents += 1;
                }

                all_rows.extend(result.items);
                source_hashes.push(entry);
            }
            Err(err) => {
                counts.documents_failed += 1;
                let warning = format!("failed to process {}: {err:#}", path.display());
                warn!(warning = %warning, "document failed");
                warnings.push(warning);
            }
        }
    }

    write_json_pretty(&rows_path, &all_rows)?;
    info!(path = %rows_path.display(), rows = all_rows.len(), "wrote combined rows");

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_extract_command(&args),
        tool_versions: collect_tool_versions()?,
        paths: ExtractPaths {
            input_root: args.input_root.display().to_string(),
            out_dir: out_dir.display().to_string(),
            run_manifest_path: run_manifest_path.display().to_string(),
            rows_path: rows_path.display().to_string(),
        },
        counts,
        source_hashes,
        warnings,
        notes: vec![
            "One result JSON per document dump; rows.json concatenates line items in batch order."
                .to_string(),
            "Unparsed block text is kept verbatim in each document result for manual review."
                .to_string(),
        ],
    };

    write_json_pretty(&run_manifest_path, &manifest)?;

    info!(path = %run_manifest_path.display(), "wrote extract run manifest");
    info!(
        documents = manifest.counts.documents_processed,
        failed = manifest.counts.documents_failed,
        items = manifest.counts.items_total,
        unparsed = manifest.counts.unparsed_total,
        "extract completed"
    );

    Ok(())
}

fn gather_inputs(args: &ExtractArgs) -> Result<Vec<PathBuf>> {
    if !args.inputs.is_empty() {
        return Ok(args.inputs.clone());
    }

    let mut dump_paths = discover_dumps(&args.input_root)?;
    dump_paths.sort();

    if dump_paths.is_empty() {
        bail!("no document dumps found in {}", args.input_root.display());
    }

    Ok(dump_paths)
}

fn process_one(
    patterns: &InvoicePatterns,
    path: &Path,
    out_dir: &Path,
) -> Result<(DumpEntry, DocumentResult)> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

    let sha256 = sha256_file(path)?;
    let dump = read_dump(path)?;

    let result = process_document(patterns, &dump);

    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("document");
    let result_path = out_dir.join(format!("{stem}.result.json"));
    write_json_pretty(&result_path, &result)?;

    info!(
        path = %result_path.display(),
        items = result.actual_item_count,
        unparsed = result.unparsed.len(),
        expected = result.expected_item_count,
        "wrote document result"
    );

    let entry = DumpEntry {
        filename,
        sha256,
        page_count: dump.pages.len(),
    };

    Ok((entry, result))
}

fn record_document_warnings(filename: &str, result: &DocumentResult, warnings: &mut Vec<String>) {
    if result.count_mismatch {
        let warning = format!(
            "item count mismatch in {}: expected {}, found {}",
            filename, result.expected_item_count, result.actual_item_count
        );
        warn!(warning = %warning, "count mismatch");
        warnings.push(warning);
    }

    for block in &result.unparsed {
        let warning = format!("unparsed block in {}: {}", filename, truncate(&block.text, 160));
        warn!(warning = %warning, "unparsed block");
        warnings.push(warning);
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let prefix: String = text.chars().take(max_chars).collect();
    format!("{prefix}…")
}

fn collect_tool_versions() -> Result<ToolVersions> {
    Ok(ToolVersions {
        rustc: command_version("rustc", &["--version"])?,
        cargo: command_version("cargo", &["--version"])?,
    })
}

fn command_version(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to run {} {}", program, args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{} {} failed: {}", program, args.join(" "), stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version_line = stdout
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unwrap_or("unknown");

    Ok(version_line.to_string())
}

fn render_extract_command(args: &ExtractArgs) -> String {
    let mut command = vec![
        "fakturpajak".to_string(),
        "extract".to_string(),
        "--input-root".to_string(),
        args.input_root.display().to_string(),
        "--out-dir".to_string(),
        args.out_dir.display().to_string(),
    ];

    for input in &args.inputs {
        command.push("--input".to_string());
        command.push(input.display().to_string());
    }
    if let Some(path) = &args.run_manifest_path {
        command.push("--run-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.rows_path {
        command.push("--rows-path".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}
