use std::fs::{self, File};
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Compact timestamp used in run ids and manifest filenames.
pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create output directory {}", path.display()))
}

/// Streams a dump file through sha256 for the manifest source-hash entries.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open dump file {}", path.display()))?;

    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("failed to hash dump file {}", path.display()))?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Writes a newline-terminated pretty-JSON artifact, creating parent
/// directories as needed.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let mut data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    data.push(b'\n');

    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn sha256_file_is_stable_and_content_sensitive() {
        let dir = env::temp_dir().join("fakturpajak-util-hash");
        fs::create_dir_all(&dir).unwrap();
        let first = dir.join("fp-001.json");
        let second = dir.join("fp-002.json");
        fs::write(&first, br#"{"pages":[]}"#).unwrap();
        fs::write(&second, br#"{"pages":[{"text":"x","tables":[]}]}"#).unwrap();

        let digest = sha256_file(&first).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(digest, sha256_file(&first).unwrap());
        assert_ne!(digest, sha256_file(&second).unwrap());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn write_json_pretty_creates_parents_and_terminates_with_newline() {
        let dir = env::temp_dir().join("fakturpajak-util-json");
        let path = dir.join("nested").join("rows.json");

        write_json_pretty(&path, &vec![1, 2, 3]).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.ends_with('\n'));
        let parsed: Vec<u32> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);

        fs::remove_dir_all(&dir).ok();
    }
}
