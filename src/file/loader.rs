//! Response body loading.
//!
//! Bodies are read from a file or stdin, gunzipped when needed, size-checked,
//! and parsed into a `DataValue`. JSON, YAML and JSON Lines are supported.

use crate::document::parser::{from_json_value, parse_json, parse_yaml};
use crate::document::DataValue;
use anyhow::{Context, Result};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Body encodings the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
    /// One JSON value per line, loaded as a sequence
    Jsonl,
}

impl InputFormat {
    /// Picks a format from the file name, ignoring a trailing `.gz`.
    ///
    /// - `data.jsonl.gz` → `Jsonl`
    /// - `data.yml` → `Yaml`
    /// - `data.txt` → `None`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = path.as_ref().to_string_lossy().to_lowercase();
        let base = name.strip_suffix(".gz").unwrap_or(&name);

        if base.ends_with(".jsonl") || base.ends_with(".ndjson") {
            Some(InputFormat::Jsonl)
        } else if base.ends_with(".json") {
            Some(InputFormat::Json)
        } else if base.ends_with(".yaml") || base.ends_with(".yml") {
            Some(InputFormat::Yaml)
        } else {
            None
        }
    }
}

/// Loads and parses a response body from the filesystem.
///
/// # Examples
///
/// ```no_run
/// use respdiff::file::loader::load_data_file;
///
/// let body = load_data_file("response.json", 1 << 20).unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file cannot be read
/// - The file (or its decompressed contents) exceeds `max_bytes`
/// - The contents are not valid in the detected format
pub fn load_data_file<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<DataValue> {
    let path = path.as_ref();

    let size = fs::metadata(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .len();
    check_size(size, max_bytes)?;

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content = decode(bytes, max_bytes)?;

    parse_content(&content, InputFormat::from_path(path))
        .with_context(|| format!("Failed to load {}", path.display()))
}

/// Loads and parses a response body from standard input.
///
/// The format is detected from the content: JSON first, then JSON Lines,
/// then YAML.
pub fn load_data_from_stdin(max_bytes: u64) -> Result<DataValue> {
    let mut buffer = Vec::new();
    std::io::stdin()
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;
    check_size(buffer.len() as u64, max_bytes)?;

    let content = decode(buffer, max_bytes)?;
    parse_content(&content, None).context("Failed to parse stdin")
}

/// Parses `content` in `format`, or detects the format when `None`.
pub fn parse_content(content: &str, format: Option<InputFormat>) -> Result<DataValue> {
    match format {
        Some(InputFormat::Json) => parse_json(content),
        Some(InputFormat::Yaml) => parse_yaml(content),
        Some(InputFormat::Jsonl) => parse_jsonl_content(content),
        None => parse_json(content)
            .or_else(|_| parse_jsonl_content(content))
            .or_else(|_| parse_yaml(content))
            .context("Input is neither valid JSON, JSON Lines nor YAML"),
    }
}

/// Parses newline-delimited JSON into a sequence, one element per line.
///
/// Blank lines are skipped.
pub fn parse_jsonl_content(content: &str) -> Result<DataValue> {
    let mut lines = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let value: serde_json::Value = serde_json::from_str(line)
            .with_context(|| format!("Invalid JSON on line {}", line_num + 1))?;
        lines.push(from_json_value(&value));
    }

    if lines.is_empty() {
        anyhow::bail!("No valid JSON found in JSONL content");
    }

    Ok(DataValue::Seq(lines))
}

fn check_size(size: u64, max_bytes: u64) -> Result<()> {
    if size > max_bytes {
        anyhow::bail!("Input is {} bytes, over the {} byte limit", size, max_bytes);
    }
    Ok(())
}

/// Gunzips `bytes` if they carry the gzip magic, then checks UTF-8.
fn decode(bytes: Vec<u8>, max_bytes: u64) -> Result<String> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return String::from_utf8(bytes).context("Input is not valid UTF-8");
    }

    use flate2::read::GzDecoder;

    let mut content = String::new();
    GzDecoder::new(&bytes[..])
        .take(max_bytes.saturating_add(1))
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped input - data may be corrupted")?;
    check_size(content.len() as u64, max_bytes)?;
    Ok(content)
}
