//! Rendering and saving transformed bodies.
//!
//! Values are rendered through serde as JSON or YAML. Saving is atomic: the
//! rendered text goes to a temp file next to the target, which is then
//! renamed into place.

use crate::config::OutputFormat;
use crate::document::DataValue;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Renders `value` as text.
///
/// `pretty` indents JSON output; YAML is always block style. The result
/// ends with a newline.
///
/// # Examples
///
/// ```
/// use respdiff::config::OutputFormat;
/// use respdiff::document::parser::parse_json;
/// use respdiff::file::saver::render_data;
///
/// let value = parse_json(r#"{"a": [1, 2]}"#).unwrap();
/// let text = render_data(&value, OutputFormat::Json, false).unwrap();
/// assert_eq!(text, "{\"a\":[1,2]}\n");
/// ```
pub fn render_data(value: &DataValue, format: OutputFormat, pretty: bool) -> Result<String> {
    let mut text = match format {
        OutputFormat::Json if pretty => {
            serde_json::to_string_pretty(value).context("Failed to render JSON")?
        }
        OutputFormat::Json => serde_json::to_string(value).context("Failed to render JSON")?,
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to render YAML")?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Renders `value` and writes it to `path` atomically.
///
/// A target name ending in `.gz` is written gzip-compressed.
///
/// # Errors
///
/// This function will return an error if:
/// - Rendering fails
/// - Writing the temp file fails
/// - Renaming the temp file to the target fails
pub fn save_data<P: AsRef<Path>>(
    path: P,
    value: &DataValue,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    let path = path.as_ref();
    let compress = path.to_string_lossy().ends_with(".gz");
    let text = render_data(value, format, pretty)?;
    write_file_atomic(path, text.as_bytes(), compress)
}

/// Writes data to a temp file, optionally gzip-compressed, then renames it
/// over `path`.
fn write_file_atomic(path: &Path, data: &[u8], compress: bool) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let temp_path = path.with_extension("tmp");

    if compress {
        let file = fs::File::create(&temp_path).context("Failed to create temp file")?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data)
            .context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?;
    } else {
        fs::write(&temp_path, data).context("Failed to write temp file")?;
    }

    fs::rename(&temp_path, path).context("Failed to rename temp file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_json;

    #[test]
    fn test_render_pretty_json() {
        let value = parse_json(r#"{"a": 1}"#).unwrap();
        let text = render_data(&value, OutputFormat::Json, true).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn test_render_yaml() {
        let value = parse_json(r#"{"a": [1, "x"]}"#).unwrap();
        let text = render_data(&value, OutputFormat::Yaml, true).unwrap();
        assert_eq!(text, "a:\n- 1\n- x\n");
    }

    #[test]
    fn test_render_keeps_key_order() {
        let value = parse_json(r#"{"z": 1, "a": 2}"#).unwrap();
        let text = render_data(&value, OutputFormat::Json, false).unwrap();
        assert_eq!(text, "{\"z\":1,\"a\":2}\n");
    }
}
