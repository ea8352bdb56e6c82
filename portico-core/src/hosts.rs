use crate::error::GatewayError;
use std::path::Path;
use tracing::warn;

/// One stanza of the startup host list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub url: String,
    pub label: String,
}

/// Parse the host-list format:
///
/// ```text
/// [host "https://example.com/api"]
/// label = example
/// ```
///
/// One route is registered per stanza. Stanzas without a label are skipped
/// with a warning rather than failing the whole file.
pub fn parse_hosts(input: &str) -> Result<Vec<HostEntry>, GatewayError> {
    let mut entries = Vec::new();
    let mut current_url: Option<String> = None;
    let mut current_label: Option<String> = None;

    for (lineno, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            flush_stanza(&mut entries, current_url.take(), current_label.take());
            current_url = Some(parse_section(line, lineno + 1)?);
        } else if let Some((key, value)) = line.split_once('=') {
            if key.trim() == "label" {
                current_label = Some(value.trim().to_string());
            }
        } else {
            return Err(GatewayError::ConfigError(format!(
                "hosts file line {}: expected `key = value`, got `{line}`",
                lineno + 1
            )));
        }
    }
    flush_stanza(&mut entries, current_url, current_label);

    Ok(entries)
}

/// Read and parse a host-list file.
pub fn load_hosts(path: &Path) -> Result<Vec<HostEntry>, GatewayError> {
    let input = std::fs::read_to_string(path)?;
    parse_hosts(&input)
}

fn parse_section(line: &str, lineno: usize) -> Result<String, GatewayError> {
    let inner = line
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| {
            GatewayError::ConfigError(format!("hosts file line {lineno}: unterminated section"))
        })?;
    let url = inner
        .strip_prefix("host")
        .map(str::trim)
        .and_then(|s| s.strip_prefix('"'))
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| {
            GatewayError::ConfigError(format!(
                "hosts file line {lineno}: expected `[host \"<url>\"]`"
            ))
        })?;
    Ok(url.to_string())
}

fn flush_stanza(entries: &mut Vec<HostEntry>, url: Option<String>, label: Option<String>) {
    match (url, label) {
        (Some(url), Some(label)) => entries.push(HostEntry { url, label }),
        (Some(url), None) => warn!(url = %url, "host stanza without a label, skipping"),
        _ => {}
    }
}
