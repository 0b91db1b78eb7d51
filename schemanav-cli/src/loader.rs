//! Reading schemas and parse configurations from disk.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use schemanav::{ParseConfig, Value};

/// A root schema given as `NAME=FILE` or plain `FILE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSchema {
    pub name: String,
    pub path: PathBuf,
}

/// Parses a `--schema` argument. A plain file is named after its stem.
pub fn parse_named_schema(arg: &str) -> Result<NamedSchema, String> {
    let (name, path) = match arg.split_once('=') {
        Some((name, path)) => (name.to_string(), PathBuf::from(path)),
        None => {
            let path = PathBuf::from(arg);
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default();
            (name, path)
        }
    };
    if name.is_empty() || path.as_os_str().is_empty() {
        return Err(format!("expected `NAME=FILE` or `FILE`, got `{arg}`"));
    }
    Ok(NamedSchema { name, path })
}

/// Parses `content` according to the file extension `ext`.
pub fn parse_value(content: &str, ext: &str) -> Result<Value> {
    let value = match ext {
        "json" => serde_json::from_str(content)?,
        "toml" => {
            let v: toml::Value = toml::from_str(content)?;
            serde_json::to_value(v)?
        }
        _ => bail!("unsupported file extension: {ext:?}"),
    };
    Ok(value)
}

/// Reads a `.json` or `.toml` file into a JSON value.
pub fn load_value(path: &Path) -> Result<Value> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_value(&content, ext).with_context(|| format!("Failed to parse {}", path.display()))
}

/// The parse configuration stored at `path`, or the default one.
pub fn load_config(path: Option<&Path>) -> Result<ParseConfig> {
    let Some(path) = path else {
        return Ok(ParseConfig::default());
    };
    let value = load_value(path)?;
    let config = serde_json::from_value(value)
        .with_context(|| format!("Invalid parse configuration in {}", path.display()))?;
    debug!("parse configuration: {config:?}");
    Ok(config)
}
