use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let raw = fs_err::read_to_string(path)?;
    let obj: T = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))?;
    Ok(obj)
}
