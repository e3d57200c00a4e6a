//! Flat little-endian array files for the composition table, the policy and
//! the state values.

use std::path::Path;

use crate::error::{BjError, BjResult};

pub fn write_f64s(path: &Path, values: &[f64]) -> BjResult<()> {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    write_bytes(path, &bytes)
}

pub fn read_f64s(path: &Path) -> BjResult<Vec<f64>> {
    let bytes = std::fs::read(path)?;
    if bytes.len() % 8 != 0 {
        return Err(BjError::InvalidValue(format!(
            "{} is not an f64 array ({} bytes)",
            path.display(),
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect())
}

pub fn write_u8s(path: &Path, values: &[u8]) -> BjResult<()> {
    write_bytes(path, values)
}

pub fn read_u8s(path: &Path) -> BjResult<Vec<u8>> {
    Ok(std::fs::read(path)?)
}

fn write_bytes(path: &Path, bytes: &[u8]) -> BjResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
