//! JSON emission helpers
//!
//! Every file the engine writes (model sidecars, run records, evaluations,
//! footprints, metrics) uses 4-space-indented JSON. Keep the format in one
//! place so the on-disk contract cannot drift between writers.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Serialize `value` as JSON indented with 4 spaces.
pub fn to_string_pretty4<T: Serialize>(value: &T) -> Result<String> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .context("Failed to serialize value to JSON")?;
    String::from_utf8(out).context("Serialized JSON was not valid UTF-8")
}
