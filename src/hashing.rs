//! Hashing System - SHA-256 Fingerprints
//!
//! A snapshot hash identifies exactly which tree content a report was issued
//! against; a report hash identifies the findings themselves.

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Value, to_string};

use crate::tree::VirtualFileTree;
use crate::validation::ValidationReport;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let sorted = sort_value(&v);
    to_string(&sorted)
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let sorted_map: serde_json::Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_value(v)))
                .collect();
            Value::Object(sorted_map)
        }
        Value::Array(arr) => {
            Value::Array(arr.iter().map(sort_value).collect())
        }
        _ => v.clone()
    }
}

#[derive(Serialize)]
struct SnapshotEntry<'a> {
    path: &'a str,
    content: &'a str,
}

/// Hash of every (path, content) pair in path order.
/// Revision counters and creation order do not contribute.
pub fn compute_snapshot_hash(tree: &VirtualFileTree) -> Result<String, serde_json::Error> {
    let entries: Vec<SnapshotEntry> = tree
        .list_all()
        .into_iter()
        .map(|f| SnapshotEntry {
            path: &f.path,
            content: &f.content,
        })
        .collect();
    let canonical = canonical_json(&entries)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// report_hash = sha256(snapshot_hash + policy_id + canonical findings)
pub fn compute_report_hash(
    snapshot_hash: &str,
    policy_id: &str,
    report: &ValidationReport,
) -> Result<String, serde_json::Error> {
    let canonical_findings = canonical_json(report)?;
    let combined = format!("{}:{}:{}", snapshot_hash, policy_id, canonical_findings);
    Ok(sha256_hex(combined.as_bytes()))
}
