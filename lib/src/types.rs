use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One provisioned machine, assembled from the aligned terraform outputs.
#[derive(Debug, Clone, Serialize)]
pub struct Machine {
    pub name: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
}

/// A single output payload in a materialized snapshot, mirroring the
/// `{"value": ...}` objects terraform writes.
#[derive(Debug, Deserialize)]
pub struct SnapshotEntry {
    pub value: serde_json::Value,
}

pub type SnapshotOutputs = HashMap<String, SnapshotEntry>;
