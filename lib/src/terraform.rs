use std::path::PathBuf;
use std::process::{Command, Stdio};

use execute::Execute;
use log::{debug, info};
use serde_json::Value;
use shellexpand::tilde;

use crate::error::OutputError;
use crate::types::{Machine, SnapshotOutputs};

pub const VM_NAMES: &str = "vm_names";
pub const VM_IDS: &str = "vm_ids";
pub const VM_IPS: &str = "vm_ips";

pub const DEFAULT_CHDIR: &str = "terraform";

/// Source of named terraform outputs.
///
/// The real implementation shells out to `terraform output` per fetch;
/// the snapshot implementation reads a materialized outputs file once.
/// Tests substitute canned values.
pub trait OutputProvider {
    fn output(&self, name: &str) -> Result<Value, OutputError>;
}

/// Fetches outputs by running `terraform -chdir=<dir> output -json <name>`.
pub struct TerraformCli {
    chdir: PathBuf,
}

impl TerraformCli {
    pub fn new(chdir: &str) -> Result<Self, OutputError> {
        let chdir = PathBuf::from(tilde(chdir).to_string());
        if !chdir.exists() {
            return Err(OutputError::MissingDir(chdir));
        }
        Ok(Self { chdir })
    }
}

impl OutputProvider for TerraformCli {
    fn output(&self, name: &str) -> Result<Value, OutputError> {
        let mut cmd = Command::new("terraform");
        cmd.arg(format!("-chdir={}", self.chdir.display()))
            .arg("output")
            .arg("-json")
            .arg(name);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        info!("run: {:?}", cmd);

        let output = cmd.execute_output()?;
        match output.status.code() {
            Some(0) => {}
            Some(_) => {
                return Err(OutputError::Backend {
                    name: name.to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                })
            }
            None => {
                return Err(OutputError::Backend {
                    name: name.to_string(),
                    stderr: "interrupted".to_string(),
                })
            }
        }

        serde_json::from_slice(&output.stdout).map_err(|source| OutputError::Decode {
            name: name.to_string(),
            source,
        })
    }
}

/// Serves outputs from a `terraform_outputs.json`-style file, an object
/// keyed by output name where each value wraps the payload.
pub struct Snapshot {
    outputs: SnapshotOutputs,
}

impl Snapshot {
    pub fn load(path: &str) -> Result<Self, OutputError> {
        let path = PathBuf::from(tilde(path).to_string());
        if !path.exists() {
            return Err(OutputError::MissingSnapshot(path));
        }
        debug!("loading outputs snapshot from {:?}", path);
        let raw = std::fs::read_to_string(&path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, OutputError> {
        let outputs = serde_json::from_str(raw).map_err(OutputError::DecodeSnapshot)?;
        Ok(Self { outputs })
    }
}

impl OutputProvider for Snapshot {
    fn output(&self, name: &str) -> Result<Value, OutputError> {
        self.outputs
            .get(name)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| OutputError::Missing {
                name: name.to_string(),
            })
    }
}

/// Fetch one required output as a non-empty list of scalars. Numbers keep
/// their JSON text form, strings are normalized.
pub fn string_list(provider: &dyn OutputProvider, name: &str) -> Result<Vec<String>, OutputError> {
    let items = match provider.output(name)? {
        Value::Array(items) => items,
        _ => {
            return Err(OutputError::NotAList {
                name: name.to_string(),
            })
        }
    };
    if items.is_empty() {
        return Err(OutputError::Empty {
            name: name.to_string(),
        });
    }

    let mut list = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::String(s) => list.push(normalize(&s)),
            Value::Number(n) => list.push(n.to_string()),
            _ => {
                return Err(OutputError::BadElement {
                    name: name.to_string(),
                    index,
                })
            }
        }
    }
    Ok(list)
}

/// Strip stray whitespace and quoting that sometimes survives in
/// terraform string outputs.
pub fn normalize(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

fn check_aligned(left: (&str, usize), right: (&str, usize)) -> Result<(), OutputError> {
    if left.1 != right.1 {
        return Err(OutputError::LengthMismatch {
            left: left.0.to_string(),
            left_len: left.1,
            right: right.0.to_string(),
            right_len: right.1,
        });
    }
    Ok(())
}

/// Fetch the machine outputs, check they describe a consistent set, and
/// zip them into records. Position `i` of each output refers to the same
/// machine.
pub fn machines(
    provider: &dyn OutputProvider,
    with_addresses: bool,
) -> Result<Vec<Machine>, OutputError> {
    let names = string_list(provider, VM_NAMES)?;
    let ids = string_list(provider, VM_IDS)?;
    check_aligned((VM_NAMES, names.len()), (VM_IDS, ids.len()))?;

    let addrs = if with_addresses {
        let addrs = string_list(provider, VM_IPS)?;
        check_aligned((VM_NAMES, names.len()), (VM_IPS, addrs.len()))?;
        Some(addrs)
    } else {
        None
    };

    let mut machines = Vec::with_capacity(names.len());
    for (i, (name, id)) in names.into_iter().zip(ids).enumerate() {
        machines.push(Machine {
            name,
            id,
            addr: addrs.as_ref().map(|addrs| addrs[i].clone()),
        });
    }
    Ok(machines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Canned(Value);

    impl OutputProvider for Canned {
        fn output(&self, name: &str) -> Result<Value, OutputError> {
            self.0
                .get(name)
                .cloned()
                .ok_or_else(|| OutputError::Missing {
                    name: name.to_string(),
                })
        }
    }

    #[test]
    fn test_machines_zips_aligned_outputs() {
        let provider = Canned(json!({
            "vm_names": ["ctrl-plane", "worker-1"],
            "vm_ids": ["100", "101"],
            "vm_ips": ["10.0.0.5", "10.0.0.6"],
        }));

        let machines = machines(&provider, true).unwrap();
        assert_eq!(machines.len(), 2);
        assert_eq!(machines[0].name, "ctrl-plane");
        assert_eq!(machines[0].id, "100");
        assert_eq!(machines[0].addr.as_deref(), Some("10.0.0.5"));
        assert_eq!(machines[1].name, "worker-1");
        assert_eq!(machines[1].addr.as_deref(), Some("10.0.0.6"));
    }

    #[test]
    fn test_numeric_ids_keep_their_text_form() {
        let provider = Canned(json!({
            "vm_names": ["ctrl-plane"],
            "vm_ids": [100],
        }));

        let machines = machines(&provider, false).unwrap();
        assert_eq!(machines[0].id, "100");
    }

    #[test]
    fn test_address_output_is_skipped_when_not_required() {
        let provider = Canned(json!({
            "vm_names": ["ctrl-plane"],
            "vm_ids": ["100"],
        }));

        let machines = machines(&provider, false).unwrap();
        assert_eq!(machines[0].addr, None);
    }

    #[test]
    fn test_scalar_output_is_rejected() {
        let provider = Canned(json!({
            "vm_names": "ctrl-plane",
            "vm_ids": ["100"],
        }));

        let err = machines(&provider, false).unwrap_err();
        assert_eq!(err.to_string(), "output 'vm_names' is not a list");
    }

    #[test]
    fn test_empty_output_is_rejected() {
        let provider = Canned(json!({
            "vm_names": [],
            "vm_ids": ["100"],
        }));

        let err = machines(&provider, false).unwrap_err();
        assert_eq!(err.to_string(), "output 'vm_names' is empty");
    }

    #[test]
    fn test_mismatch_reports_both_lengths() {
        let provider = Canned(json!({
            "vm_names": ["a", "b", "c"],
            "vm_ids": ["100", "101"],
        }));

        let err = machines(&provider, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "output 'vm_names' has 3 entries but 'vm_ids' has 2"
        );
    }

    #[test]
    fn test_non_scalar_element_is_rejected() {
        let provider = Canned(json!({
            "vm_names": ["a", ["b"]],
            "vm_ids": ["100", "101"],
        }));

        let err = machines(&provider, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "output 'vm_names' has a non-scalar element at position 1"
        );
    }

    #[test]
    fn test_snapshot_serves_wrapped_values() {
        let snapshot = Snapshot::parse(
            r#"{"vm_names": {"value": ["ctrl-plane"]}, "vm_ids": {"value": [100]}}"#,
        )
        .unwrap();

        let machines = machines(&snapshot, false).unwrap();
        assert_eq!(machines[0].name, "ctrl-plane");
        assert_eq!(machines[0].id, "100");
    }

    #[test]
    fn test_snapshot_missing_key_is_an_error() {
        let snapshot = Snapshot::parse(r#"{"vm_names": {"value": ["ctrl-plane"]}}"#).unwrap();

        let err = machines(&snapshot, false).unwrap_err();
        assert_eq!(err.to_string(), "output 'vm_ids' missing from snapshot");
    }

    #[test]
    fn test_snapshot_garbage_is_an_error() {
        assert!(Snapshot::parse("not json").is_err());
    }

    #[test]
    fn test_normalize_strips_quotes_and_whitespace() {
        assert_eq!(normalize(" \"10.0.0.5\" "), "10.0.0.5");
        assert_eq!(normalize("'worker-1'"), "worker-1");
        assert_eq!(normalize("plain"), "plain");
    }
}
