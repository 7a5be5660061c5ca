use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between `terraform output` and the
/// rendered text. Each variant formats to the single diagnostic line
/// shown to the user.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("terraform directory not found: {0}")]
    MissingDir(PathBuf),
    #[error("outputs snapshot not found: {0}")]
    MissingSnapshot(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("terraform output '{name}' failed: {stderr}")]
    Backend { name: String, stderr: String },
    #[error("terraform output '{name}' is not valid JSON: {source}")]
    Decode {
        name: String,
        source: serde_json::Error,
    },
    #[error("outputs snapshot is not valid JSON: {0}")]
    DecodeSnapshot(serde_json::Error),
    #[error("output '{name}' missing from snapshot")]
    Missing { name: String },
    #[error("output '{name}' is not a list")]
    NotAList { name: String },
    #[error("output '{name}' is empty")]
    Empty { name: String },
    #[error("output '{name}' has a non-scalar element at position {index}")]
    BadElement { name: String, index: usize },
    #[error("output '{left}' has {left_len} entries but '{right}' has {right_len}")]
    LengthMismatch {
        left: String,
        left_len: usize,
        right: String,
        right_len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::OutputError;

    // The mismatch diagnostic must name both observed lengths, not just
    // say "mismatch".
    #[test]
    fn test_length_mismatch_message() {
        let err = OutputError::LengthMismatch {
            left: "vm_names".to_string(),
            left_len: 3,
            right: "vm_ids".to_string(),
            right_len: 2,
        };
        assert_eq!(
            err.to_string(),
            "output 'vm_names' has 3 entries but 'vm_ids' has 2"
        );
    }
}
