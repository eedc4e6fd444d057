use shardlink_core::StorageError;
use thiserror::Error;

/// Every shard that failed to close during shutdown, with the reason.
#[derive(Debug, Clone, Error)]
#[error("failed to close {} shard(s){}", .failures.len(), list_failures(.failures))]
pub struct CloseError {
    pub failures: Vec<(String, StorageError)>,
}

fn list_failures(failures: &[(String, StorageError)]) -> String {
    failures
        .iter()
        .map(|(shard, err)| format!("; {shard}: {err}"))
        .collect()
}
