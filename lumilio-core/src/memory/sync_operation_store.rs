//! In-memory [`SyncOperationStore`]: keyed by operation id, inserted
//! running and updated exactly once per the port's contract.

use std::collections::HashMap;

use async_trait::async_trait;
use lumilio_model::sync::SyncOperation;
use lumilio_model::Result;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::ports::SyncOperationStore;

#[derive(Default)]
pub struct MemorySyncOperationStore {
    operations: Mutex<HashMap<Uuid, SyncOperation>>,
}

impl MemorySyncOperationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncOperationStore for MemorySyncOperationStore {
    async fn start(&self, operation: SyncOperation) -> Result<()> {
        self.operations.lock().await.insert(operation.id, operation);
        Ok(())
    }

    async fn finish(&self, operation: SyncOperation) -> Result<()> {
        self.operations.lock().await.insert(operation.id, operation);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SyncOperation>> {
        Ok(self.operations.lock().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumilio_model::ids::RepoID;
    use lumilio_model::sync::{SyncOperationStatus, SyncOperationType};

    #[tokio::test]
    async fn finish_replaces_the_running_row() {
        let store = MemorySyncOperationStore::new();
        let mut op = SyncOperation::start(RepoID::new(), SyncOperationType::Reconciliation);
        let id = op.id;
        store.start(op.clone()).await.unwrap();

        op.status = SyncOperationStatus::Completed;
        op.files_scanned = 42;
        store.finish(op).await.unwrap();

        let fetched = store.get(id).await.unwrap().unwrap();
        assert!(matches!(fetched.status, SyncOperationStatus::Completed));
        assert_eq!(fetched.files_scanned, 42);
    }
}
