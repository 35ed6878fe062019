//! Sync-operation store port: the durable audit trail for scan/reconcile/
//! startup runs. Rows are inserted running and updated exactly once.

use async_trait::async_trait;
use lumilio_model::sync::SyncOperation;
use lumilio_model::Result;
use uuid::Uuid;

#[async_trait]
pub trait SyncOperationStore: Send + Sync {
    async fn start(&self, operation: SyncOperation) -> Result<()>;

    async fn finish(&self, operation: SyncOperation) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<SyncOperation>>;
}
