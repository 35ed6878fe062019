//! Job-producer port: the write side of the external queue collaborator.
//! The core never implements the durable queue itself — it only needs to
//! push a serialized payload onto a named queue and let the runtime's own
//! concurrency/retry policy take it from there.

use async_trait::async_trait;
use lumilio_model::Result;
use serde::Serialize;

#[async_trait]
pub trait JobProducer: Send + Sync {
    async fn enqueue_raw(&self, queue: &str, payload: Vec<u8>) -> Result<()>;
}

/// Serializes `job` as JSON and enqueues it on `queue`. Kept as a free
/// function (rather than a trait default method) so it works uniformly
/// over `&dyn JobProducer` and `Arc<dyn JobProducer>`.
pub async fn enqueue_job<P, T>(producer: &P, queue: &str, job: &T) -> Result<()>
where
    P: JobProducer + ?Sized,
    T: Serialize + Sync,
{
    let payload = serde_json::to_vec(job)?;
    producer.enqueue_raw(queue, payload).await
}
