//! In-memory [`JobProducer`]: an append-only per-queue buffer. Tests drain
//! it directly instead of standing up a real broker.

use std::collections::HashMap;

use async_trait::async_trait;
use lumilio_model::Result;
use tokio::sync::Mutex;

use crate::ports::JobProducer;

#[derive(Default)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<String, Vec<Vec<u8>>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every payload enqueued on `queue`, in enqueue order.
    pub async fn drain(&self, queue: &str) -> Vec<Vec<u8>> {
        self.queues.lock().await.remove(queue).unwrap_or_default()
    }

    /// Pops the oldest payload on `queue`, or `None` if it's empty. The
    /// worker's poll loop uses this instead of `drain` so it processes one
    /// job at a time per queue per tick.
    pub async fn pop(&self, queue: &str) -> Option<Vec<u8>> {
        let mut queues = self.queues.lock().await;
        let entry = queues.get_mut(queue)?;
        if entry.is_empty() {
            None
        } else {
            Some(entry.remove(0))
        }
    }

    pub async fn len(&self, queue: &str) -> usize {
        self.queues.lock().await.get(queue).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl JobProducer for MemoryQueue {
    async fn enqueue_raw(&self, queue: &str, payload: Vec<u8>) -> Result<()> {
        self.queues.lock().await.entry(queue.to_string()).or_default().push(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_preserves_order_per_queue() {
        let queue = MemoryQueue::new();
        queue.enqueue_raw("metadata_asset", b"a".to_vec()).await.unwrap();
        queue.enqueue_raw("metadata_asset", b"b".to_vec()).await.unwrap();
        queue.enqueue_raw("thumbnail_asset", b"c".to_vec()).await.unwrap();

        assert_eq!(queue.drain("metadata_asset").await, vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(queue.drain("thumbnail_asset").await, vec![b"c".to_vec()]);
        assert!(queue.drain("metadata_asset").await.is_empty());
    }

    #[tokio::test]
    async fn pop_returns_oldest_then_none() {
        let queue = MemoryQueue::new();
        queue.enqueue_raw("retry_asset", b"first".to_vec()).await.unwrap();
        queue.enqueue_raw("retry_asset", b"second".to_vec()).await.unwrap();

        assert_eq!(queue.pop("retry_asset").await, Some(b"first".to_vec()));
        assert_eq!(queue.pop("retry_asset").await, Some(b"second".to_vec()));
        assert_eq!(queue.pop("retry_asset").await, None);
        assert_eq!(queue.pop("unknown_queue").await, None);
    }
}
