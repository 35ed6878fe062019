//! Fault-tolerant task group: runs a set of futures to completion in
//! parallel, never short-circuits on the first error, and returns every
//! failure collected along the way. Distinct from a short-circuiting error
//! group — callers decide pass/fail from the returned error list.

use futures::future::BoxFuture;
use lumilio_model::EngineError;
use tokio::task::JoinSet;

pub type Task = BoxFuture<'static, Result<(), EngineError>>;

/// Runs `tasks` concurrently and waits for all of them, regardless of
/// whether earlier ones failed or panicked.
pub async fn run_all(tasks: Vec<Task>) -> Vec<EngineError> {
    let mut set = JoinSet::new();
    for task in tasks {
        set.spawn(task);
    }

    let mut errors = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => errors.push(e),
            Err(join_err) => {
                errors.push(EngineError::Internal(format!("task panicked: {join_err}")))
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collects_every_error_without_short_circuiting() {
        let errors = run_all(vec![
            Box::pin(async { Ok(()) }),
            Box::pin(async { Err(EngineError::Internal("a".into())) }),
            Box::pin(async { Err(EngineError::Internal("b".into())) }),
            Box::pin(async { Ok(()) }),
        ])
        .await;
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn empty_group_has_no_errors() {
        let errors = run_all(Vec::new()).await;
        assert!(errors.is_empty());
    }
}
