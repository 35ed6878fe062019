//! Shared status-merge logic: every per-job handler and the retry processor
//! reduce a set of task outcomes into one `AssetStatus` update the same way.

use std::sync::Arc;

use lumilio_model::ids::AssetID;
use lumilio_model::status::{AssetStatus, Task, TaskError};
use lumilio_model::Result;

use crate::ports::CatalogLayer;

/// Replaces `task`'s errors in `current` with `new_errors` and recomputes
/// phase. A single-task special case of [`merge_retry`].
pub fn merge_task_result(current: &AssetStatus, task: Task, new_errors: Vec<TaskError>) -> AssetStatus {
    merge_retry(current, &[task], new_errors)
}

/// `finalErrors = (originalErrors with Task ∉ retriedTasks) ++ newErrors`,
/// then phase *complete* if empty, else *warning*/*failed* depending on
/// whether any error is fatal.
pub fn merge_retry(current: &AssetStatus, retried_tasks: &[Task], new_errors: Vec<TaskError>) -> AssetStatus {
    let mut errors: Vec<TaskError> = current
        .errors
        .iter()
        .filter(|e| !retried_tasks.contains(&e.task))
        .cloned()
        .collect();
    errors.extend(new_errors);
    finalize(errors)
}

fn finalize(errors: Vec<TaskError>) -> AssetStatus {
    if errors.is_empty() {
        AssetStatus::complete("all pipeline stages completed successfully")
    } else if errors.iter().any(|e| e.fatal) {
        AssetStatus::failed("one or more pipeline stages failed fatally", errors)
    } else {
        AssetStatus::warning("some pipeline stages reported errors", errors)
    }
}

/// Fetches the asset, merges in `new_errors` for `task`, and writes the
/// result back. The shape every single-job handler (metadata/thumbnail/
/// transcode) uses to report its outcome.
pub async fn apply_task_result(
    catalog: &Arc<dyn CatalogLayer>,
    asset_id: AssetID,
    task: Task,
    new_errors: Vec<TaskError>,
) -> Result<()> {
    let asset = catalog.get_asset_by_id(asset_id).await?;
    let merged = merge_task_result(&asset.status, task, new_errors);
    catalog.update_asset_status(asset_id, merged).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(task: Task) -> TaskError {
        TaskError { task, error: "boom".into(), fatal: false }
    }

    #[test]
    fn replaces_only_the_named_task() {
        let current = AssetStatus::warning(
            "partial",
            vec![error(Task::GenerateThumbnails), error(Task::ClipProcessing)],
        );
        let merged = merge_task_result(&current, Task::GenerateThumbnails, vec![]);
        assert_eq!(merged.errors.len(), 1);
        assert_eq!(merged.errors[0].task, Task::ClipProcessing);
        assert!(matches!(merged.phase, lumilio_model::status::Phase::Warning));
    }

    #[test]
    fn empty_result_set_is_complete() {
        let current = AssetStatus::warning("partial", vec![error(Task::GenerateThumbnails)]);
        let merged = merge_task_result(&current, Task::GenerateThumbnails, vec![]);
        assert!(matches!(merged.phase, lumilio_model::status::Phase::Complete));
    }

    #[test]
    fn fatal_error_forces_failed_phase() {
        let current = AssetStatus::processing("working");
        let mut fatal = error(Task::ClipProcessing);
        fatal.fatal = true;
        let merged = merge_task_result(&current, Task::ClipProcessing, vec![fatal]);
        assert!(matches!(merged.phase, lumilio_model::status::Phase::Failed));
    }

    #[test]
    fn retry_merge_drops_all_retried_tasks_at_once() {
        let current = AssetStatus::warning(
            "partial",
            vec![error(Task::GenerateThumbnails), error(Task::ClipProcessing)],
        );
        let merged = merge_retry(
            &current,
            &[Task::GenerateThumbnails, Task::ClipProcessing],
            vec![error(Task::ClipProcessing)],
        );
        assert_eq!(merged.errors.len(), 1);
        assert_eq!(merged.errors[0].task, Task::ClipProcessing);
    }
}
