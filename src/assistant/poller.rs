use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info};

use super::interface::{AssistantBackend, AssistantError};
use super::types::{Run, RunStatus};

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub max_retries: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_retries: 30,
            interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Assistant run failed: {0}")]
    Failed(String),

    #[error("Assistant run {0}")]
    Ended(RunStatus),

    #[error("Timed out waiting for assistant to respond")]
    TimedOut { attempts: u32 },

    #[error(transparent)]
    Remote(#[from] AssistantError),
}

/// Poll a run until it completes, fails, or the retry budget runs out.
///
/// Every attempt retrieves the run before sleeping, so a run that is already
/// finished costs a single request.
pub async fn wait_for_run(
    backend: &dyn AssistantBackend,
    thread_id: &str,
    run_id: &str,
    settings: &PollSettings,
) -> Result<Run, PollError> {
    info!("Waiting for run {} to complete", run_id);

    for attempt in 1..=settings.max_retries {
        let run = backend.retrieve_run(thread_id, run_id).await.map_err(|e| {
            error!("Error retrieving run {} on thread {}: {}", run_id, thread_id, e);
            PollError::Remote(e)
        })?;

        match run.status {
            RunStatus::Completed => {
                info!("Run {} completed successfully", run_id);
                return Ok(run);
            }
            RunStatus::Failed => {
                let reason = run
                    .last_error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown error".to_string());
                error!("Run {} failed: {}", run_id, reason);
                return Err(PollError::Failed(reason));
            }
            RunStatus::Expired | RunStatus::Cancelled => {
                error!("Run {} {}", run_id, run.status);
                return Err(PollError::Ended(run.status));
            }
            status => {
                debug!(
                    "Run status: {} (attempt {}/{}). Waiting before next check.",
                    status, attempt, settings.max_retries
                );
                tokio::time::sleep(settings.interval).await;
            }
        }
    }

    error!(
        "Timed out waiting for run {} after {} retries",
        run_id, settings.max_retries
    );
    Err(PollError::TimedOut {
        attempts: settings.max_retries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::types::{ListOrder, RunError, Thread, ThreadMessage};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Hands out run statuses in order, repeating the last one forever.
    struct ScriptedRuns {
        statuses: Mutex<VecDeque<RunStatus>>,
        retrievals: Mutex<u32>,
        failing: bool,
    }

    impl ScriptedRuns {
        fn new(statuses: &[RunStatus]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                retrievals: Mutex::new(0),
                failing: false,
            }
        }

        /// Every retrieval fails the way a provider 5xx does.
        fn failing() -> Self {
            Self {
                failing: true,
                ..Self::new(&[RunStatus::InProgress])
            }
        }

        fn retrievals(&self) -> u32 {
            *self.retrievals.lock().unwrap()
        }
    }

    #[async_trait]
    impl AssistantBackend for ScriptedRuns {
        async fn create_thread(&self) -> Result<Thread, AssistantError> {
            Err(AssistantError::Config("not scripted".into()))
        }

        async fn add_message(&self, _: &str, _: &str) -> Result<ThreadMessage, AssistantError> {
            Err(AssistantError::Config("not scripted".into()))
        }

        async fn create_run(&self, _: &str, _: &str) -> Result<Run, AssistantError> {
            Err(AssistantError::Config("not scripted".into()))
        }

        async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
            *self.retrievals.lock().unwrap() += 1;
            if self.failing {
                return Err(AssistantError::Api {
                    status: 500,
                    message: "The server had an error".into(),
                });
            }
            let mut statuses = self.statuses.lock().unwrap();
            let status = if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                statuses[0]
            };
            let last_error = (status == RunStatus::Failed).then(|| RunError {
                code: "server_error".into(),
                message: "Something broke".into(),
            });
            Ok(Run {
                id: run_id.to_string(),
                thread_id: thread_id.to_string(),
                assistant_id: "asst_test".into(),
                status,
                last_error,
            })
        }

        async fn list_messages(
            &self,
            _: &str,
            _: ListOrder,
            _: u32,
        ) -> Result<Vec<ThreadMessage>, AssistantError> {
            Ok(Vec::new())
        }

        async fn list_models(&self) -> Result<Vec<String>, AssistantError> {
            Ok(Vec::new())
        }

        async fn chat_completion(&self, _: &str, _: &str) -> Result<String, AssistantError> {
            Err(AssistantError::Config("not scripted".into()))
        }
    }

    fn fast(max_retries: u32) -> PollSettings {
        PollSettings {
            max_retries,
            interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn completes_after_queued_and_in_progress() {
        let backend = ScriptedRuns::new(&[
            RunStatus::Queued,
            RunStatus::InProgress,
            RunStatus::Completed,
        ]);

        let run = wait_for_run(&backend, "thread_1", "run_1", &fast(5))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(backend.retrievals(), 3);
    }

    #[tokio::test]
    async fn failed_run_carries_last_error() {
        let backend = ScriptedRuns::new(&[RunStatus::InProgress, RunStatus::Failed]);

        let err = wait_for_run(&backend, "thread_1", "run_1", &fast(5))
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Failed(_)));
        assert_eq!(
            err.to_string(),
            "Assistant run failed: server_error: Something broke"
        );
    }

    #[tokio::test]
    async fn expired_and_cancelled_end_the_loop() {
        for status in [RunStatus::Expired, RunStatus::Cancelled] {
            let backend = ScriptedRuns::new(&[status]);
            let err = wait_for_run(&backend, "thread_1", "run_1", &fast(5))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), format!("Assistant run {}", status));
            assert_eq!(backend.retrievals(), 1);
        }
    }

    #[tokio::test]
    async fn exhausting_the_budget_times_out() {
        let backend = ScriptedRuns::new(&[RunStatus::InProgress]);

        let err = wait_for_run(&backend, "thread_1", "run_1", &fast(3))
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::TimedOut { attempts: 3 }));
        assert_eq!(backend.retrievals(), 3);
    }

    #[tokio::test]
    async fn requires_action_keeps_polling() {
        let backend = ScriptedRuns::new(&[RunStatus::RequiresAction, RunStatus::Completed]);

        let run = wait_for_run(&backend, "thread_1", "run_1", &fast(5))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(backend.retrievals(), 2);
    }

    #[tokio::test]
    async fn retrieval_error_stops_polling() {
        let backend = ScriptedRuns::failing();

        let err = wait_for_run(&backend, "thread_1", "run_1", &fast(5))
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Remote(AssistantError::Api { status: 500, .. })));
        assert_eq!(err.to_string(), "The server had an error");
        assert_eq!(backend.retrievals(), 1);
    }
}
