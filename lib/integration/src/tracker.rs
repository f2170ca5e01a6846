//! Issue tracker abstraction.
//!
//! Mirrors the handful of tracker operations the planner needs. Epic
//! creation, story assignment and sprint assignment report failure through
//! their return value and log the cause; only sprint creation and retried
//! story creation return errors.

use crate::error::TrackerError;
use crate::retry::{RetryPolicy, retry_async};
use async_trait::async_trait;
use chrono::NaiveDate;
use rootcause::prelude::Report;
use sprintcraft_core::IssueKey;
use tracing::{error, info};

/// Operations the planner performs against an issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Creates an epic. Returns `None` (after logging) on failure.
    async fn create_epic(&self, title: &str, description: &str) -> Option<IssueKey>;

    /// Creates a story under `parent`. Returns `None` (after logging) on
    /// failure.
    async fn create_story(
        &self,
        title: &str,
        description: &str,
        parent: &IssueKey,
    ) -> Option<IssueKey>;

    /// Assigns an issue to the account registered under `email`.
    async fn assign_story(&self, key: &IssueKey, email: &str) -> bool;

    /// Creates a sprint and returns its tracker id.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker rejects the sprint.
    async fn create_sprint(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, Report<TrackerError>>;

    /// Moves issues into a sprint and returns how many moved.
    async fn assign_stories_to_sprint(&self, sprint_id: u64, keys: &[IssueKey]) -> usize;
}

/// Creates a story, retrying per `policy`.
///
/// # Errors
///
/// Returns `RetriesExhausted` once every attempt has failed.
pub async fn create_story_with_retry(
    tracker: &dyn IssueTracker,
    policy: &RetryPolicy,
    title: &str,
    description: &str,
    parent: &IssueKey,
) -> Result<IssueKey, Report<TrackerError>> {
    let outcome = retry_async(policy, |_| async move {
        tracker
            .create_story(title, description, parent)
            .await
            .ok_or("tracker returned no issue key")
    })
    .await;

    match outcome.result {
        Ok(key) => {
            info!(%key, %parent, attempts = outcome.attempts, "story created");
            Ok(key)
        }
        Err(_) => {
            error!(title, attempts = outcome.attempts, "story creation retries exhausted");
            Err(TrackerError::RetriesExhausted {
                title: title.to_string(),
                attempts: outcome.attempts,
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Tracker whose story creation fails a fixed number of times.
    struct FlakyTracker {
        failures_left: Mutex<u32>,
        calls: Mutex<Vec<String>>,
    }

    impl FlakyTracker {
        fn failing(times: u32) -> Self {
            Self {
                failures_left: Mutex::new(times),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IssueTracker for FlakyTracker {
        async fn create_epic(&self, _title: &str, _description: &str) -> Option<IssueKey> {
            None
        }

        async fn create_story(
            &self,
            title: &str,
            _description: &str,
            parent: &IssueKey,
        ) -> Option<IssueKey> {
            self.calls.lock().unwrap().push(format!("{parent}/{title}"));
            let mut failures = self.failures_left.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                None
            } else {
                Some(IssueKey::new("AI1-7"))
            }
        }

        async fn assign_story(&self, _key: &IssueKey, _email: &str) -> bool {
            false
        }

        async fn create_sprint(
            &self,
            _name: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<u64, Report<TrackerError>> {
            Ok(1)
        }

        async fn assign_stories_to_sprint(&self, _sprint_id: u64, _keys: &[IssueKey]) -> usize {
            0
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::ZERO)
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let tracker = FlakyTracker::failing(2);
        let key = create_story_with_retry(&tracker, &policy(), "Login", "", &IssueKey::new("AI1-1"))
            .await
            .unwrap();

        assert_eq!(key.as_str(), "AI1-7");
        assert_eq!(tracker.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_fail() {
        let tracker = FlakyTracker::failing(5);
        let key = IssueKey::new("AI1-1");
        let result = create_story_with_retry(&tracker, &policy(), "Login", "", &key).await;

        let message = result.unwrap_err().to_string();
        assert!(message.contains("after 3 attempts"), "{message}");
        assert_eq!(tracker.calls.lock().unwrap().len(), 3);
    }
}
