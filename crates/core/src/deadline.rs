use crate::error::SearchError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_millis(9_000);

/// Instant after which a collaborator call is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Runs `future` until the deadline, mapping expiry to `DeadlineExceeded`.
    pub async fn run<F, T>(&self, collaborator: &str, future: F) -> Result<T, SearchError>
    where
        F: Future<Output = Result<T, SearchError>>,
    {
        tokio::time::timeout_at(self.at, future)
            .await
            .map_err(|_| SearchError::DeadlineExceeded {
                collaborator: collaborator.to_string(),
            })?
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::after(DEFAULT_COLLABORATOR_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_future_is_cut_at_the_deadline() {
        let deadline = Deadline::after(Duration::from_millis(20));
        let result = deadline
            .run("slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, SearchError>(1)
            })
            .await;

        assert!(matches!(
            result,
            Err(SearchError::DeadlineExceeded { collaborator }) if collaborator == "slow"
        ));
        assert!(deadline.is_expired());
    }

    #[tokio::test]
    async fn fast_future_passes_its_own_result_through() {
        let deadline = Deadline::after(Duration::from_secs(5));
        let result = deadline.run("fast", async { Ok::<_, SearchError>(7) }).await;
        assert_eq!(result.ok(), Some(7));
        assert!(!deadline.is_expired());
    }
}
