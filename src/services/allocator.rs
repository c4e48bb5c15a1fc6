//! Code allocation.
//!
//! Every stored code is unique because the final insert is a conditional
//! insert enforced by the store. The `exists` probe in front of it only saves
//! a write when the code is obviously taken.

use super::bounded;
use super::short_code::{ShortCodeService, DEFAULT_CODE_LENGTH, MAX_CODE_LENGTH};
use crate::db::{InsertOutcome, LinkRepository};
use crate::error::{AppError, AppResult};
use crate::models::Link;
use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Tunables for generated codes and target URL checks.
#[derive(Debug, Clone)]
pub struct AllocationPolicy {
    /// Starting length of generated codes
    pub code_length: usize,
    /// Collisions tolerated at one length before growing it
    pub max_attempts: u32,
    /// Only accept http:// and https:// targets
    pub strict_url_validation: bool,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            max_attempts: 10,
            strict_url_validation: false,
        }
    }
}

enum Attempt {
    Inserted(Link),
    Taken,
}

/// Reserves codes and persists new links.
#[derive(Clone)]
pub struct LinkAllocator {
    repository: Arc<dyn LinkRepository>,
    policy: AllocationPolicy,
    store_timeout: Duration,
}

impl LinkAllocator {
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        policy: AllocationPolicy,
        store_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            policy,
            store_timeout,
        }
    }

    /// Allocate a code for `target_url` and store the new link.
    ///
    /// With a custom code the code is validated and reserved as-is; without one
    /// a random code is generated and retried on collision.
    ///
    /// # Errors
    ///
    /// - `InvalidTargetUrl` / `InvalidFormat` before any store call
    /// - `CodeConflict` when a custom code is taken, including losing a race at insert time
    /// - `AllocationExhausted` when every generated candidate up to the maximum length collided
    /// - `StoreUnavailable` on store failure, or when a timed-out insert left no row behind
    pub async fn allocate(&self, target_url: &str, custom_code: Option<&str>) -> AppResult<Link> {
        validate_target_url(target_url, self.policy.strict_url_validation)?;

        let link = match custom_code {
            Some(code) => self.allocate_custom(target_url, code).await?,
            None => self.allocate_generated(target_url).await?,
        };

        info!(code = %link.code, target_url = %link.target_url, "Link created");
        Ok(link)
    }

    async fn allocate_custom(&self, target_url: &str, code: &str) -> AppResult<Link> {
        ShortCodeService::validate(code)?;

        if self.exists(code).await? {
            return Err(AppError::CodeConflict(code.to_string()));
        }

        match self.insert(code, target_url).await? {
            Attempt::Inserted(link) => Ok(link),
            Attempt::Taken => {
                debug!(code, "Lost insert race for custom code");
                Err(AppError::CodeConflict(code.to_string()))
            }
        }
    }

    async fn allocate_generated(&self, target_url: &str) -> AppResult<Link> {
        let mut attempts = 0;
        let start_length = self.policy.code_length.min(MAX_CODE_LENGTH);

        for length in start_length..=MAX_CODE_LENGTH {
            for _ in 0..self.policy.max_attempts {
                attempts += 1;
                let candidate = ShortCodeService::generate(length);

                if self.exists(&candidate).await? {
                    debug!(code = %candidate, "Generated code collided");
                    continue;
                }

                match self.insert(&candidate, target_url).await? {
                    Attempt::Inserted(link) => return Ok(link),
                    Attempt::Taken => debug!(code = %candidate, "Generated code taken at insert"),
                }
            }

            if length < MAX_CODE_LENGTH {
                warn!(
                    length,
                    attempts = self.policy.max_attempts,
                    "Code space crowded, growing generated code length"
                );
            }
        }

        Err(AppError::AllocationExhausted { attempts })
    }

    async fn exists(&self, code: &str) -> AppResult<bool> {
        bounded(self.store_timeout, "exists", self.repository.exists(code)).await
    }

    /// Conditional insert.
    ///
    /// A timed-out insert has an unknown outcome, so the row is read back
    /// instead of inserting again. The row is ours only if it carries both our
    /// target and the `created_at` this attempt wrote; any other row means the
    /// code is taken. No row means nothing was written and the caller gets
    /// `StoreUnavailable`.
    async fn insert(&self, code: &str, target_url: &str) -> AppResult<Attempt> {
        // Postgres keeps microseconds, so the read-back compares equal.
        let created_at = Utc::now().trunc_subsecs(6);
        let call = self.repository.insert_if_absent(code, target_url, created_at);

        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(outcome) => Ok(match outcome? {
                InsertOutcome::Inserted(link) => Attempt::Inserted(link),
                InsertOutcome::AlreadyExists => Attempt::Taken,
            }),
            Err(_) => {
                warn!(code, "Insert timed out, checking whether it landed");

                let existing = bounded(
                    self.store_timeout,
                    "find_by_code",
                    self.repository.find_by_code(code),
                )
                .await?;

                match existing {
                    Some(link)
                        if link.target_url == target_url && link.created_at == created_at =>
                    {
                        info!(code, "Timed-out insert had been applied");
                        Ok(Attempt::Inserted(link))
                    }
                    Some(_) => Ok(Attempt::Taken),
                    None => Err(AppError::StoreUnavailable(format!(
                        "insert of {} timed out after {}ms",
                        code,
                        self.store_timeout.as_millis()
                    ))),
                }
            }
        }
    }
}

/// Require a non-empty absolute URL with a host.
pub fn validate_target_url(target_url: &str, strict: bool) -> AppResult<()> {
    if target_url.trim().is_empty() {
        return Err(AppError::InvalidTargetUrl("URL is required".to_string()));
    }

    let parsed = Url::parse(target_url)
        .map_err(|e| AppError::InvalidTargetUrl(format!("{}: {}", target_url, e)))?;

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AppError::InvalidTargetUrl(format!(
            "{}: URL must include a host",
            target_url
        )));
    }

    if strict && !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidTargetUrl(
            "URL must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryLinkRepository, MockLinkRepository};
    use async_trait::async_trait;
    use chrono::DateTime;

    const TIMEOUT: Duration = Duration::from_millis(50);

    fn allocator(repository: impl LinkRepository + 'static) -> LinkAllocator {
        LinkAllocator::new(Arc::new(repository), AllocationPolicy::default(), TIMEOUT)
    }

    #[test]
    fn test_validate_target_url() {
        assert!(validate_target_url("https://example.com/docs", false).is_ok());
        assert!(validate_target_url("http://localhost:3000", false).is_ok());
        assert!(validate_target_url("ftp://files.example.com", false).is_ok());

        for bad in ["", "   ", "not-a-url", "example.com", "mailto:someone@example.com"] {
            assert!(
                matches!(validate_target_url(bad, false), Err(AppError::InvalidTargetUrl(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_strict_url_validation() {
        assert!(validate_target_url("https://example.com", true).is_ok());
        assert!(matches!(
            validate_target_url("ftp://files.example.com", true),
            Err(AppError::InvalidTargetUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_validation_errors_skip_the_store() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists().never();
        repo.expect_insert_if_absent().never();
        let allocator = allocator(repo);

        let err = allocator.allocate("not-a-url", None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTargetUrl(_)));

        let err = allocator
            .allocate("https://example.com", Some("ab"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn test_custom_code_taken_at_exists() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists().times(1).returning(|_| Ok(true));
        repo.expect_insert_if_absent().never();

        let err = allocator(repo)
            .allocate("https://other.com", Some("mydocs1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CodeConflict(code) if code == "mydocs1"));
    }

    #[tokio::test]
    async fn test_custom_code_lost_race_at_insert() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists().times(1).returning(|_| Ok(false));
        repo.expect_insert_if_absent()
            .times(1)
            .returning(|_, _, _| Ok(InsertOutcome::AlreadyExists));

        let err = allocator(repo)
            .allocate("https://example.com", Some("mydocs1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CodeConflict(_)));
    }

    #[tokio::test]
    async fn test_generated_code_retries_after_insert_collision() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists().times(2).returning(|_| Ok(false));

        let mut calls = 0;
        repo.expect_insert_if_absent().times(2).returning(move |code, url, created_at| {
            calls += 1;
            if calls == 1 {
                Ok(InsertOutcome::AlreadyExists)
            } else {
                Ok(InsertOutcome::Inserted(Link::new(code, url, created_at)))
            }
        });

        let link = allocator(repo)
            .allocate("https://example.com", None)
            .await
            .unwrap();
        assert_eq!(link.code.len(), DEFAULT_CODE_LENGTH);
        assert_eq!(link.total_clicks, 0);
    }

    #[tokio::test]
    async fn test_generated_code_exhaustion_is_bounded() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists().returning(|_| Ok(true));
        repo.expect_insert_if_absent().never();

        let policy = AllocationPolicy {
            max_attempts: 3,
            ..AllocationPolicy::default()
        };
        let allocator = LinkAllocator::new(Arc::new(repo), policy, TIMEOUT);

        let err = allocator.allocate("https://example.com", None).await.unwrap_err();
        // three attempts at each of the lengths 6, 7 and 8
        assert!(matches!(err, AppError::AllocationExhausted { attempts: 9 }));
    }

    #[tokio::test]
    async fn test_generated_code_length_grows_when_crowded() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists().returning(|code| Ok(code.len() < 7));
        repo.expect_insert_if_absent()
            .times(1)
            .returning(|code, url, created_at| {
                Ok(InsertOutcome::Inserted(Link::new(code, url, created_at)))
            });

        let link = allocator(repo)
            .allocate("https://example.com", None)
            .await
            .unwrap();
        assert_eq!(link.code.len(), 7);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists()
            .returning(|_| Err(AppError::StoreUnavailable("connection refused".into())));
        repo.expect_insert_if_absent().never();

        let err = allocator(repo)
            .allocate("https://example.com", Some("mydocs1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    /// Delegates to the memory store but stalls inserts past the allocator's
    /// timeout, either before or after the row is written.
    struct StalledInserts {
        inner: Arc<MemoryLinkRepository>,
        write_before_stall: bool,
    }

    #[async_trait]
    impl LinkRepository for StalledInserts {
        async fn exists(&self, code: &str) -> AppResult<bool> {
            self.inner.exists(code).await
        }

        async fn insert_if_absent(
            &self,
            code: &str,
            target_url: &str,
            created_at: DateTime<Utc>,
        ) -> AppResult<InsertOutcome> {
            if self.write_before_stall {
                self.inner.insert_if_absent(code, target_url, created_at).await?;
            }
            tokio::time::sleep(TIMEOUT * 4).await;
            self.inner.insert_if_absent(code, target_url, created_at).await
        }

        async fn find_by_code(&self, code: &str) -> AppResult<Option<Link>> {
            self.inner.find_by_code(code).await
        }

        async fn delete_by_code(&self, code: &str) -> AppResult<bool> {
            self.inner.delete_by_code(code).await
        }

        async fn list_all(&self) -> AppResult<Vec<Link>> {
            self.inner.list_all().await
        }

        async fn increment_click(&self, code: &str) -> AppResult<Option<Link>> {
            self.inner.increment_click(code).await
        }

        async fn ping(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_timed_out_insert_that_landed_is_recovered() {
        let allocator = allocator(StalledInserts {
            inner: Arc::new(MemoryLinkRepository::new()),
            write_before_stall: true,
        });

        let link = allocator
            .allocate("https://example.com", Some("slow001"))
            .await
            .unwrap();
        assert_eq!(link.code, "slow001");
        assert_eq!(link.target_url, "https://example.com");
    }

    #[tokio::test]
    async fn test_timed_out_insert_that_did_not_land() {
        let repo = Arc::new(StalledInserts {
            inner: Arc::new(MemoryLinkRepository::new()),
            write_before_stall: false,
        });
        let allocator = LinkAllocator::new(repo.clone(), AllocationPolicy::default(), TIMEOUT);

        let err = allocator
            .allocate("https://example.com", Some("slow002"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
        assert!(repo.find_by_code("slow002").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_timed_out_insert_does_not_claim_a_rival_row() {
        let shared = Arc::new(MemoryLinkRepository::new());
        let slow = allocator(StalledInserts {
            inner: shared.clone(),
            write_before_stall: false,
        });
        let fast = LinkAllocator::new(shared.clone(), AllocationPolicy::default(), TIMEOUT);

        // the slow insert is in flight when the second request lands the same code and URL
        let slow_call = tokio::spawn(async move {
            slow.allocate("https://example.com", Some("dup0001")).await
        });
        tokio::time::sleep(TIMEOUT / 5).await;
        let winner = fast
            .allocate("https://example.com", Some("dup0001"))
            .await
            .unwrap();

        let err = slow_call.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::CodeConflict(code) if code == "dup0001"));

        let stored = shared.find_by_code("dup0001").await.unwrap().unwrap();
        assert_eq!(stored, winner);
        assert_eq!(shared.list_all().await.unwrap().len(), 1);
    }
}
