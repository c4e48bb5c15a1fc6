use super::{InsertOutcome, LinkRepository};
use crate::error::AppResult;
use crate::models::Link;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-process repository.
///
/// Each operation runs under a single dashmap shard lock, which gives the same
/// per-row atomicity the SQL adapter gets from the database. No lock is held
/// across an `.await`.
#[derive(Debug, Default)]
pub struct MemoryLinkRepository {
    links: DashMap<String, Link>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn exists(&self, code: &str) -> AppResult<bool> {
        Ok(self.links.contains_key(code))
    }

    async fn insert_if_absent(
        &self,
        code: &str,
        target_url: &str,
        created_at: DateTime<Utc>,
    ) -> AppResult<InsertOutcome> {
        match self.links.entry(code.to_string()) {
            Entry::Occupied(_) => Ok(InsertOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                let link = Link::new(code, target_url, created_at);
                slot.insert(link.clone());
                Ok(InsertOutcome::Inserted(link))
            }
        }
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Link>> {
        Ok(self.links.get(code).map(|entry| entry.value().clone()))
    }

    async fn delete_by_code(&self, code: &str) -> AppResult<bool> {
        Ok(self.links.remove(code).is_some())
    }

    async fn list_all(&self) -> AppResult<Vec<Link>> {
        let mut links: Vec<Link> = self.links.iter().map(|entry| entry.value().clone()).collect();
        links.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(links)
    }

    async fn increment_click(&self, code: &str) -> AppResult<Option<Link>> {
        let now = Utc::now();

        Ok(self.links.get_mut(code).map(|mut entry| {
            let link = entry.value_mut();
            link.total_clicks += 1;
            link.last_clicked_at = Some(link.last_clicked_at.map_or(now, |prev| prev.max(now)));
            link.clone()
        }))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_if_absent_rejects_duplicates() {
        let repo = MemoryLinkRepository::new();

        let first = repo.insert_if_absent("abc123", "https://a.example", Utc::now()).await.unwrap();
        let second = repo.insert_if_absent("abc123", "https://b.example", Utc::now()).await.unwrap();

        assert!(matches!(first, InsertOutcome::Inserted(_)));
        assert!(matches!(second, InsertOutcome::AlreadyExists));

        let stored = repo.find_by_code("abc123").await.unwrap().unwrap();
        assert_eq!(stored.target_url, "https://a.example");
    }

    #[tokio::test]
    async fn test_concurrent_inserts_have_one_winner() {
        let repo = Arc::new(MemoryLinkRepository::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.insert_if_absent("race01", &format!("https://{i}.example"), Utc::now())
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if let InsertOutcome::Inserted(_) = handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_increment_click_missing_code() {
        let repo = MemoryLinkRepository::new();
        assert!(repo.increment_click("nope42").await.unwrap().is_none());
        assert!(!repo.exists("nope42").await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_click_updates_counters() {
        let repo = MemoryLinkRepository::new();
        repo.insert_if_absent("abc123", "https://example.com", Utc::now()).await.unwrap();

        let first = repo.increment_click("abc123").await.unwrap().unwrap();
        let second = repo.increment_click("abc123").await.unwrap().unwrap();

        assert_eq!(first.total_clicks, 1);
        assert_eq!(second.total_clicks, 2);
        assert!(second.last_clicked_at >= first.last_clicked_at);
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let repo = MemoryLinkRepository::new();
        for code in ["first1", "second", "third3"] {
            repo.insert_if_absent(code, "https://example.com", Utc::now()).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let codes: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|link| link.code)
            .collect();
        assert_eq!(codes, vec!["third3", "second", "first1"]);
    }

    #[tokio::test]
    async fn test_delete_by_code() {
        let repo = MemoryLinkRepository::new();
        repo.insert_if_absent("abc123", "https://example.com", Utc::now()).await.unwrap();

        assert!(repo.delete_by_code("abc123").await.unwrap());
        assert!(!repo.delete_by_code("abc123").await.unwrap());
        assert!(!repo.exists("abc123").await.unwrap());
    }
}
