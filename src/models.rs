use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A short code and the URL it points to, plus its click counters.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Link {
    pub code: String,
    pub target_url: String,
    pub total_clicks: i64,
    pub last_clicked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// A freshly allocated link: no clicks yet.
    pub fn new(code: &str, target_url: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            code: code.to_string(),
            target_url: target_url.to_string(),
            total_clicks: 0,
            last_clicked_at: None,
            created_at,
        }
    }
}

/// Request to create a link
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    #[serde(default)]
    pub target_url: Option<String>,

    #[serde(default)]
    pub code: Option<String>,
}

impl CreateLinkRequest {
    /// Custom code requested by the client. Dashboard forms post an empty
    /// string when the field is left blank, which means "generate one".
    pub fn custom_code(&self) -> Option<&str> {
        self.code.as_deref().filter(|code| !code.is_empty())
    }
}
