//! History browsing session.
//!
//! [`HistorySession`] is what a history view holds: the time-travel
//! controller plus the services that view needs, passed in at construction.
//! Slider and route parameters arrive as text, so the session parses them
//! before travelling.

use std::sync::Arc;

use async_trait::async_trait;
use rekishi_ops::{Apply, Invert, Version};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::controller::{TimeTravel, TravelError};
use crate::settle::TravelHandle;

/// Human-readable metadata for a link embedded in the document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unfurl {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Errors from an [`Unfurler`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnfurlError {
    #[error("nothing to unfurl at {0}")]
    NotFound(String),
    #[error("unfurl failed: {0}")]
    Failed(String),
}

/// Looks up display metadata for URLs found in document blocks.
#[async_trait]
pub trait Unfurler: Send + Sync {
    async fn unfurl(&self, url: &str) -> Result<Unfurl, UnfurlError>;
}

/// Parse a version from slider or route text.
///
/// Only whole non-negative integers (surrounding whitespace allowed) are
/// accepted. Text with a numeric prefix such as `"3.5"` or `"3px"` is
/// rejected rather than truncated to 3.
pub fn parse_version(text: &str) -> Result<Version, TravelError> {
    text.trim()
        .parse()
        .map_err(|_| TravelError::InvalidVersion(text.to_string()))
}

/// A time-travel controller bundled with its view's dependencies.
pub struct HistorySession<O, D> {
    travel: TimeTravel<O, D>,
    unfurler: Arc<dyn Unfurler>,
}

impl<O, D> HistorySession<O, D>
where
    O: Invert,
    D: Apply<O>,
{
    pub fn new(travel: TimeTravel<O, D>, unfurler: Arc<dyn Unfurler>) -> Self {
        Self { travel, unfurler }
    }

    pub fn travel(&self) -> &TimeTravel<O, D> {
        &self.travel
    }

    pub fn travel_mut(&mut self) -> &mut TimeTravel<O, D> {
        &mut self.travel
    }

    /// Slider moved from `old` to `new`; travel to `new`.
    pub fn on_version_change(&mut self, old: &str, new: &str) -> Result<TravelHandle, TravelError> {
        let target = parse_version(new)?;
        debug!(old, new = target, "slider moved");
        self.travel.travel_to(target)
    }

    /// Copy of the document as currently viewed, with its version.
    pub fn snapshot(&self) -> (Version, D)
    where
        D: Clone,
    {
        (self.travel.current_version(), self.travel.document().clone())
    }

    /// Look up display metadata for a block's URL.
    pub async fn unfurl_block(&self, url: &str) -> Result<Unfurl, UnfurlError> {
        let result = self.unfurler.unfurl(url).await;
        if let Err(e) = &result {
            warn!("unfurl {url}: {e}");
        }
        result
    }

    pub fn into_travel(self) -> TimeTravel<O, D> {
        self.travel
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use parking_lot::Mutex;
    use rekishi_ops::{Component, JsonDocument, JsonOp, OpLog};
    use serde_json::json;

    use super::*;
    use crate::TravelConfig;

    struct StaticUnfurler {
        known: HashMap<String, Unfurl>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Unfurler for StaticUnfurler {
        async fn unfurl(&self, url: &str) -> Result<Unfurl, UnfurlError> {
            self.calls.lock().push(url.to_string());
            self.known
                .get(url)
                .cloned()
                .ok_or_else(|| UnfurlError::NotFound(url.to_string()))
        }
    }

    fn session(unfurler: Arc<StaticUnfurler>) -> HistorySession<JsonOp, JsonDocument> {
        let log: OpLog<JsonOp> = vec![
            JsonOp::single(Component::object_insert(["title"], json!("a"))),
            JsonOp::single(Component::string_insert(["title"], 1, "b")),
            JsonOp::single(Component::string_insert(["title"], 2, "c")),
        ]
        .into();
        let travel = TimeTravel::from_base(
            Arc::new(log),
            JsonDocument::new(json!({})),
            3,
            TravelConfig::default(),
        )
        .unwrap();
        HistorySession::new(travel, unfurler)
    }

    fn unfurler() -> Arc<StaticUnfurler> {
        let mut known = HashMap::new();
        known.insert(
            "https://example.com".to_string(),
            Unfurl {
                url: "https://example.com".to_string(),
                title: Some("Example".to_string()),
                ..Default::default()
            },
        );
        Arc::new(StaticUnfurler { known, calls: Mutex::new(Vec::new()) })
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("12").unwrap(), 12);
        assert_eq!(parse_version(" 3 ").unwrap(), 3);
        assert_eq!(parse_version("x").unwrap_err(), TravelError::InvalidVersion("x".to_string()));
        assert!(parse_version("-1").is_err());
        assert!(parse_version("3.5").is_err());
        assert!(parse_version("3px").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slider_text_drives_travel() {
        let mut s = session(unfurler());

        s.on_version_change("3", "1").unwrap();
        assert_eq!(s.travel().current_version(), 1);
        assert_eq!(s.travel().document().root(), &json!({"title": "a"}));

        let err = s.on_version_change("1", "two").unwrap_err();
        assert!(matches!(err, TravelError::InvalidVersion(_)));
        assert_eq!(s.travel().current_version(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_is_detached() {
        let mut s = session(unfurler());
        s.travel_mut().travel_to(2).unwrap();

        let (version, doc) = s.snapshot();
        s.travel_mut().travel_to(0).unwrap();

        assert_eq!(version, 2);
        assert_eq!(doc.root(), &json!({"title": "ab"}));
        assert_eq!(s.travel().document().root(), &json!({}));
    }

    #[tokio::test]
    async fn test_unfurl_uses_injected_service() {
        let unfurler = unfurler();
        let s = session(Arc::clone(&unfurler));

        let found = s.unfurl_block("https://example.com").await.unwrap();
        assert_eq!(found.title.as_deref(), Some("Example"));

        let missing = s.unfurl_block("https://nope.invalid").await.unwrap_err();
        assert_eq!(missing, UnfurlError::NotFound("https://nope.invalid".to_string()));

        assert_eq!(unfurler.calls.lock().len(), 2);
    }
}
