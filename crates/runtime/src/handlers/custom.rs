//! Handlers for custom events raised by story nodes or the host.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::context::TowerContext;
use crate::events::{EventHandler, EventPayload, GameEvent, HandlerError};

/// Unlocks a journal article named by `articleId`, `article_id` or `id`.
#[derive(Debug, Clone, Copy)]
pub struct ArticleUnlockHandler;

#[async_trait]
impl EventHandler<TowerContext> for ArticleUnlockHandler {
    fn name(&self) -> &'static str {
        "article_unlock"
    }

    async fn handle(&self, event: &GameEvent, ctx: &mut TowerContext) -> Result<(), HandlerError> {
        let EventPayload::Custom { payload, .. } = &event.payload else {
            return Ok(());
        };
        if let Some(id) = article_id(payload) {
            ctx.world.unlock_article(&id);
        }
        Ok(())
    }
}

fn article_id(payload: &Value) -> Option<String> {
    let raw = ["articleId", "article_id", "id"]
        .iter()
        .find_map(|key| payload.get(*key).filter(|v| !v.is_null()))?;
    let id = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

/// Logs the `txt` field of a `debug.console.log` event.
#[derive(Debug, Clone, Copy)]
pub struct DebugLogHandler;

#[async_trait]
impl EventHandler<TowerContext> for DebugLogHandler {
    fn name(&self) -> &'static str {
        "debug_log"
    }

    async fn handle(&self, event: &GameEvent, _ctx: &mut TowerContext) -> Result<(), HandlerError> {
        let EventPayload::Custom { payload, .. } = &event.payload else {
            return Ok(());
        };
        match payload.get("txt") {
            Some(Value::String(text)) => info!(target: "tower::debug", "{text}"),
            Some(other) => info!(target: "tower::debug", "{other}"),
            None => info!(target: "tower::debug", "(no text)"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn article_id_accepts_aliases_and_numbers() {
        assert_eq!(article_id(&json!({"articleId": " mfa "})).as_deref(), Some("mfa"));
        assert_eq!(article_id(&json!({"article_id": "phishing"})).as_deref(), Some("phishing"));
        assert_eq!(article_id(&json!({"id": 7})).as_deref(), Some("7"));
        assert_eq!(article_id(&json!({"id": "   "})), None);
        assert_eq!(article_id(&json!({})), None);
    }
}
