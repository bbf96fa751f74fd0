use super::api::SessionStore;
use super::message::SessionRecord;
use crate::error::{Result, WorkbenchError};

/// Route to fall back to when a session does not exist.
pub const DEFAULT_ROUTE: &str = "/";

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryLoad {
    Found(SessionRecord),
    NotFound { redirect: String },
}

/// Loads a stored session by url id.
///
/// Missing sessions and sessions without messages are not errors; the caller
/// is told to redirect instead.
pub async fn load_history(
    store: &dyn SessionStore,
    token: Option<&str>,
    url_id: &str,
) -> Result<HistoryLoad> {
    let token = token.ok_or(WorkbenchError::AuthRequired)?;
    match store.fetch_session(token, url_id).await? {
        Some(record) if !record.messages.is_empty() => Ok(HistoryLoad::Found(record)),
        _ => {
            #[cfg(feature = "logging")]
            tracing::debug!(url_id, "session not found, redirecting");
            Ok(HistoryLoad::NotFound {
                redirect: DEFAULT_ROUTE.to_string(),
            })
        }
    }
}
