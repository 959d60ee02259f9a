//! Status override panel for QA, behind `PORTAL_DEBUG_TOOLS`.

use axum::{Form, extract::State, response::Redirect};
use serde::Deserialize;
use tracing::instrument;

use culto_portal_core::SubscriptionStatus;

use super::back_home;
use crate::error::{AppError, Result};
use crate::middleware::Portal;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct StatusOption {
    pub code: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// The floating status picker.
#[derive(Debug, Clone)]
pub struct DebugPanel {
    pub options: Vec<StatusOption>,
    pub has_override: bool,
}

impl DebugPanel {
    #[must_use]
    pub fn new(status_override: Option<SubscriptionStatus>) -> Self {
        Self {
            options: SubscriptionStatus::ALL
                .iter()
                .map(|&status| StatusOption {
                    code: status.as_str(),
                    label: status.label(),
                    selected: status_override == Some(status),
                })
                .collect(),
            has_override: status_override.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    /// An API status code, or empty to clear the override.
    #[serde(default)]
    pub status: String,
}

/// Set or clear the status override.
#[instrument(skip(state, portal))]
pub async fn set_status(
    State(state): State<AppState>,
    mut portal: Portal,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    if !state.config().debug_tools {
        return Err(AppError::NotFound("Page not found".to_string()));
    }
    portal.customer()?;

    portal.state.status_override = if form.status.is_empty() {
        None
    } else {
        let status = SubscriptionStatus::ALL
            .into_iter()
            .find(|s| s.as_str() == form.status)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {}", form.status)))?;
        Some(status)
    };
    tracing::debug!(status_override = ?portal.state.status_override, "Status override changed");
    back_home(&portal).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_lists_every_status() {
        let panel = DebugPanel::new(Some(SubscriptionStatus::PausedInvoluntary));
        assert_eq!(panel.options.len(), 4);
        assert!(panel.has_override);
        let selected: Vec<_> = panel.options.iter().filter(|o| o.selected).map(|o| o.code).collect();
        assert_eq!(selected, vec!["PAUSED_INVOLUNTARY"]);
    }

    #[test]
    fn test_panel_without_override() {
        let panel = DebugPanel::new(None);
        assert!(!panel.has_override);
        assert!(panel.options.iter().all(|o| !o.selected));
    }
}
