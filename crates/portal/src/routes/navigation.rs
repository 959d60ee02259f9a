//! Tab and overlay navigation. None of these call an API.

use axum::{Form, response::Redirect};
use serde::Deserialize;
use tracing::instrument;

use culto_portal_core::flow::{FlowError, ViewType};

use super::{back_home, report};
use crate::error::Result;
use crate::middleware::Portal;

/// Tab switch form data.
#[derive(Debug, Deserialize)]
pub struct ViewForm {
    pub view: String,
}

/// Switch to a tab.
#[instrument(skip(portal))]
pub async fn show_view(mut portal: Portal, Form(form): Form<ViewForm>) -> Result<Redirect> {
    portal.customer()?;
    let result = form
        .view
        .parse::<ViewType>()
        .map_err(|_| FlowError::InvalidAction)
        .and_then(|view| portal.state.navigator.show_tab(view));
    report(&mut portal.state, result.map_err(Into::into));
    back_home(&portal).await
}

/// Swipe left.
pub async fn next_tab(mut portal: Portal) -> Result<Redirect> {
    portal.customer()?;
    portal.state.navigator.next_tab();
    back_home(&portal).await
}

/// Swipe right.
pub async fn prev_tab(mut portal: Portal) -> Result<Redirect> {
    portal.customer()?;
    portal.state.navigator.prev_tab();
    back_home(&portal).await
}

/// Back button of whichever overlay is open.
pub async fn overlay_back(mut portal: Portal) -> Result<Redirect> {
    portal.customer()?;
    portal.state.navigator.overlay_back();
    back_home(&portal).await
}

/// Close button of whichever overlay is open.
pub async fn overlay_close(mut portal: Portal) -> Result<Redirect> {
    portal.customer()?;
    portal.state.navigator.close_overlay();
    back_home(&portal).await
}
