//! Ordered selector cascades over a [`Session`].
//!
//! Every probe is guarded on its own: a failing query is logged and treated
//! as a miss, so one broken selector never aborts the cascade.

use std::time::Duration;

use crate::session::{ElementSnapshot, Session};

/// A cookie banner or overlay to close before discovery.
///
/// `present` is waited for first; once it matches, the first interactable
/// `accept` control is clicked.
#[derive(Debug, Clone, Copy)]
pub struct Interstitial {
    pub name: &'static str,
    pub present: &'static str,
    pub accept: &'static str,
}

/// Query `selector`, turning a session failure into an empty result.
pub async fn query_or_empty(session: &mut dyn Session, selector: &str) -> Vec<ElementSnapshot> {
    match session.query(selector).await {
        Ok(found) => found,
        Err(e) => {
            tracing::debug!(selector, error = %e, "probe query failed");
            Vec::new()
        }
    }
}

/// Evaluate `probes` in order and return the first selector that matches
/// anything, together with its matches.
pub async fn first_non_empty<'p>(
    session: &mut dyn Session,
    probes: &[&'p str],
) -> Option<(&'p str, Vec<ElementSnapshot>)> {
    for &selector in probes {
        let found = query_or_empty(session, selector).await;
        if found.is_empty() {
            tracing::debug!(selector, "probe miss");
            continue;
        }
        return Some((selector, found));
    }
    None
}

/// First `(selector, index)` across `probes` whose element can be clicked.
pub async fn first_interactable<'p>(
    session: &mut dyn Session,
    probes: &[&'p str],
) -> Option<(&'p str, usize)> {
    for &selector in probes {
        let found = query_or_empty(session, selector).await;
        if let Some(index) = found.iter().position(ElementSnapshot::is_interactable) {
            return Some((selector, index));
        }
    }
    None
}

/// Close one interstitial if it shows up within `wait`. Returns whether a
/// control was clicked.
pub async fn dismiss(session: &mut dyn Session, interstitial: Interstitial, wait: Duration) -> bool {
    let present = match session.wait_for(interstitial.present, wait).await {
        Ok(found) => !found.is_empty(),
        Err(e) => {
            tracing::debug!(name = interstitial.name, error = %e, "interstitial probe failed");
            false
        }
    };
    if !present {
        tracing::debug!(name = interstitial.name, "no interstitial");
        return false;
    }

    let Some((selector, index)) = first_interactable(session, &[interstitial.accept]).await else {
        tracing::debug!(name = interstitial.name, "interstitial has no usable control");
        return false;
    };
    match session.click(selector, index).await {
        Ok(()) => {
            tracing::info!(name = interstitial.name, "dismissed interstitial");
            true
        }
        Err(e) => {
            tracing::warn!(name = interstitial.name, error = %e, "failed to dismiss interstitial");
            false
        }
    }
}
