//! Heuristic classification of request metadata.
//!
//! Advisory only: the governor never feeds this signal into the deny path.
//! Legitimate automated integrations are expected to trip it.

use crate::models::RequestMetadata;

/// Client-software fragments typical of bots, crawlers and scripted tools
const AUTOMATED_AGENT_FRAGMENTS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "scraper",
    "curl",
    "wget",
    "python-requests",
    "go-http-client",
    "java/",
    "headless",
];

/// Whether the request looks like it came from an automated client.
///
/// Fires on a known fragment in the declared client software, or on the
/// absence of the content-negotiation headers interactive clients send.
pub fn looks_automated(meta: &RequestMetadata) -> bool {
    if let Some(agent) = meta.user_agent.as_deref() {
        let agent = agent.to_ascii_lowercase();
        if AUTOMATED_AGENT_FRAGMENTS
            .iter()
            .any(|fragment| agent.contains(fragment))
        {
            return true;
        }
    }

    meta.accept.is_none() && meta.accept_language.is_none()
}
