//! Extraction of confirmation tokens from a MailHog listing.
//!
//! Activation and password-reset mails carry their link under different
//! keys (`ConfirmationLinkUrl` and `ConfirmationLinkUri`). The two lookups
//! stay separate operations so a reset mail is never mistaken for an
//! activation mail of the same login.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::trace;

use crate::models::{Mailbox, MailMessage};

const LOGIN_FIELD: &str = "Login";
const ACTIVATION_LINK_FIELD: &str = "ConfirmationLinkUrl";
const RESET_LINK_FIELD: &str = "ConfirmationLinkUri";

/// Token from the activation mail addressed to `login`, if one is listed.
pub fn find_activation_token(mailbox: &Mailbox, login: &str) -> Option<String> {
    find_token(mailbox, login, ACTIVATION_LINK_FIELD)
}

/// Token from the password-reset mail addressed to `login`, if one is listed.
pub fn find_reset_token(mailbox: &Mailbox, login: &str) -> Option<String> {
    find_token(mailbox, login, RESET_LINK_FIELD)
}

/// Last non-empty path segment of a confirmation link.
pub fn token_from_link(link: &str) -> Option<&str> {
    link.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// Among matching messages the latest `Created` wins. When timestamps are
/// missing or equal, the later message in list order wins. MailHog lists
/// newest first, so an exact tie resolves to the mail listed last.
fn find_token(mailbox: &Mailbox, login: &str, link_field: &str) -> Option<String> {
    let mut best: Option<(Option<DateTime<Utc>>, String)> = None;

    for message in &mailbox.items {
        let Some(token) = token_in_message(message, login, link_field) else {
            continue;
        };
        let older = matches!(
            (best.as_ref().and_then(|(created, _)| *created), message.created),
            (Some(best_created), Some(created)) if created < best_created
        );
        if !older {
            best = Some((message.created, token));
        }
    }

    best.map(|(_, token)| token)
}

fn token_in_message(message: &MailMessage, login: &str, link_field: &str) -> Option<String> {
    let body: Value = match serde_json::from_str(&message.content.body) {
        Ok(body) => body,
        Err(e) => {
            trace!(id = %message.id, error = %e, "skipping message with non-JSON body");
            return None;
        }
    };
    if body.get(LOGIN_FIELD).and_then(Value::as_str) != Some(login) {
        return None;
    }
    body.get(link_field)
        .and_then(Value::as_str)
        .and_then(token_from_link)
        .map(str::to_string)
}
