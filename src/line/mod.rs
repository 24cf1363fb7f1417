//! LINE Messaging API integration.
//!
//! Inbound: webhook payload types and signature verification.
//! Outbound: the `ReplySender` trait and its HTTP implementation.

pub mod client;
pub mod signature;
pub mod webhook;

use anyhow::Result;
use async_trait::async_trait;

/// Appended when a reply is cut to the platform limit.
pub const ELLIPSIS: char = '…';

/// Abstraction over the reply endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Send one text message against a reply token.
    async fn reply(&self, reply_token: &str, text: &str) -> Result<()>;
}

/// Cut `text` to `max_chars` characters plus an ellipsis when longer.
pub fn truncate_reply(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + ELLIPSIS.len_utf8());
            out.push_str(&text[..cut]);
            out.push(ELLIPSIS);
            out
        }
        None => text.to_string(),
    }
}
