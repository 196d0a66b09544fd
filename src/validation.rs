use std::net::SocketAddr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ChatError, Result};
use crate::schema::aigc_chat_messages as cols;

static API_PATH: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^/[A-Za-z0-9._~/-]*$").unwrap()
});

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate message content (prompt or analysis method)
    pub fn validate_content(content: &str) -> Result<()> {
        if content.is_empty() {
            return Err(ChatError::validation("Message content cannot be empty"));
        }

        if content.chars().count() > cols::CONTENT_MAX {
            return Err(ChatError::validation(format!(
                "Message content too long (max {} characters)",
                cols::CONTENT_MAX
            )));
        }

        Ok(())
    }

    /// Validate author display name
    pub fn validate_author(author: &str) -> Result<()> {
        if author.chars().count() > cols::AUTHOR_MAX {
            return Err(ChatError::validation(format!(
                "Author name too long (max {} characters)",
                cols::AUTHOR_MAX
            )));
        }

        if author.contains('\0') || author.contains('\r') || author.contains('\n') {
            return Err(ChatError::validation("Author name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate the stored client address
    pub fn validate_ip_address(ip_address: &str) -> Result<()> {
        if ip_address.chars().count() > cols::IP_ADDRESS_MAX {
            return Err(ChatError::validation(format!(
                "IP address too long (max {} characters)",
                cols::IP_ADDRESS_MAX
            )));
        }
        Ok(())
    }

    /// Validate an inference sub-path supplied by a client.
    ///
    /// The path is appended to the configured base URL, so it must not be able
    /// to change the host: it starts with `/`, uses only unreserved path
    /// characters, and has no `..` segment or leading `//`.
    pub fn validate_api_path(path: &str) -> Result<()> {
        if path.is_empty() {
            return Err(ChatError::validation("Analysis method must be specified"));
        }

        if !API_PATH.is_match(path) {
            return Err(ChatError::validation(format!("Invalid analysis method: {path}")));
        }

        if path.starts_with("//") || path.split('/').any(|segment| segment == "..") {
            return Err(ChatError::validation(format!("Invalid analysis method: {path}")));
        }

        Ok(())
    }

    /// Validate page size
    pub fn validate_page_size(page_size: u32) -> Result<()> {
        if page_size == 0 {
            return Err(ChatError::validation("Page size must be greater than 0"));
        }
        Ok(())
    }
}

/// Cut `value` to at most `max` characters without splitting a code point.
#[must_use]
pub fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Host portion of a peer address; the port is dropped and IPv6 hosts stay intact.
#[must_use]
pub fn client_host(addr: &SocketAddr) -> String {
    addr.ip().to_string()
}
