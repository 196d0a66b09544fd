//! Data models for chat messages and the wiki entities they hang off
//!
//! This module contains the chat message record, the read-only catalog
//! entities (documents, books, members, relationships), and the pagination
//! types shared by the store and the HTTP layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Author label stored for anonymous messages without a display name
pub const ANONYMOUS_AUTHOR: &str = "[Anonymous]";

/// A stored value did not match any known variant
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Moderation state of a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// Awaiting review
    #[default]
    Pending,
    /// Reviewed and visible
    Approved,
    /// Flagged as spam
    Spam,
    /// Soft-deleted by moderation
    Deleted,
}

impl ApprovalState {
    /// Stored integer code
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Pending => 0,
            Self::Approved => 1,
            Self::Spam => 2,
            Self::Deleted => 3,
        }
    }
}

impl ToSql for ApprovalState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for ApprovalState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_i64()? {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Approved),
            2 => Ok(Self::Spam),
            3 => Ok(Self::Deleted),
            other => Err(FromSqlError::OutOfRange(other)),
        }
    }
}

/// One user/AI exchange attached to a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Database primary key, 0 until inserted
    pub message_id: i64,
    /// Display floor number
    pub floor: i64,
    /// Owning book, always copied from the document on insert
    pub book_id: i64,
    /// Owning document
    pub document_id: i64,
    /// Author display name
    pub author: String,
    /// Author member id, 0 for anonymous
    pub member_id: i64,
    /// Originating host, without port
    pub ip_address: String,
    /// Creation timestamp
    pub date: DateTime<Utc>,
    /// User prompt (or analysis method)
    pub content: String,
    /// Inference response text
    pub response: String,
    /// Moderation state
    pub approved: ApprovalState,
    /// Browser user agent
    pub user_agent: String,
    /// Parent message, 0 for a root message
    pub parent_id: i64,
    /// Agree counter
    pub agree_count: i64,
    /// Against counter
    pub against_count: i64,
    /// 1-based absolute position within a listing (not stored)
    #[serde(default)]
    pub index: u64,
    /// Whether the current viewer may delete this message (not stored)
    #[serde(default)]
    pub show_del: bool,
}

impl ChatMessage {
    /// Start a new message for a document
    #[must_use]
    pub fn new(document_id: i64, content: impl Into<String>) -> Self {
        Self {
            document_id,
            content: content.into(),
            ..Self::default()
        }
    }

    /// True when no member authored the message
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.member_id <= 0
    }
}

/// Columns that can be written by a partial update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageField {
    /// `response`
    Response,
    /// `content`
    Content,
    /// `approved`
    Approved,
    /// `floor`
    Floor,
    /// `user_agent`
    UserAgent,
}

/// A documentation page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Primary key
    pub document_id: i64,
    /// Owning book
    pub book_id: i64,
    /// Title
    pub document_name: String,
    /// Markdown source sent to the inference service
    pub markdown: String,
}

/// Who may post messages on a book's documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentPolicy {
    /// Anyone, including anonymous visitors
    #[default]
    Open,
    /// Nobody
    Closed,
    /// Logged-in members only
    RegisteredOnly,
    /// Members holding a role in the book only
    GroupOnly,
}

impl CommentPolicy {
    /// Stored text value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::RegisteredOnly => "registered_only",
            Self::GroupOnly => "group_only",
        }
    }
}

impl fmt::Display for CommentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentPolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "registered_only" => Ok(Self::RegisteredOnly),
            "group_only" => Ok(Self::GroupOnly),
            other => Err(UnknownVariant {
                kind: "comment policy",
                value: other.to_string(),
            }),
        }
    }
}

impl ToSql for CommentPolicy {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CommentPolicy {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// A documentation project owning documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Primary key
    pub book_id: i64,
    /// Title
    pub book_name: String,
    /// Comment policy
    pub comment_status: CommentPolicy,
}

/// Account state of a member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Normal account
    #[default]
    Active,
    /// Locked account
    Disabled,
}

impl ToSql for MemberStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(match self {
            Self::Active => 0_i64,
            Self::Disabled => 1_i64,
        }))
    }
}

impl FromSql for MemberStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_i64()? {
            0 => Ok(Self::Active),
            1 => Ok(Self::Disabled),
            other => Err(FromSqlError::OutOfRange(other)),
        }
    }
}

/// A registered user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Primary key
    pub member_id: i64,
    /// Login handle
    pub account: String,
    /// Optional real name
    pub real_name: String,
    /// Account state
    pub status: MemberStatus,
}

impl Member {
    /// Name shown on messages: the real name when set, the account otherwise
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.real_name.is_empty() {
            &self.account
        } else {
            &self.real_name
        }
    }

    /// True when the account is locked
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.status == MemberStatus::Disabled
    }
}

/// Role of a member within a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookRole {
    /// Book creator
    Founder,
    /// Book administrator
    Administrator,
    /// Contributor
    Editor,
    /// Read-only participant
    Observer,
}

impl BookRole {
    /// Founder and administrator roles moderate every message in the book
    #[must_use]
    pub const fn is_elevated(self) -> bool {
        matches!(self, Self::Founder | Self::Administrator)
    }
}

impl ToSql for BookRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(match self {
            Self::Founder => 0_i64,
            Self::Administrator => 1,
            Self::Editor => 2,
            Self::Observer => 3,
        }))
    }
}

impl FromSql for BookRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_i64()? {
            0 => Ok(Self::Founder),
            1 => Ok(Self::Administrator),
            2 => Ok(Self::Editor),
            3 => Ok(Self::Observer),
            other => Err(FromSqlError::OutOfRange(other)),
        }
    }
}

/// Which page of a listing to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// 1-based page number
    Number(u32),
    /// The final page, whatever its number
    Last,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::Number(1)
    }
}

impl From<i64> for PageRequest {
    /// `-1` selects the last page; anything else below 1 selects the first.
    fn from(page: i64) -> Self {
        match page {
            -1 => Self::Last,
            n if n < 1 => Self::Number(1),
            n => Self::Number(u32::try_from(n).unwrap_or(u32::MAX)),
        }
    }
}

impl PageRequest {
    /// Resolve to a concrete 1-based page number
    #[must_use]
    pub fn resolve(self, total: u64, page_size: u32) -> u32 {
        match self {
            Self::Number(n) => n.max(1),
            Self::Last => {
                let pages = total_pages(total, page_size);
                u32::try_from(pages).unwrap_or(u32::MAX).max(1)
            }
        }
    }
}

/// Ceiling division of `total` by `page_size`
#[must_use]
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}

/// One page of messages returned by the store
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    /// Messages on this page, oldest first
    pub messages: Vec<ChatMessage>,
    /// Total messages on the document
    pub count: u64,
    /// Resolved page number
    pub page: u32,
}

/// Pagination envelope returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Resolved 1-based page number
    pub page_index: u32,
    /// Page size used
    pub page_size: u32,
    /// Total items across all pages
    pub total_count: u64,
    /// Number of pages
    pub total_page: u64,
    /// Items on this page
    pub list: Vec<T>,
}

impl Page<ChatMessage> {
    /// Wrap a store page for the client
    #[must_use]
    pub fn from_messages(page: MessagePage, page_size: u32) -> Self {
        Self {
            page_index: page.page,
            page_size,
            total_count: page.count,
            total_page: total_pages(page.count, page_size),
            list: page.messages,
        }
    }
}

/// Where a request came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    /// Client host, without port
    pub ip_address: String,
    /// `User-Agent` header value
    pub user_agent: String,
}
