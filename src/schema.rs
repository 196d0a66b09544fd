//! Database schema definitions
//!
//! This module provides constants for table and column names used with rusqlite.

/// Chat messages table schema
pub mod aigc_chat_messages {
    /// Table name
    pub const TABLE: &str = "aigc_chat_messages";
    /// Primary key column
    pub const MESSAGE_ID: &str = "message_id";
    /// Display floor number column
    pub const FLOOR: &str = "floor";
    /// Owning book column, copied from the document
    pub const BOOK_ID: &str = "book_id";
    /// Owning document column
    pub const DOCUMENT_ID: &str = "document_id";
    /// Author display name column
    pub const AUTHOR: &str = "author";
    /// Author member id column (0 = anonymous)
    pub const MEMBER_ID: &str = "member_id";
    /// Originating host column
    pub const IP_ADDRESS: &str = "ip_address";
    /// Creation timestamp column
    pub const DATE: &str = "date";
    /// Prompt column
    pub const CONTENT: &str = "content";
    /// AI response column
    pub const RESPONSE: &str = "response";
    /// Moderation state column
    pub const APPROVED: &str = "approved";
    /// Browser user agent column
    pub const USER_AGENT: &str = "user_agent";
    /// Parent message column (0 = root)
    pub const PARENT_ID: &str = "parent_id";
    /// Agree counter column
    pub const AGREE_COUNT: &str = "agree_count";
    /// Against counter column
    pub const AGAINST_COUNT: &str = "against_count";

    /// Maximum characters in `author`
    pub const AUTHOR_MAX: usize = 100;
    /// Maximum characters in `ip_address`
    pub const IP_ADDRESS_MAX: usize = 100;
    /// Maximum characters in `content`
    pub const CONTENT_MAX: usize = 2000;
    /// Maximum characters in `response`
    pub const RESPONSE_MAX: usize = 2000;
    /// Maximum characters in `user_agent`
    pub const USER_AGENT_MAX: usize = 500;
}

/// Documents table schema
pub mod documents {
    /// Table name
    pub const TABLE: &str = "documents";
    /// Primary key column
    pub const DOCUMENT_ID: &str = "document_id";
    /// Owning book column
    pub const BOOK_ID: &str = "book_id";
    /// Title column
    pub const DOCUMENT_NAME: &str = "document_name";
    /// Markdown source column
    pub const MARKDOWN: &str = "markdown";
}

/// Books table schema
pub mod books {
    /// Table name
    pub const TABLE: &str = "books";
    /// Primary key column
    pub const BOOK_ID: &str = "book_id";
    /// Title column
    pub const BOOK_NAME: &str = "book_name";
    /// Comment policy column
    pub const COMMENT_STATUS: &str = "comment_status";
}

/// Members table schema
pub mod members {
    /// Table name
    pub const TABLE: &str = "members";
    /// Primary key column
    pub const MEMBER_ID: &str = "member_id";
    /// Account handle column
    pub const ACCOUNT: &str = "account";
    /// Real name column
    pub const REAL_NAME: &str = "real_name";
    /// Status column (0 active, 1 disabled)
    pub const STATUS: &str = "status";
}

/// Relationships table schema
pub mod relationships {
    /// Table name
    pub const TABLE: &str = "relationships";
    /// Book column
    pub const BOOK_ID: &str = "book_id";
    /// Member column
    pub const MEMBER_ID: &str = "member_id";
    /// Role column
    pub const ROLE_ID: &str = "role_id";
}
