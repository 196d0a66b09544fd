//! Chat message persistence.
//!
//! [`MessageStore`] owns every read and write against `aigc_chat_messages`.
//! Inserts enforce the owning book's comment policy and the author's account
//! state before a row is written; listings annotate each row with its absolute
//! position and the viewer's delete permission.

use chrono::Utc;
use rusqlite::types::ToSql;
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::db::Database;
use crate::error::{ChatError, Result};
use crate::models::{
    ChatMessage, CommentPolicy, Member, MessageField, MessagePage, PageRequest, ANONYMOUS_AUTHOR,
};
use crate::permission::can_delete;
use crate::schema::aigc_chat_messages as cols;
use crate::validation::{truncate_chars, InputValidator};

/// Store for chat messages, sharing the catalog's connection pool
#[derive(Clone)]
pub struct MessageStore {
    db: Database,
}

impl MessageStore {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// The catalog this store reads documents, books and members from
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Validate and insert a message, returning its new id.
    ///
    /// `book_id` and `date` are overwritten from the resolved document and the
    /// current time; the generated id is written back into `message`.
    pub fn insert(&self, message: &mut ChatMessage) -> Result<i64> {
        InputValidator::validate_content(&message.content)?;

        if message.document_id <= 0 {
            return Err(ChatError::not_found("Document does not exist"));
        }
        let document = self
            .db
            .find_document(message.document_id)?
            .ok_or_else(|| ChatError::not_found("Document does not exist"))?;

        if message.parent_id > 0 && self.find_optional(message.parent_id)?.is_none() {
            return Err(ChatError::not_found("Parent message does not exist"));
        }

        let book = self
            .db
            .find_book(document.book_id)?
            .ok_or_else(|| ChatError::not_found("Book does not exist"))?;

        match book.comment_status {
            CommentPolicy::Closed => {
                return Err(ChatError::denied("Comments are closed for this book"));
            }
            CommentPolicy::RegisteredOnly if message.is_anonymous() => {
                return Err(ChatError::denied("Only registered members may post here"));
            }
            CommentPolicy::GroupOnly => {
                let is_participant = !message.is_anonymous()
                    && self.db.resolve_role(book.book_id, message.member_id).is_some();
                if !is_participant {
                    return Err(ChatError::denied("Only book participants may post here"));
                }
            }
            CommentPolicy::Open | CommentPolicy::RegisteredOnly => {}
        }

        if message.is_anonymous() {
            if message.author.is_empty() {
                message.author = ANONYMOUS_AUTHOR.to_string();
            }
        } else {
            let member = self
                .db
                .find_member(message.member_id)?
                .ok_or_else(|| ChatError::not_found("Member does not exist"))?;
            if member.is_disabled() {
                return Err(ChatError::denied("Member account is disabled"));
            }
        }

        InputValidator::validate_author(&message.author)?;
        InputValidator::validate_ip_address(&message.ip_address)?;
        message.user_agent = truncate_chars(&message.user_agent, cols::USER_AGENT_MAX).to_string();
        message.response = truncate_chars(&message.response, cols::RESPONSE_MAX).to_string();

        message.book_id = book.book_id;
        message.date = Utc::now();

        let conn = self.db.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                cols::TABLE,
                cols::FLOOR,
                cols::BOOK_ID,
                cols::DOCUMENT_ID,
                cols::AUTHOR,
                cols::MEMBER_ID,
                cols::IP_ADDRESS,
                cols::DATE,
                cols::CONTENT,
                cols::RESPONSE,
                cols::APPROVED,
                cols::USER_AGENT,
                cols::PARENT_ID,
                cols::AGREE_COUNT,
                cols::AGAINST_COUNT
            ),
            params![
                message.floor,
                message.book_id,
                message.document_id,
                message.author,
                message.member_id,
                message.ip_address,
                message.date,
                message.content,
                message.response,
                message.approved,
                message.user_agent,
                message.parent_id,
                message.agree_count,
                message.against_count
            ],
        )?;

        message.message_id = conn.last_insert_rowid();
        debug!(
            message_id = message.message_id,
            document_id = message.document_id,
            "Chat message stored"
        );
        Ok(message.message_id)
    }

    /// Persist only the named fields of an already stored message
    pub fn update_partial(&self, message: &ChatMessage, fields: &[MessageField]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let response = truncate_chars(&message.response, cols::RESPONSE_MAX);
        if response.len() < message.response.len() {
            warn!(
                message_id = message.message_id,
                limit = cols::RESPONSE_MAX,
                "Response truncated to column size"
            );
        }
        let user_agent = truncate_chars(&message.user_agent, cols::USER_AGENT_MAX);

        let mut assignments = Vec::with_capacity(fields.len());
        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(fields.len() + 1);
        for field in fields {
            let column = match field {
                MessageField::Response => {
                    values.push(&response);
                    cols::RESPONSE
                }
                MessageField::Content => {
                    InputValidator::validate_content(&message.content)?;
                    values.push(&message.content);
                    cols::CONTENT
                }
                MessageField::Approved => {
                    values.push(&message.approved);
                    cols::APPROVED
                }
                MessageField::Floor => {
                    values.push(&message.floor);
                    cols::FLOOR
                }
                MessageField::UserAgent => {
                    values.push(&user_agent);
                    cols::USER_AGENT
                }
            };
            assignments.push(format!("{column} = ?"));
        }
        values.push(&message.message_id);

        let conn = self.db.get_connection()?;
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET {} WHERE {} = ?",
                cols::TABLE,
                assignments.join(", "),
                cols::MESSAGE_ID
            ),
            &*values,
        )?;

        if updated == 0 {
            return Err(ChatError::not_found("Message does not exist"));
        }
        Ok(())
    }

    /// Load a message by id
    pub fn find_by_id(&self, message_id: i64) -> Result<ChatMessage> {
        self.find_optional(message_id)?
            .ok_or_else(|| ChatError::not_found("Message does not exist"))
    }

    fn find_optional(&self, message_id: i64) -> Result<Option<ChatMessage>> {
        let conn = self.db.get_connection()?;
        let message = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE {} = ?", cols::TABLE, cols::MESSAGE_ID),
                params![message_id],
                map_message,
            )
            .optional()?;
        Ok(message)
    }

    /// Remove a message; returns false when no row carried the id
    pub fn delete(&self, message_id: i64) -> Result<bool> {
        let conn = self.db.get_connection()?;
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?", cols::TABLE, cols::MESSAGE_ID),
            params![message_id],
        )?;
        if removed == 0 {
            debug!(message_id, "Delete of absent message ignored");
        }
        Ok(removed > 0)
    }

    /// One page of a document's messages, oldest first.
    ///
    /// With a viewer, each message carries whether that viewer may delete it.
    /// A document that does not exist has no messages.
    pub fn query_by_document(
        &self,
        document_id: i64,
        page: PageRequest,
        page_size: u32,
        viewer: Option<&Member>,
    ) -> Result<MessagePage> {
        InputValidator::validate_page_size(page_size)?;

        let Some(document) = self.db.find_document(document_id)? else {
            return Ok(MessagePage {
                messages: Vec::new(),
                count: 0,
                page: page.resolve(0, page_size),
            });
        };

        let (count, resolved, mut messages) = {
            let conn = self.db.get_connection()?;
            let count: i64 = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE {} = ?",
                    cols::TABLE,
                    cols::DOCUMENT_ID
                ),
                params![document_id],
                |row| row.get(0),
            )?;
            let count = u64::try_from(count).unwrap_or(0);
            let resolved = page.resolve(count, page_size);
            let offset = u64::from(resolved - 1) * u64::from(page_size);

            let mut stmt = conn.prepare(&format!(
                "SELECT * FROM {} WHERE {} = ? ORDER BY {} ASC, {} ASC LIMIT ? OFFSET ?",
                cols::TABLE,
                cols::DOCUMENT_ID,
                cols::DATE,
                cols::MESSAGE_ID
            ))?;
            let rows = stmt.query_map(
                params![
                    document_id,
                    i64::from(page_size),
                    i64::try_from(offset).unwrap_or(i64::MAX)
                ],
                map_message,
            )?;
            let messages = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            (count, resolved, messages)
        };

        let role = viewer.and_then(|member| self.db.resolve_role(document.book_id, member.member_id));
        let first_index = u64::from(resolved - 1) * u64::from(page_size);
        for (position, message) in (1_u64..).zip(messages.iter_mut()) {
            message.index = first_index + position;
            message.show_del =
                viewer.is_some_and(|member| can_delete(message, Some(member.member_id), role));
        }

        Ok(MessagePage {
            messages,
            count,
            page: resolved,
        })
    }
}

fn map_message(row: &Row) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        message_id: row.get(cols::MESSAGE_ID)?,
        floor: row.get(cols::FLOOR)?,
        book_id: row.get(cols::BOOK_ID)?,
        document_id: row.get(cols::DOCUMENT_ID)?,
        author: row.get(cols::AUTHOR)?,
        member_id: row.get(cols::MEMBER_ID)?,
        ip_address: row.get(cols::IP_ADDRESS)?,
        date: row.get(cols::DATE)?,
        content: row.get(cols::CONTENT)?,
        response: row.get(cols::RESPONSE)?,
        approved: row.get(cols::APPROVED)?,
        user_agent: row.get(cols::USER_AGENT)?,
        parent_id: row.get(cols::PARENT_ID)?,
        agree_count: row.get(cols::AGREE_COUNT)?,
        against_count: row.get(cols::AGAINST_COUNT)?,
        index: 0,
        show_del: false,
    })
}
