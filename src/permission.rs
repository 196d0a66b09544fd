//! Who may delete a chat message.

use crate::models::{BookRole, ChatMessage};

/// True iff the viewer authored the message or moderates its book.
///
/// Anonymous messages (member id 0) have no author to match, so only
/// founders and administrators can remove them.
#[must_use]
pub fn can_delete(message: &ChatMessage, viewer_member_id: Option<i64>, role: Option<BookRole>) -> bool {
    let is_author = !message.is_anonymous() && viewer_member_id == Some(message.member_id);
    is_author || role.is_some_and(BookRole::is_elevated)
}
