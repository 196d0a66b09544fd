//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use doc_chat::models::{Book, BookRole, CommentPolicy, Document, Member, MemberStatus};
use doc_chat::service::{ChatService, ChatSettings};
use doc_chat::{ChatError, Database, InferenceGateway, InferenceRequest, Result};
use tempfile::TempDir;

pub const OPEN_BOOK: i64 = 1;
pub const CLOSED_BOOK: i64 = 2;
pub const REGISTERED_BOOK: i64 = 3;
pub const GROUP_BOOK: i64 = 4;

pub const OPEN_DOC: i64 = 1;
pub const CLOSED_DOC: i64 = 2;
pub const REGISTERED_DOC: i64 = 3;
pub const GROUP_DOC: i64 = 5;

pub const OUTSIDER: i64 = 7;
pub const NINA: i64 = 9;
pub const DISABLED: i64 = 10;
pub const FOUNDER: i64 = 11;
pub const ADMIN: i64 = 12;
pub const EDITOR: i64 = 13;

/// A seeded database in a temporary directory
pub struct Fixture {
    _dir: TempDir,
    pub db: Database,
}

impl Fixture {
    pub fn member(&self, member_id: i64) -> Member {
        self.db
            .find_member(member_id)
            .expect("Failed to look up member")
            .expect("Member not seeded")
    }
}

pub fn fixture() -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = dir.path().join("chat.db");
    let db = Database::new(&db_path.to_string_lossy(), 4).expect("Failed to create database");

    let books = [
        (OPEN_BOOK, "Open Book", CommentPolicy::Open),
        (CLOSED_BOOK, "Closed Book", CommentPolicy::Closed),
        (REGISTERED_BOOK, "Members Book", CommentPolicy::RegisteredOnly),
        (GROUP_BOOK, "Team Book", CommentPolicy::GroupOnly),
    ];
    for (book_id, name, policy) in books {
        db.upsert_book(&Book {
            book_id,
            book_name: name.to_string(),
            comment_status: policy,
        })
        .expect("Failed to seed book");
    }

    let documents = [
        (OPEN_DOC, OPEN_BOOK, "Hello wiki"),
        (CLOSED_DOC, CLOSED_BOOK, "Frozen"),
        (REGISTERED_DOC, REGISTERED_BOOK, "Members only"),
        (GROUP_DOC, GROUP_BOOK, "X is Y"),
    ];
    for (document_id, book_id, markdown) in documents {
        db.upsert_document(&Document {
            document_id,
            book_id,
            document_name: format!("Document {document_id}"),
            markdown: markdown.to_string(),
        })
        .expect("Failed to seed document");
    }

    let members = [
        (OUTSIDER, "outsider", "", MemberStatus::Active),
        (NINA, "nine", "Nina", MemberStatus::Active),
        (DISABLED, "locked", "", MemberStatus::Disabled),
        (FOUNDER, "founder", "Fay", MemberStatus::Active),
        (ADMIN, "admin", "", MemberStatus::Active),
        (EDITOR, "editor", "", MemberStatus::Active),
    ];
    for (member_id, account, real_name, status) in members {
        db.upsert_member(&Member {
            member_id,
            account: account.to_string(),
            real_name: real_name.to_string(),
            status,
        })
        .expect("Failed to seed member");
    }

    let roles = [
        (OPEN_BOOK, FOUNDER, BookRole::Founder),
        (CLOSED_BOOK, FOUNDER, BookRole::Founder),
        (GROUP_BOOK, FOUNDER, BookRole::Founder),
        (OPEN_BOOK, ADMIN, BookRole::Administrator),
        (OPEN_BOOK, EDITOR, BookRole::Editor),
        (GROUP_BOOK, NINA, BookRole::Editor),
    ];
    for (book_id, member_id, role) in roles {
        db.set_role(book_id, member_id, role)
            .expect("Failed to seed relationship");
    }

    Fixture { _dir: dir, db }
}

/// Gateway returning a canned answer and recording every call
pub struct StubGateway {
    answer: std::result::Result<String, u16>,
    calls: Mutex<Vec<(String, InferenceRequest)>>,
}

impl StubGateway {
    pub fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(answer.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(status),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, InferenceRequest)> {
        self.calls.lock().expect("Poisoned lock").clone()
    }
}

#[async_trait]
impl InferenceGateway for StubGateway {
    async fn invoke(&self, path_suffix: &str, request: &InferenceRequest) -> Result<String> {
        self.calls
            .lock()
            .expect("Poisoned lock")
            .push((path_suffix.to_string(), request.clone()));
        match &self.answer {
            Ok(answer) => Ok(answer.clone()),
            Err(status) => Err(ChatError::InferenceStatus {
                status: *status,
                body: "unavailable".to_string(),
            }),
        }
    }
}

pub fn service(fixture: &Fixture, gateway: Arc<StubGateway>, settings: ChatSettings) -> ChatService {
    ChatService::new(fixture.db.clone(), gateway, settings)
}

pub fn settings(page_size: u32, require_login: bool) -> ChatSettings {
    ChatSettings {
        page_size,
        require_login,
        qa_path: "/api/get_qa".to_string(),
    }
}
