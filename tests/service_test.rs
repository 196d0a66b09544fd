//! Integration tests for chat request handling

mod common;

use common::*;
use doc_chat::models::{RequestOrigin, ANONYMOUS_AUTHOR};
use doc_chat::{ChatError, InferenceRequest, PageRequest};

fn origin() -> RequestOrigin {
    RequestOrigin {
        ip_address: "192.168.1.20".to_string(),
        user_agent: "Mozilla/5.0".to_string(),
    }
}

#[tokio::test]
async fn test_member_question_is_answered_and_stored() {
    let fixture = fixture();
    let gateway = StubGateway::answering("Y");
    let service = service(&fixture, gateway.clone(), settings(10, true));
    let nina = fixture.member(NINA);

    let message = service
        .chat(GROUP_DOC, "What is X?", None, Some(&nina), &origin())
        .await
        .expect("Chat failed");
    assert_eq!(message.response, "Y");

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/api/get_qa");
    assert_eq!(
        calls[0].1,
        InferenceRequest::Question {
            input: "X is Y".to_string(),
            question: "What is X?".to_string(),
        }
    );

    let listing = service
        .list_messages(GROUP_DOC, PageRequest::Last, Some(&nina))
        .expect("Listing failed");
    assert_eq!(listing.doc_id, GROUP_DOC);
    assert_eq!(listing.page.total_count, 1);
    let stored = &listing.page.list[0];
    assert_eq!(stored.content, "What is X?");
    assert_eq!(stored.response, "Y");
    assert_eq!(stored.author, "Nina");
    assert_eq!(stored.member_id, NINA);
    assert_eq!(stored.book_id, GROUP_BOOK);
    assert_eq!(stored.ip_address, "192.168.1.20");
    assert_eq!(stored.user_agent, "Mozilla/5.0");
    assert!(stored.show_del);
}

#[tokio::test]
async fn test_custom_question_path_is_used() {
    let fixture = fixture();
    let gateway = StubGateway::answering("ok");
    let service = service(&fixture, gateway.clone(), settings(10, true));
    let nina = fixture.member(NINA);

    service
        .chat(OPEN_DOC, "hi", Some("/api/v2/qa"), Some(&nina), &origin())
        .await
        .expect("Chat failed");
    assert_eq!(gateway.calls()[0].0, "/api/v2/qa");
}

#[tokio::test]
async fn test_outsider_is_refused_on_group_book() {
    let fixture = fixture();
    let gateway = StubGateway::answering("Y");
    let service = service(&fixture, gateway.clone(), settings(10, true));
    let outsider = fixture.member(OUTSIDER);

    let err = service
        .chat(GROUP_DOC, "What is X?", None, Some(&outsider), &origin())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::PermissionDenied(_)));
    assert!(gateway.calls().is_empty());

    let listing = service
        .list_messages(GROUP_DOC, PageRequest::Number(1), None)
        .expect("Listing failed");
    assert_eq!(listing.page.total_count, 0);
}

#[tokio::test]
async fn test_inference_failure_keeps_unanswered_prompt() {
    let fixture = fixture();
    let service = service(&fixture, StubGateway::failing(500), settings(10, true));
    let nina = fixture.member(NINA);

    let err = service
        .chat(OPEN_DOC, "Anyone?", None, Some(&nina), &origin())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::InferenceStatus { status: 500, .. }));

    let listing = service
        .list_messages(OPEN_DOC, PageRequest::Number(1), None)
        .expect("Listing failed");
    assert_eq!(listing.page.total_count, 1);
    assert_eq!(listing.page.list[0].content, "Anyone?");
    assert_eq!(listing.page.list[0].response, "");
}

#[tokio::test]
async fn test_anonymous_chat_when_login_not_required() {
    let fixture = fixture();
    let service = service(&fixture, StubGateway::answering("hello"), settings(10, false));

    let message = service
        .chat(OPEN_DOC, "hi", None, None, &origin())
        .await
        .expect("Chat failed");
    assert_eq!(message.author, ANONYMOUS_AUTHOR);
    assert_eq!(message.member_id, 0);

    let err = service
        .chat(REGISTERED_DOC, "hi", None, None, &origin())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_anonymous_chat_refused_when_login_required() {
    let fixture = fixture();
    let gateway = StubGateway::answering("hello");
    let service = service(&fixture, gateway.clone(), settings(10, true));

    let err = service
        .chat(OPEN_DOC, "hi", None, None, &origin())
        .await
        .unwrap_err();
    assert_eq!(err.code(), 403);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_analyze_stores_method_as_content() {
    let fixture = fixture();
    let gateway = StubGateway::answering("A greeting.");
    let service = service(&fixture, gateway.clone(), settings(10, true));
    let nina = fixture.member(NINA);

    let message = service
        .analyze(OPEN_DOC, "/api/summary", Some(&nina), &origin())
        .await
        .expect("Analyze failed");
    assert_eq!(message.content, "/api/summary");
    assert_eq!(message.response, "A greeting.");

    let calls = gateway.calls();
    assert_eq!(calls[0].0, "/api/summary");
    assert_eq!(
        calls[0].1,
        InferenceRequest::Analyze {
            data: "Hello wiki".to_string()
        }
    );
}

#[tokio::test]
async fn test_analyze_rejects_bad_methods() {
    let fixture = fixture();
    let gateway = StubGateway::answering("unused");
    let service = service(&fixture, gateway.clone(), settings(10, true));
    let nina = fixture.member(NINA);

    for api in ["", "api/summary", "/../admin", "//evil.example.com", "/a b", "@evil.example.com"] {
        let result = service.analyze(OPEN_DOC, api, Some(&nina), &origin()).await;
        assert!(
            matches!(result, Err(ChatError::Validation(_))),
            "{api:?} should be rejected"
        );
    }
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_chat_on_missing_document() {
    let fixture = fixture();
    let service = service(&fixture, StubGateway::answering("unused"), settings(10, true));
    let nina = fixture.member(NINA);

    let err = service
        .chat(404, "hi", None, Some(&nina), &origin())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_permissions() {
    let fixture = fixture();
    let service = service(&fixture, StubGateway::answering("ok"), settings(10, true));
    let nina = fixture.member(NINA);

    let first = service
        .chat(OPEN_DOC, "first", None, Some(&nina), &origin())
        .await
        .expect("Chat failed");
    let second = service
        .chat(OPEN_DOC, "second", None, Some(&nina), &origin())
        .await
        .expect("Chat failed");

    let editor = fixture.member(EDITOR);
    let err = service
        .delete_message(first.message_id, Some(&editor))
        .unwrap_err();
    assert!(matches!(err, ChatError::PermissionDenied(_)));
    assert!(matches!(
        service.delete_message(first.message_id, None),
        Err(ChatError::PermissionDenied(_))
    ));

    service
        .delete_message(first.message_id, Some(&nina))
        .expect("Author delete failed");
    let admin = fixture.member(ADMIN);
    service
        .delete_message(second.message_id, Some(&admin))
        .expect("Admin delete failed");

    let listing = service
        .list_messages(OPEN_DOC, PageRequest::Number(1), None)
        .expect("Listing failed");
    assert_eq!(listing.page.total_count, 0);
}

#[tokio::test]
async fn test_delete_missing_message_is_not_found() {
    let fixture = fixture();
    let service = service(&fixture, StubGateway::answering("ok"), settings(10, true));
    let admin = fixture.member(ADMIN);

    let err = service.delete_message(987_654, Some(&admin)).unwrap_err();
    assert!(matches!(err, ChatError::NotFound(_)));
}

#[tokio::test]
async fn test_listing_pages_with_configured_size() {
    let fixture = fixture();
    let service = service(&fixture, StubGateway::answering("ok"), settings(2, true));
    let nina = fixture.member(NINA);

    for n in 1..=5 {
        service
            .chat(OPEN_DOC, &format!("q{n}"), None, Some(&nina), &origin())
            .await
            .expect("Chat failed");
    }

    let last = service
        .list_messages(OPEN_DOC, PageRequest::from(-1), None)
        .expect("Listing failed");
    assert_eq!(last.page.page_index, 3);
    assert_eq!(last.page.page_size, 2);
    assert_eq!(last.page.total_page, 3);
    assert_eq!(last.page.list.len(), 1);
    assert_eq!(last.page.list[0].content, "q5");
    assert_eq!(last.page.list[0].index, 5);

    let first = service
        .list_messages(OPEN_DOC, PageRequest::from(0), None)
        .expect("Listing failed");
    assert_eq!(first.page.page_index, 1);
    assert_eq!(first.page.list[0].content, "q1");
}
