//! Linked-account management and mail calls against a mock backend.

use mailgate_core::models::{filter_and_sort, InboxSort, OutgoingEmail, Provider};
use mailgate_core::{AccountError, ApiClient, Mailbox, PrimaryChange, SessionContext, SessionCredential};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn signed_in() -> SessionContext {
    let session = SessionContext::ephemeral();
    session.write(SessionCredential::issue("abc123")).unwrap();
    session
}

async fn mount_accounts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/email"))
        .and(header("Authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "emails": [
                {"address": "ana@gmail.com", "type": "gmail", "isPrimary": true},
                {"address": "ana@outlook.com", "type": "outlook", "isPrimary": false}
            ]
        })))
        .mount(server)
        .await;
}

fn mailbox(server: &MockServer) -> Mailbox {
    Mailbox::new(ApiClient::new(&server.uri()).unwrap(), signed_in())
}

#[tokio::test]
async fn test_list_linked_accounts() {
    let server = MockServer::start().await;
    mount_accounts(&server).await;

    let accounts = mailbox(&server).linked_accounts().await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].provider, Provider::Gmail);
    assert!(accounts[0].is_primary);
    assert_eq!(accounts[1].provider, Provider::Outlook);
}

#[tokio::test]
async fn test_primary_account_is_never_deleted() {
    let server = MockServer::start().await;
    mount_accounts(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/email/delete"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = mailbox(&server).remove_account("ana@gmail.com").await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<AccountError>(),
        Some(&AccountError::PrimaryCannotBeDeleted("ana@gmail.com".to_string()))
    );
}

#[tokio::test]
async fn test_secondary_account_is_deleted() {
    let server = MockServer::start().await;
    mount_accounts(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/email/delete"))
        .and(body_json(serde_json::json!({"email": "ana@outlook.com"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    mailbox(&server).remove_account("ANA@outlook.com").await.unwrap();
}

#[tokio::test]
async fn test_set_primary() {
    let server = MockServer::start().await;
    mount_accounts(&server).await;
    Mock::given(method("POST"))
        .and(path("/email/set-primary"))
        .and(body_json(serde_json::json!({"email": "ana@outlook.com"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mb = mailbox(&server);
    assert_eq!(mb.set_primary("ana@outlook.com").await.unwrap(), PrimaryChange::Changed);
    // Already primary: no request
    assert_eq!(mb.set_primary("ana@gmail.com").await.unwrap(), PrimaryChange::AlreadyPrimary);
}

#[tokio::test]
async fn test_inbox_filter_and_sort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/email/inbox"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {
                    "id": "1",
                    "subject": "Invoice March",
                    "bodyPreview": "Please find attached",
                    "receivedDateTime": "2024-03-01T10:00:00Z",
                    "sender": {"emailAddress": {"name": "Billing", "address": "billing@acme.com"}}
                },
                {
                    "id": "2",
                    "subject": "Lunch?",
                    "bodyPreview": "",
                    "receivedDateTime": "2024-03-02T12:00:00Z",
                    "sender": {"emailAddress": {"name": "alice", "address": "alice@acme.com"}}
                },
                {
                    "id": "3",
                    "subject": "Invoice April",
                    "receivedDateTime": "2024-04-01T10:00:00Z",
                    "sender": {"emailAddress": {"name": "Billing", "address": "billing@acme.com"}}
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = mailbox(&server).inbox().await.unwrap();
    assert_eq!(messages.len(), 3);

    let ids: Vec<&str> = filter_and_sort(&messages, "invoice", InboxSort::Date)
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(ids, ["3", "1"]);

    let ids: Vec<&str> = filter_and_sort(&messages, "", InboxSort::Sender)
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(ids[0], "2");
}

#[tokio::test]
async fn test_send_posts_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/email/send"))
        .and(header("Authorization", "Bearer abc123"))
        .and(body_json(serde_json::json!({
            "to": "bob@example.com",
            "subject": "Hi",
            "body": "Hello Bob"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let email = OutgoingEmail {
        to: "bob@example.com".to_string(),
        subject: "Hi".to_string(),
        body: "Hello Bob".to_string(),
    };
    mailbox(&server).send(&email).await.unwrap();
}

#[tokio::test]
async fn test_expired_session_is_rejected_locally() {
    let server = MockServer::start().await;
    let session = SessionContext::ephemeral();
    session
        .write(SessionCredential::issue_at(
            "abc123",
            chrono::Utc::now() - chrono::Duration::days(8),
        ))
        .unwrap();

    let mb = Mailbox::new(ApiClient::new(&server.uri()).unwrap(), session);
    let err = mb.linked_accounts().await.unwrap_err();
    assert_eq!(err.downcast_ref::<AccountError>(), Some(&AccountError::NotSignedIn));
    assert!(server.received_requests().await.unwrap().is_empty());
}
