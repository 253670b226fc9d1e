//! End-to-end session behaviour across simulated requests

use std::sync::Arc;

use sesscgi_core::{RequestContext, SessionStore, SessionToken};
use sesscgi_web::{
    FileSessionStore, MemorySessionStore, SessionResolver, StateHandler, NO_DATA_PLACEHOLDER,
};

fn token(raw: &str) -> SessionToken {
    SessionToken::parse(raw).unwrap()
}

/// Both backends must honour the same read/write/delete contract
fn stores(dir: &tempfile::TempDir) -> Vec<Arc<dyn SessionStore>> {
    vec![
        Arc::new(FileSessionStore::new(dir.path().join("sessions"))),
        Arc::new(MemorySessionStore::new()),
    ]
}

#[tokio::test]
async fn test_store_contract() {
    let dir = tempfile::tempdir().unwrap();

    for store in stores(&dir) {
        let backend = store.backend_name();
        let t = token("contract-token");

        assert_eq!(store.read(&token("never")).await.unwrap(), None, "{backend}");

        store.write(&t, "V1").await.unwrap();
        assert_eq!(store.read(&t).await.unwrap().as_deref(), Some("V1"), "{backend}");

        store.write(&t, "V2").await.unwrap();
        assert_eq!(store.read(&t).await.unwrap().as_deref(), Some("V2"), "{backend}");

        store.delete(&t).await.unwrap();
        assert_eq!(store.read(&t).await.unwrap(), None, "{backend}");

        // deleting again is a no-op
        store.delete(&t).await.unwrap();
        assert_eq!(store.read(&t).await.unwrap(), None, "{backend}");
    }
}

#[tokio::test]
async fn test_tokens_do_not_share_records() {
    let dir = tempfile::tempdir().unwrap();

    for store in stores(&dir) {
        store.write(&token("alpha"), "A").await.unwrap();
        store.write(&token("beta"), "B").await.unwrap();
        store.delete(&token("alpha")).await.unwrap();

        assert_eq!(store.read(&token("alpha")).await.unwrap(), None);
        assert_eq!(store.read(&token("beta")).await.unwrap().as_deref(), Some("B"));
    }
}

fn file_handler(dir: &tempfile::TempDir, cookie_name: &str) -> StateHandler {
    StateHandler::new(
        SessionResolver::new(cookie_name, "/"),
        Arc::new(FileSessionStore::new(dir.path())),
    )
}

#[tokio::test]
async fn test_first_visit_gets_placeholder_and_cookie() {
    let dir = tempfile::tempdir().unwrap();
    let handler = file_handler(&dir, "sess");

    let response = handler
        .handle(&RequestContext::get().with_cookie(""))
        .await
        .unwrap();

    assert!(response.body.contains(NO_DATA_PLACEHOLDER));
    let set_cookie = response.header("Set-Cookie").expect("Set-Cookie header");
    assert!(set_cookie.starts_with("sess="));
    assert!(set_cookie.ends_with("; Path=/"));

    let minted = set_cookie
        .trim_start_matches("sess=")
        .trim_end_matches("; Path=/");
    assert!(SessionToken::is_safe(minted));
}

#[tokio::test]
async fn test_save_then_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let handler = file_handler(&dir, "sess");

    let response = handler
        .handle(&RequestContext::post("username=Alice").with_cookie("sess=T1"))
        .await
        .unwrap();
    assert!(response.body.contains("Alice"));
    assert!(response.header("Set-Cookie").is_none());

    let response = handler
        .handle(&RequestContext::get().with_cookie("sess=T1"))
        .await
        .unwrap();
    assert!(response.body.contains("Alice"));
    assert!(!response.body.contains(NO_DATA_PLACEHOLDER));
}

#[tokio::test]
async fn test_clear_removes_record() {
    let dir = tempfile::tempdir().unwrap();
    let handler = file_handler(&dir, "sess");

    handler
        .handle(&RequestContext::post("username=Alice").with_cookie("sess=T1"))
        .await
        .unwrap();

    let response = handler
        .handle(&RequestContext::post("username=CLEAR").with_cookie("sess=T1"))
        .await
        .unwrap();
    assert!(response.body.contains("Session data cleared."));
    assert!(!dir.path().join("T1").exists());

    let response = handler
        .handle(&RequestContext::get().with_cookie("sess=T1"))
        .await
        .unwrap();
    assert!(response.body.contains(NO_DATA_PLACEHOLDER));
    assert!(!response.body.contains("Alice"));
}

#[tokio::test]
async fn test_cookie_among_other_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let handler = file_handler(&dir, "go_sess_id");

    handler
        .handle(
            &RequestContext::post("username=Bob").with_cookie("theme=dark; go_sess_id=abc123; x=1"),
        )
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(dir.path().join("abc123")).unwrap(), "Bob");
}

#[tokio::test]
async fn test_new_sessions_get_distinct_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let handler = file_handler(&dir, "sess");

    let first = handler.handle(&RequestContext::get()).await.unwrap();
    let second = handler.handle(&RequestContext::get()).await.unwrap();

    assert_ne!(first.header("Set-Cookie"), second.header("Set-Cookie"));
}

#[tokio::test]
async fn test_minted_session_persists_across_requests() {
    let dir = tempfile::tempdir().unwrap();
    let handler = file_handler(&dir, "sess");

    let response = handler
        .handle(&RequestContext::post("username=Carol"))
        .await
        .unwrap();
    let set_cookie = response.header("Set-Cookie").unwrap().to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let response = handler
        .handle(&RequestContext::get().with_cookie(cookie))
        .await
        .unwrap();
    assert!(response.body.contains("Carol"));
}

#[tokio::test]
async fn test_unsafe_cookie_is_never_echoed() {
    let dir = tempfile::tempdir().unwrap();
    let handler = file_handler(&dir, "sess");

    let response = handler
        .handle(&RequestContext::post("username=Mallory").with_cookie("sess=..%2F..%2Fetc"))
        .await
        .unwrap();

    let set_cookie = response.header("Set-Cookie").unwrap();
    assert!(!set_cookie.contains(".."));
    assert!(!set_cookie.contains('%'));
}
