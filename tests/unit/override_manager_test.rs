//! Unit tests for manual per-domain overrides and the injection decision.

use std::sync::Arc;

use rstest::rstest;
use serde_json::json;

use docsfocus::managers::override_manager::{
    origin_patterns, web_domain, OverrideManager, OverrideManagerTrait,
};
use docsfocus::storage::{keys, FallbackStore};

fn setup() -> (OverrideManager, Arc<FallbackStore>) {
    let store = Arc::new(FallbackStore::ephemeral());
    (OverrideManager::new(store.clone()), store)
}

#[tokio::test]
async fn test_no_overrides_by_default() {
    let (manager, _) = setup();
    assert!(manager.get_manual_overrides().await.is_empty());
}

#[tokio::test]
async fn test_enable_disable_and_clear() {
    let (manager, _) = setup();

    let table = manager
        .update_manual_override("Blog.Example.com", Some(true))
        .await
        .unwrap();
    assert_eq!(table.decision("blog.example.com"), Some(true));
    assert!(table.get("blog.example.com").unwrap().timestamp > 0);

    let table = manager
        .update_manual_override("blog.example.com", Some(false))
        .await
        .unwrap();
    assert_eq!(table.decision("blog.example.com"), Some(false));

    let table = manager
        .update_manual_override("blog.example.com", None)
        .await
        .unwrap();
    assert!(table.is_empty());
    assert!(manager.get_manual_overrides().await.is_empty());
}

#[tokio::test]
async fn test_blank_domain_is_ignored() {
    let (manager, store) = setup();
    let table = manager.update_manual_override("   ", Some(true)).await.unwrap();
    assert!(table.is_empty());
    assert!(store.get_lenient(keys::MANUAL_OVERRIDES).await.is_none());
}

#[tokio::test]
async fn test_overrides_are_stored_with_timestamps() {
    let (manager, store) = setup();
    manager
        .update_manual_override("a.example.com", Some(true))
        .await
        .unwrap();
    let raw = store.get_lenient(keys::MANUAL_OVERRIDES).await.unwrap();
    assert_eq!(raw["a.example.com"]["enabled"], true);
    assert!(raw["a.example.com"]["timestamp"].is_i64());
}

#[tokio::test]
async fn test_malformed_stored_entries_are_dropped() {
    let (manager, store) = setup();
    store
        .set_one(
            keys::MANUAL_OVERRIDES,
            json!({"good.example.com": {"enabled": false}, "bad.example.com": "yes"}),
        )
        .await
        .unwrap();
    let table = manager.get_manual_overrides().await;
    assert_eq!(table.decision("good.example.com"), Some(false));
    assert_eq!(table.decision("bad.example.com"), None);
}

// ─── Injection ───

#[rstest]
#[case("https://blog.example.com/post", true)]
#[case("http://BLOG.example.com/", true)]
#[case("https://other.example.com/", false)]
#[case("file:///blog.example.com/index.html", false)]
#[case("chrome://extensions", false)]
#[case("garbage", false)]
#[tokio::test]
async fn test_should_inject_only_for_enabled_web_domains(#[case] url: &str, #[case] expected: bool) {
    let (manager, _) = setup();
    manager
        .update_manual_override("blog.example.com", Some(true))
        .await
        .unwrap();
    manager
        .update_manual_override("other.example.com", Some(false))
        .await
        .unwrap();
    assert_eq!(manager.should_inject(url).await, expected);
}

// ─── Helpers ───

#[test]
fn test_origin_patterns_cover_both_schemes() {
    assert_eq!(
        origin_patterns(" Docs.Example.com "),
        vec!["https://docs.example.com/*", "http://docs.example.com/*"]
    );
    assert!(origin_patterns("").is_empty());
}

#[rstest]
#[case("https://Docs.Example.com/path?q=1", Some("docs.example.com"))]
#[case("http://localhost:8080/", Some("localhost"))]
#[case("ftp://files.example.com/", None)]
#[case("about:blank", None)]
#[case("not a url", None)]
fn test_web_domain(#[case] url: &str, #[case] expected: Option<&str>) {
    assert_eq!(web_domain(url).as_deref(), expected);
}

#[tokio::test]
async fn test_host_permission_grant_and_revoke() {
    let (manager, _) = setup();
    assert!(!manager.has_host_permission("docs.example.com").await);

    assert!(manager.request_host_permission(" Docs.Example.com ").await);
    assert!(manager.has_host_permission("docs.example.com").await);
    assert_eq!(manager.granted_domains().await, vec!["docs.example.com"]);

    assert!(manager.revoke_host_permission("docs.example.com").await);
    assert!(!manager.revoke_host_permission("docs.example.com").await);
    assert!(!manager.has_host_permission("docs.example.com").await);
}

#[tokio::test]
async fn test_blank_domain_permission_is_refused() {
    let (manager, _) = setup();
    assert!(!manager.request_host_permission("  ").await);
    assert!(manager.granted_domains().await.is_empty());
}
