#![allow(dead_code)]

use std::time::Duration;
use tessera::domain_model::LoginId;
use tessera::domain_port::TokenStore;

pub fn unique_login_id(tag: &str) -> LoginId {
    LoginId::from(format!("{}-{}", tag, uuid::Uuid::new_v4().simple()))
}

pub async fn create_check_delete(store: &dyn TokenStore, timeout_secs: u64) {
    let login_id = unique_login_id("alice");
    let token = store.create_token(&login_id).await.unwrap();

    assert!(store.check_token(&token).await.unwrap());
    assert_eq!(
        store.get_login_id(&token).await.unwrap(),
        Some(login_id.clone())
    );
    let subject = store.get_subject(&token).await.unwrap().unwrap();
    assert_eq!(
        subject.login_expire_time - subject.login_time,
        timeout_secs as i64 * 1000
    );
    let ttl = store.remaining_ttl(&token).await.unwrap().unwrap();
    assert!(ttl <= timeout_secs && ttl + 2 >= timeout_secs, "ttl = {}", ttl);

    assert!(store.delete_token(&token).await.unwrap());
    assert!(!store.check_token(&token).await.unwrap());
    assert_eq!(store.get_subject(&token).await.unwrap(), None);
    assert_eq!(store.remaining_ttl(&token).await.unwrap(), None);
    assert!(!store.delete_token(&token).await.unwrap());
    assert!(!store.refresh_token(&token).await.unwrap());
    assert!(!store.check_token(&token).await.unwrap());
}

pub async fn tokens_are_distinct(store: &dyn TokenStore) {
    let login_id = unique_login_id("bob");
    let first = store.create_token(&login_id).await.unwrap();
    let second = store.create_token(&login_id).await.unwrap();

    assert_ne!(first, second);
    assert!(store.check_token(&first).await.unwrap());
    assert!(store.check_token(&second).await.unwrap());
}

pub async fn revoke_by_login_id(store: &dyn TokenStore) {
    let a = unique_login_id("a");
    let b = unique_login_id("b");
    let a1 = store.create_token(&a).await.unwrap();
    let a2 = store.create_token(&a).await.unwrap();
    let b1 = store.create_token(&b).await.unwrap();

    assert_eq!(store.delete_token_by_login_id(&a).await.unwrap(), 2);
    assert!(!store.check_token(&a1).await.unwrap());
    assert!(!store.check_token(&a2).await.unwrap());
    assert!(store.check_token(&b1).await.unwrap());
    assert_eq!(store.get_login_id(&b1).await.unwrap(), Some(b.clone()));
    assert_eq!(store.delete_token_by_login_id(&a).await.unwrap(), 0);

    store.delete_token(&b1).await.unwrap();
}

pub async fn refresh_subject_replaces_live_only(store: &dyn TokenStore, timeout_secs: u64) {
    let login_id = unique_login_id("carol");
    let token = store.create_token(&login_id).await.unwrap();
    let subject = store.get_subject(&token).await.unwrap().unwrap();

    let renewed = subject.renewed(timeout_secs * 2);
    assert!(store.refresh_subject(&token, &renewed).await.unwrap());
    assert_eq!(store.get_subject(&token).await.unwrap(), Some(renewed.clone()));

    store.delete_token(&token).await.unwrap();
    assert!(!store.refresh_subject(&token, &renewed).await.unwrap());
    assert_eq!(store.get_subject(&token).await.unwrap(), None);
}

pub async fn blank_arguments_are_rejected(store: &dyn TokenStore) {
    assert!(
        store
            .create_token(&LoginId::from(""))
            .await
            .unwrap_err()
            .is_invalid_argument()
    );
    assert!(store.check_token(" ").await.unwrap_err().is_invalid_argument());
    assert!(store.delete_token("").await.unwrap_err().is_invalid_argument());
    assert!(
        store
            .delete_token_by_login_id(&LoginId::from("  "))
            .await
            .unwrap_err()
            .is_invalid_argument()
    );
}

/// With a two second timeout: a session refreshed halfway survives past its
/// first expiry and is gone once the refreshed lifetime runs out.
pub async fn refresh_extends_session(store: &dyn TokenStore) {
    let login_id = unique_login_id("dave");
    let token = store.create_token(&login_id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(store.check_token(&token).await.unwrap());
    assert!(store.refresh_token(&token).await.unwrap());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(store.check_token(&token).await.unwrap());

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(!store.check_token(&token).await.unwrap());
    assert_eq!(store.get_login_id(&token).await.unwrap(), None);
    assert!(!store.refresh_token(&token).await.unwrap());
}
