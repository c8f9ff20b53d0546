//! Needs a running Redis: `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`

mod common;

use tessera::application_impl::token_generator;
use tessera::application_port::TokenStyle;
use tessera::domain_port::TokenStoreConfig;
use tessera::infra_redis::RedisTokenStore;

async fn store(timeout_secs: u64) -> RedisTokenStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let client = redis::Client::open(url).unwrap();
    let manager = client.get_connection_manager().await.unwrap();

    // Own prefix per run so scans only see this test's keys.
    RedisTokenStore::new(
        manager,
        token_generator(TokenStyle::Uuid, 1),
        TokenStoreConfig {
            token_prefix: format!("tessera_test:{}:", uuid::Uuid::new_v4().simple()),
            timeout_secs,
        },
    )
}

#[tokio::test]
#[ignore] // Requires actual Redis
async fn test_create_check_delete() {
    let store = store(60).await;
    common::create_check_delete(&store, 60).await;
    common::tokens_are_distinct(&store).await;
}

#[tokio::test]
#[ignore] // Requires actual Redis
async fn test_revoke_by_login_id() {
    let store = store(60).await;
    common::revoke_by_login_id(&store).await;
}

#[tokio::test]
#[ignore] // Requires actual Redis
async fn test_refresh_subject() {
    let store = store(60).await;
    common::refresh_subject_replaces_live_only(&store, 60).await;
    common::blank_arguments_are_rejected(&store).await;
}

#[tokio::test]
#[ignore] // Requires actual Redis
async fn test_refresh_extends_session() {
    let store = store(2).await;
    common::refresh_extends_session(&store).await;
}
