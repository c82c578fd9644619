use callbridge_config::StoreConfig;
use callbridge_store::{
    prepare_store, CallInfo, MemoryPreferenceStore, PreferenceKey, PreferenceStore,
    SessionCredentials, SqlitePreferenceStore,
};
use tempfile::TempDir;

async fn sqlite_store(dir: &TempDir) -> SqlitePreferenceStore {
    let config = StoreConfig {
        url: format!("sqlite://{}", dir.path().join("prefs.db").display()),
        max_connections: 1,
    };
    SqlitePreferenceStore::new(prepare_store(&config).await.expect("store should open"))
}

fn full_credentials() -> SessionCredentials {
    SessionCredentials {
        auth_token: Some("auth".into()),
        refresh_token: Some("refresh".into()),
        device_id: Some("device".into()),
        push_token: Some("push".into()),
    }
}

async fn exercise_credentials(store: &dyn PreferenceStore) {
    assert_eq!(store.credentials().await.unwrap(), SessionCredentials::default());

    store.save_credentials(&full_credentials()).await.unwrap();
    assert_eq!(store.credentials().await.unwrap(), full_credentials());

    store.clear_session_tokens().await.unwrap();
    let remaining = store.credentials().await.unwrap();
    assert_eq!(remaining.auth_token, None);
    assert_eq!(remaining.refresh_token, None);
    assert_eq!(remaining.device_id.as_deref(), Some("device"));
    assert_eq!(remaining.push_token.as_deref(), Some("push"));

    store.clear().await.unwrap();
    assert_eq!(store.credentials().await.unwrap(), SessionCredentials::default());
}

#[tokio::test]
async fn memory_store_manages_credentials() {
    exercise_credentials(&MemoryPreferenceStore::new()).await;
}

#[tokio::test]
async fn sqlite_store_manages_credentials() {
    let dir = TempDir::new().unwrap();
    exercise_credentials(&sqlite_store(&dir).await).await;
}

#[tokio::test]
async fn sqlite_store_overwrites_existing_values() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;

    store
        .set(PreferenceKey::AuthToken, Some("first".into()))
        .await
        .unwrap();
    store
        .set(PreferenceKey::AuthToken, Some("second".into()))
        .await
        .unwrap();

    assert_eq!(
        store.get(PreferenceKey::AuthToken).await.unwrap().as_deref(),
        Some("second")
    );
}

#[tokio::test]
async fn sqlite_store_persists_last_call_across_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = sqlite_store(&dir).await;
        store
            .set_last_call(Some(CallInfo {
                call_id: "CALL-1".into(),
                caller_display_name: Some("+447700900000".into()),
            }))
            .await
            .unwrap();
        store.pool().close().await;
    }

    let reopened = sqlite_store(&dir).await;
    let call = reopened.last_call().await.unwrap().expect("call persisted");
    assert_eq!(call.call_id, "CALL-1");
    assert_eq!(call.caller_display_name.as_deref(), Some("+447700900000"));

    reopened.remove(PreferenceKey::CallId).await.unwrap();
    assert_eq!(reopened.last_call().await.unwrap(), None);
}
