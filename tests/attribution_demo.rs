use std::sync::Arc;

use screen_services::{
    config::ServicesConfig,
    identity::{
        hashmap_backend::HashMapBackend, identity_store::IdentityStore,
        record::StatusFlag,
    },
    reporting::memory_collector::NoopCollector,
    screen::orientation::OrientationSupport,
    services::Services,
};

#[test]
fn main() {
    // Fresh install: nothing stored yet.
    let backend = HashMapBackend::new();
    let store = IdentityStore::new(backend.clone());
    assert!(store.get_attribution().unwrap().is_empty());
    assert_eq!(store.attribution_id_string().unwrap(), "");
    assert_eq!(store.get_status().unwrap(), None);

    // The external fetch yields an id, which the screen persists.
    store.save_attribution_id("abc123").unwrap();
    assert_eq!(store.attribution_id_string().unwrap(), "abc123");

    // Status is last-write-wins.
    store.save_status(2).unwrap();
    store.save_status(5).unwrap();
    assert_eq!(store.get_status().unwrap(), Some(StatusFlag(5)));

    // Simulated restart: a new store over the same storage.
    drop(store);
    let store = IdentityStore::new(backend);
    assert_eq!(store.attribution_id_string().unwrap(), "abc123");
    assert_eq!(store.get_status().unwrap(), Some(StatusFlag(5)));
    assert_eq!(
        store.get_attribution().unwrap().to_mapping().get("id"),
        Some(&serde_json::json!("abc123"))
    );
}

#[test]
fn restart_with_durable_storage() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServicesConfig {
        storage_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    let services =
        Services::open(config.clone(), Arc::new(NoopCollector)).unwrap();
    let screen = services.screen("start", OrientationSupport::Portrait);
    assert_eq!(screen.attribution_id_string().unwrap(), "");
    screen.save_attribution_id("abc123").unwrap();
    screen.save_status(0).unwrap();
    drop(screen);
    services.shutdown().unwrap();

    let services = Services::open(config, Arc::new(NoopCollector)).unwrap();
    let screen = services.screen("start", OrientationSupport::Portrait);
    assert_eq!(screen.attribution_id_string().unwrap(), "abc123");
    assert_eq!(screen.get_status().unwrap(), Some(StatusFlag(0)));
}
