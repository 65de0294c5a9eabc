//! Integration tests for the Registry Actor.
//!
//! These tests drive the registry through `spawn_registry_with_rng()` and the
//! `RegistryHandle` interface, the same way the listeners do.
//!
//! Tests CAN use `.unwrap()` and `.expect()`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use registry_core::ServerAddress;
use registryd::registry::{spawn_registry, spawn_registry_with_rng, RegistryError, RegistryHandle};

// ============================================================================
// Test Helpers
// ============================================================================

fn seeded_registry() -> RegistryHandle {
    spawn_registry_with_rng(StdRng::seed_from_u64(42))
}

async fn add(handle: &RegistryHandle, name: &str) {
    handle
        .add_server(name, ServerAddress::new("localhost", 6767))
        .await
        .expect("add server");
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_basic_lifecycle() {
    let handle = spawn_registry();

    add(&handle, "s1").await;

    let server = handle.lookup("").await.expect("lookup should succeed");
    assert_eq!(server.name, "s1");
    assert_eq!(server.address, ServerAddress::new("localhost", 6767));
    assert!(!server.full);

    assert!(handle.is_connected());
}

#[tokio::test]
async fn test_remove_then_lookup_fails() {
    let handle = seeded_registry();

    add(&handle, "s").await;
    handle.remove_server("s").await.unwrap();

    let result = handle.lookup("lobby").await;
    assert!(matches!(result, Err(RegistryError::NoServersFound(_))));
}

#[tokio::test]
async fn test_full_then_ready() {
    let handle = seeded_registry();

    add(&handle, "s").await;
    handle.set_full("s", true).await.unwrap();
    assert!(handle.lookup("lobby").await.is_err());

    handle.set_full("s", false).await.unwrap();
    assert_eq!(handle.lookup("lobby").await.unwrap().name, "s");
}

#[tokio::test]
async fn test_readd_overwrites() {
    let handle = seeded_registry();

    add(&handle, "s").await;
    handle.add_room("s", "lobby").await.unwrap();
    handle
        .add_server("s", ServerAddress::new("10.0.0.2", 7000))
        .await
        .unwrap();

    let servers = handle.servers().await;
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].address, ServerAddress::new("10.0.0.2", 7000));
    assert!(servers[0].rooms.is_empty());
}

#[tokio::test]
async fn test_unknown_targets_are_noops() {
    let handle = seeded_registry();

    handle.remove_server("ghost").await.unwrap();
    handle.set_full("ghost", true).await.unwrap();
    handle.add_room("ghost", "lobby").await.unwrap();
    handle.remove_room("ghost", "lobby").await.unwrap();

    assert!(handle.servers().await.is_empty());
}

// ============================================================================
// Selection Tests
// ============================================================================

#[tokio::test]
async fn test_room_locality_holds_over_many_lookups() {
    let handle = seeded_registry();

    add(&handle, "A").await;
    add(&handle, "B").await;
    handle.add_room("B", "room").await.unwrap();

    for _ in 0..1000 {
        assert_eq!(handle.lookup("room").await.unwrap().name, "B");
    }

    let servers = handle.servers().await;
    let b = servers.iter().find(|s| s.name == "B").unwrap();
    assert_eq!(b.room("room").unwrap().hits, 1000);
}

#[tokio::test]
async fn test_popularity_wins() {
    let handle = seeded_registry();

    add(&handle, "A").await;
    add(&handle, "B").await;
    handle.add_room("A", "room").await.unwrap();
    handle.add_room("B", "room").await.unwrap();

    // First lookup breaks the tie in scan order, then A stays ahead
    for _ in 0..20 {
        assert_eq!(handle.lookup("room").await.unwrap().name, "A");
    }
}

#[tokio::test]
async fn test_full_room_holder_is_skipped() {
    let handle = seeded_registry();

    add(&handle, "A").await;
    add(&handle, "B").await;
    handle.add_room("B", "room").await.unwrap();
    handle.set_full("B", true).await.unwrap();

    for _ in 0..50 {
        assert_eq!(handle.lookup("room").await.unwrap().name, "A");
    }
}

#[tokio::test]
async fn test_repopulating_resets_hits() {
    let handle = seeded_registry();

    add(&handle, "A").await;
    handle.add_room("A", "room").await.unwrap();
    for _ in 0..5 {
        handle.lookup("room").await.unwrap();
    }

    handle.add_room("A", "room").await.unwrap();

    let servers = handle.servers().await;
    assert_eq!(servers[0].room("room").unwrap().hits, 0);
}

#[tokio::test]
async fn test_same_seed_same_choices() {
    let first = seeded_registry();
    let second = seeded_registry();

    for name in ["a", "b", "c", "d", "e"] {
        add(&first, name).await;
        add(&second, name).await;
    }

    for _ in 0..50 {
        let x = first.lookup("nowhere").await.unwrap();
        let y = second.lookup("nowhere").await.unwrap();
        assert_eq!(x.name, y.name);
    }
}

#[tokio::test]
async fn test_clear_forgets_everything() {
    let handle = seeded_registry();

    add(&handle, "A").await;
    add(&handle, "B").await;
    handle.clear().await.unwrap();

    assert!(handle.servers().await.is_empty());
    assert!(handle.ready_servers().await.is_empty());
    assert!(handle.lookup("room").await.is_err());
}

// ============================================================================
// Telemetry Tests
// ============================================================================

#[tokio::test]
async fn test_telemetry_counts_all_lookups() {
    let handle = seeded_registry();

    // Failed lookup
    let _ = handle.lookup("room").await;
    add(&handle, "A").await;
    handle.lookup("room").await.unwrap();
    handle.lookup("other").await.unwrap();

    let snapshot = handle.take_telemetry().await.unwrap();
    assert_eq!(snapshot.lookups, 3);
    assert_eq!(snapshot.servers.len(), 1);

    let snapshot = handle.take_telemetry().await.unwrap();
    assert_eq!(snapshot.lookups, 0);
}

#[tokio::test]
async fn test_concurrent_handles() {
    let handle = seeded_registry();
    add(&handle, "A").await;

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let h = handle.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..10 {
                h.lookup("room").await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(handle.take_telemetry().await.unwrap().lookups, 100);
}
