use std::sync::Arc;

use kw_app::KeychainClient;
use kw_core::{CredentialStorePort, Namespace, QueryBuilder};
use kw_platform::FileCredentialStore;

fn client(dir: &std::path::Path, namespace: Namespace) -> KeychainClient {
    let store: Arc<dyn CredentialStorePort> =
        Arc::new(FileCredentialStore::in_dir(dir.to_path_buf()).expect("create store dir"));
    KeychainClient::new(store, namespace)
}

#[test]
fn secrets_survive_a_new_client() {
    let dir = tempfile::TempDir::new().unwrap();

    client(dir.path(), Namespace::new("Test"))
        .upsert("InfoKey", "SecretInfo")
        .unwrap();

    let reopened = client(dir.path(), Namespace::new("Test"));
    assert_eq!(
        reopened.fetch("InfoKey").unwrap().as_deref(),
        Some("SecretInfo")
    );
}

#[test]
fn access_groups_partition_the_same_root_key() {
    let dir = tempfile::TempDir::new().unwrap();
    let store: Arc<dyn CredentialStorePort> =
        Arc::new(FileCredentialStore::in_dir(dir.path().to_path_buf()).unwrap());

    let scoped = |group: &str| {
        let namespace = Namespace::with_access_group("Test", group);
        KeychainClient::new(Arc::clone(&store), namespace.clone())
            .with_query_builder(QueryBuilder::new(namespace).with_access_group_scoping(true))
    };
    let first = scoped("group.first");
    let second = scoped("group.second");

    first.upsert("k", "one").unwrap();
    second.upsert("k", "two").unwrap();
    assert_eq!(first.fetch("k").unwrap().as_deref(), Some("one"));
    assert_eq!(second.fetch("k").unwrap().as_deref(), Some("two"));

    first.delete_all().unwrap();
    assert_eq!(first.fetch("k").unwrap(), None);
    assert_eq!(second.fetch("k").unwrap().as_deref(), Some("two"));
}

#[test]
fn upsert_replaces_value_on_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let client = client(dir.path(), Namespace::new("Test"));

    client.upsert("InfoKey", "A").unwrap();
    client.upsert("InfoKey", "B").unwrap();
    assert_eq!(client.fetch("InfoKey").unwrap().as_deref(), Some("B"));

    client.delete("InfoKey").unwrap();
    client.delete("InfoKey").unwrap();
    assert_eq!(client.fetch("InfoKey").unwrap(), None);
}

#[test]
fn shared_client_survives_concurrent_upserts_of_one_key() {
    let dir = tempfile::TempDir::new().unwrap();
    let client = Arc::new(client(dir.path(), Namespace::new("Test")));
    client.upsert("InfoKey", "seed").unwrap();

    let payloads = ["a".repeat(1 << 20), "b".repeat(1 << 20)];
    let workers: Vec<_> = payloads
        .iter()
        .cloned()
        .map(|payload| {
            let client = Arc::clone(&client);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    client.upsert("InfoKey", &payload).expect("upsert");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let stored = client.fetch("InfoKey").unwrap().expect("entry present");
    assert!(
        payloads.contains(&stored),
        "torn value of {} bytes",
        stored.len()
    );
}
