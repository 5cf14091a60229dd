use std::io::Write;
use std::time::Duration;

use keychain_wrapper::bootstrap::{build_keychain, load_config};
use keychain_wrapper::{KeychainError, SingleEvent};
use tempfile::NamedTempFile;

fn config_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file
}

#[test]
fn file_backed_keychain_from_config() {
    let dir = tempfile::TempDir::new().unwrap();
    let temp_file = config_file(&format!(
        r#"
        [keychain]
        root_key = "Test"

        [store]
        backend = "file"
        file_dir = "{}"
        "#,
        dir.path().display().to_string().replace('\\', "\\\\")
    ));

    let config = load_config(temp_file.path().to_path_buf()).unwrap();
    let keychain = build_keychain(&config).unwrap();
    let observable = keychain.observable();
    let timeout = Duration::from_secs(5);

    observable.upsert("InfoKey", "SecretInfo").wait(timeout).unwrap();
    assert_eq!(
        observable.fetch("InfoKey").wait(timeout).unwrap().as_deref(),
        Some("SecretInfo")
    );

    // A second keychain over the same directory sees the entry.
    let reopened = build_keychain(&config).unwrap();
    assert_eq!(
        reopened.client().fetch("InfoKey").unwrap().as_deref(),
        Some("SecretInfo")
    );

    observable.delete_all().wait(timeout).unwrap();
    assert_eq!(reopened.client().fetch("InfoKey").unwrap(), None);
}

#[test]
fn strict_missing_entry_policy_from_config() {
    let temp_file = config_file(
        r#"
        [keychain]
        root_key = "Test"
        missing_entry = "error"

        [store]
        backend = "memory"
        "#,
    );

    let config = load_config(temp_file.path().to_path_buf()).unwrap();
    let keychain = build_keychain(&config).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    keychain.observable().fetch("nope").subscribe(move |event| {
        let _ = tx.send(event);
    });
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        SingleEvent::Error(KeychainError::NotFound)
    );
}
