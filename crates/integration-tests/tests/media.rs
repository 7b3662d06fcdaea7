//! Media library and sync planning against a real directory tree.

#![allow(clippy::unwrap_used)]

use emporium_admin::services::media::{MediaLibrary, SyncDirection, SyncEvent, SyncPlan, upload_key};

#[tokio::test]
async fn test_library_lists_only_media_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let library = MediaLibrary::new(dir.path());

    library.write("products/teapot.jpg", b"jpeg").await.unwrap();
    library.write("banner.png", b"png").await.unwrap();
    library.write("notes.txt", b"not media").await.unwrap();

    let keys: Vec<String> = library
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.key)
        .collect();
    assert_eq!(keys, vec!["banner.png", "products/teapot.jpg"]);
}

#[tokio::test]
async fn test_missing_root_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let library = MediaLibrary::new(dir.path().join("not-created-yet"));
    assert!(library.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_key_lands_in_folder() {
    let dir = tempfile::tempdir().unwrap();
    let library = MediaLibrary::new(dir.path());

    let key = upload_key("Summer Hat.JPG", Some("/brands/")).unwrap();
    assert_eq!(key, "brands/summer-hat.jpg");

    library.write(&key, b"jpeg").await.unwrap();
    assert!(library.exists(&key).await.unwrap());
    assert!(dir.path().join("brands/summer-hat.jpg").is_file());
}

#[tokio::test]
async fn test_library_rejects_escaping_keys() {
    let dir = tempfile::tempdir().unwrap();
    let library = MediaLibrary::new(dir.path());

    assert!(library.write("../outside.jpg", b"x").await.is_err());
    assert!(library.read("/etc/passwd").await.is_err());
}

#[tokio::test]
async fn test_plan_from_library_listing() {
    let dir = tempfile::tempdir().unwrap();
    let library = MediaLibrary::new(dir.path());
    library.write("a.jpg", b"a").await.unwrap();
    library.write("shared.png", b"s").await.unwrap();

    let local: Vec<String> = library
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.key)
        .collect();
    let remote = ["shared.png", "remote/b.webp", "readme.md"];

    let both = SyncPlan::build(&local, remote, SyncDirection::Both);
    assert_eq!(both.to_upload, vec!["a.jpg"]);
    assert_eq!(both.to_download, vec!["remote/b.webp"]);
    assert_eq!(both.already_synced, 1);
    assert_eq!(both.total(), 2);

    let upload = SyncPlan::build(&local, remote, SyncDirection::Upload);
    assert_eq!(upload.to_upload, vec!["a.jpg"]);
    assert!(upload.to_download.is_empty());
}

#[test]
fn test_error_event_is_one_ndjson_line() {
    let line = SyncEvent::Error {
        message: "listing failed".to_owned(),
    }
    .to_ndjson();

    assert!(line.ends_with('\n'));
    assert_eq!(line.matches('\n').count(), 1);
    let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(value["type"], "error");
    assert_eq!(value["message"], "listing failed");
}
