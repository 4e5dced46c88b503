//! Import runner tests against file-backed databases.

use std::io::Write;

use serde_json::json;
use tempfile::{NamedTempFile, TempDir};

use bulk_upsert::{init_db_pool_with_path, run_import, Config, SqliteCollection};

fn write_lines(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    for line in lines {
        writeln!(file, "{line}").expect("Failed to write line");
    }
    file
}

#[tokio::test]
async fn test_import_merges_on_unique_attr_and_skips_bad_lines() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("people.db");
    let input = write_lines(&[
        "# people export",
        r#"{"email": "a@x.com", "name": "A"}"#,
        "",
        r#"{"email": "b@x.com", "name": "B"}"#,
        "not json",
        "[1, 2, 3]",
        r#"{"email": "a@x.com", "name": "A2"}"#,
    ]);

    let report = run_import(Config {
        file: input.path().to_path_buf(),
        db_path: db_path.clone(),
        collection: "people".to_string(),
        threshold: 2,
        unique_attr: Some("email".to_string()),
        indexes: vec!["email".to_string()],
        ..Default::default()
    })
    .await
    .expect("import should succeed");

    assert_eq!(report.total_lines, 5);
    assert_eq!(report.submitted, 3);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.db_path, db_path);

    let pool = init_db_pool_with_path(&db_path).await.unwrap();
    let people = SqliteCollection::new(pool, "people");
    let all = people.find_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all
        .iter()
        .any(|d| d.get("email") == Some(&json!("a@x.com")) && d.get("name") == Some(&json!("A2"))));
}

#[tokio::test]
async fn test_import_is_idempotent_across_runs() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("people.db");
    let input = write_lines(&[
        r#"{"email": "a@x.com"}"#,
        r#"{"email": "b@x.com"}"#,
        r#"{"email": "c@x.com"}"#,
    ]);
    let config = Config {
        file: input.path().to_path_buf(),
        db_path: db_path.clone(),
        unique_attr: Some("email".to_string()),
        ..Default::default()
    };

    let first = run_import(config.clone()).await.unwrap();
    let second = run_import(config).await.unwrap();

    assert_eq!((first.inserted, first.updated), (3, 0));
    assert_eq!((second.inserted, second.updated), (0, 3));

    let pool = init_db_pool_with_path(&db_path).await.unwrap();
    let documents = SqliteCollection::new(pool, "documents");
    assert_eq!(documents.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_import_fails_on_rejected_document() {
    let dir = TempDir::new().unwrap();
    let input = write_lines(&[r#"{"$set": {"name": "x"}}"#]);

    let err = run_import(Config {
        file: input.path().to_path_buf(),
        db_path: dir.path().join("people.db"),
        ..Default::default()
    })
    .await
    .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Failed to flush remaining documents"));
    assert!(message.contains("Document rejected by store during insert"));
}

#[tokio::test]
async fn test_import_reports_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let err = run_import(Config {
        file: dir.path().join("missing.jsonl"),
        db_path: dir.path().join("people.db"),
        ..Default::default()
    })
    .await
    .unwrap_err();
    assert!(format!("{err:#}").contains("Failed to open input file"));
}

#[tokio::test]
async fn test_import_skips_non_utf8_line_and_keeps_buffered_documents() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("people.db");
    let mut input = NamedTempFile::new().expect("Failed to create temp file");
    input
        .write_all(b"{\"email\": \"a@x.com\"}\n{\"email\": \"b@x.com\"}\n\xff\xfe\n{\"email\": \"c@x.com\"}\n")
        .expect("Failed to write input");

    let report = run_import(Config {
        file: input.path().to_path_buf(),
        db_path: db_path.clone(),
        unique_attr: Some("email".to_string()),
        ..Default::default()
    })
    .await
    .expect("a non-UTF-8 line must not abort the import");

    assert_eq!(report.total_lines, 4);
    assert_eq!(report.submitted, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.inserted, 3);

    let pool = init_db_pool_with_path(&db_path).await.unwrap();
    let documents = SqliteCollection::new(pool, "documents");
    assert_eq!(documents.count().await.unwrap(), 3);
}
