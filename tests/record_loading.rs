mod common;

use std::fs;

use article_recs::{
    BlobBackend, FileBackend, Identifier, RecordCache, RecordFormat, RecordLoader, SourceError,
    SourceLocation, SourceParams,
};
use common::{MockResponse, spawn_http_server};
use tempfile::tempdir;

fn local_loader(cache: &RecordCache) -> RecordLoader {
    RecordLoader::new(cache).with_backend(FileBackend::new())
}

#[test]
fn every_valid_line_becomes_one_record() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("interactions.jsonl");
    let lines: Vec<String> = (1..=25)
        .map(|user| format!("{{\"user_id\": {user}, \"click_article_id\": {}}}", user * 3))
        .collect();
    fs::write(&path, lines.join("\n")).unwrap();

    let loader = local_loader(&RecordCache::new());
    let report =
        loader.load_interactions(&SourceParams::new(SourceLocation::local(&path), RecordFormat::JsonLines));

    assert!(report.is_ok());
    assert_eq!(report.records.len(), 25);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.records[0].user_id, Some(Identifier::from(1)));
}

#[test]
fn one_malformed_line_is_skipped_without_aborting() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("articles.jsonl");
    fs::write(
        &path,
        concat!(
            "{\"article_id\": 1, \"title\": \"One\"}\n",
            "{\"article_id\": 2, \"title\": \n",
            "{\"article_id\": 3, \"title\": \"Three\"}\n",
            "{\"article_id\": 4, \"title\": \"Four\", \"category\": \"tech\"}\n",
        ),
    )
    .unwrap();

    let loader = local_loader(&RecordCache::new());
    let report =
        loader.load_articles(&SourceParams::new(SourceLocation::local(&path), RecordFormat::JsonLines));

    assert!(report.is_ok());
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.skipped, 1);
    let ids: Vec<_> = report
        .records
        .iter()
        .filter_map(|record| record.article_id.clone())
        .collect();
    assert_eq!(
        ids,
        vec![Identifier::from(1), Identifier::from(3), Identifier::from(4)]
    );
}

#[test]
fn json_array_document_yields_one_record_per_element() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("articles.json");
    fs::write(
        &path,
        r#"[{"article_id": "a1", "url": "https://example.com/a1"}, {"article_id": 2}]"#,
    )
    .unwrap();

    let loader = local_loader(&RecordCache::new());
    let report =
        loader.load_articles(&SourceParams::new(SourceLocation::local(&path), RecordFormat::Json));

    assert_eq!(report.records.len(), 2);
    assert_eq!(
        report.records[0].url.as_deref(),
        Some("https://example.com/a1")
    );
}

#[test]
fn missing_file_degrades_to_empty_with_not_found() {
    let temp = tempdir().unwrap();
    let loader = local_loader(&RecordCache::new());
    let report = loader.load_interactions(&SourceParams::new(
        SourceLocation::local(temp.path().join("absent.jsonl")),
        RecordFormat::JsonLines,
    ));

    assert!(report.records.is_empty());
    assert!(matches!(
        report.failure.as_deref(),
        Some(SourceError::NotFound { .. })
    ));
    assert_eq!(loader.cache().len(), 1);
}

#[test]
fn missing_file_stays_empty_until_invalidated() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("interactions.jsonl");
    let params = SourceParams::new(SourceLocation::local(&path), RecordFormat::JsonLines);
    let cache = RecordCache::new();
    let loader = local_loader(&cache);

    let first = loader.load_interactions(&params);
    assert!(first.records.is_empty());
    assert!(!first.is_ok());

    fs::write(&path, "{\"user_id\": 1}\n").unwrap();
    let second = loader.load_interactions(&params);
    assert!(second.from_cache);
    assert!(second.records.is_empty());
    assert!(matches!(
        second.failure.as_deref(),
        Some(SourceError::NotFound { .. })
    ));

    assert!(cache.invalidate(&params));
    let third = loader.load_interactions(&params);
    assert!(third.is_ok());
    assert!(!third.from_cache);
    assert_eq!(third.records.len(), 1);
}

#[test]
fn second_load_is_served_from_cache_until_invalidated() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("interactions.jsonl");
    fs::write(&path, "{\"user_id\": 1}\n").unwrap();
    let params = SourceParams::new(SourceLocation::local(&path), RecordFormat::JsonLines);

    let cache = RecordCache::new();
    let loader = local_loader(&cache);
    let first = loader.load_interactions(&params);
    assert!(!first.from_cache);

    fs::write(&path, "{\"user_id\": 1}\n{\"user_id\": 2}\n").unwrap();
    let second = loader.load_interactions(&params);
    assert!(second.from_cache);
    assert_eq!(second.records.len(), 1);

    assert!(cache.invalidate(&params));
    let third = loader.load_interactions(&params);
    assert!(!third.from_cache);
    assert_eq!(third.records.len(), 2);
}

#[test]
fn loaders_sharing_a_cache_share_memoized_rows() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("interactions.jsonl");
    fs::write(&path, "{\"user_id\": 5}\n").unwrap();
    let params = SourceParams::new(SourceLocation::local(&path), RecordFormat::JsonLines);

    let cache = RecordCache::new();
    assert!(!local_loader(&cache).load_interactions(&params).from_cache);
    fs::remove_file(&path).unwrap();

    let report = local_loader(&cache).load_interactions(&params);
    assert!(report.from_cache);
    assert_eq!(report.records[0].user_id, Some(Identifier::from(5)));
}

#[test]
fn same_location_with_different_format_is_a_separate_entry() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("articles.json");
    fs::write(&path, "[{\"article_id\": 1}, {\"article_id\": 2}]").unwrap();

    let cache = RecordCache::new();
    let loader = local_loader(&cache);
    let as_json =
        loader.load_articles(&SourceParams::new(SourceLocation::local(&path), RecordFormat::Json));
    let as_lines = loader
        .load_articles(&SourceParams::new(SourceLocation::local(&path), RecordFormat::JsonLines));

    assert_eq!(as_json.records.len(), 2);
    assert!(!as_lines.from_cache);
    assert_eq!(cache.len(), 2);
}

#[test]
fn blob_source_downloads_and_decodes_lines() {
    let (base_url, server) = spawn_http_server(vec![MockResponse::new(
        "200 OK",
        "{\"user_id\": 11}\n{\"user_id\": \"u-2\"}\n",
    )]);
    let raw = format!("BlobEndpoint={base_url};SharedAccessSignature=sv=2021&sig=abc");
    let loader = RecordLoader::new(&RecordCache::new())
        .with_backend(BlobBackend::from_connection_string(Some(&raw)).unwrap());

    let report = loader.load_interactions(&SourceParams::new(
        SourceLocation::blob("processed-data", "user_interactions.json"),
        RecordFormat::JsonLines,
    ));

    assert!(report.is_ok());
    assert_eq!(
        report
            .records
            .iter()
            .filter_map(|record| record.user_id.clone())
            .collect::<Vec<_>>(),
        vec![Identifier::from(11), Identifier::from("u-2")]
    );
    let requests = server.join().unwrap();
    assert!(requests[0].starts_with(
        "GET /processed-data/user_interactions.json?sv=2021&sig=abc HTTP/1.1"
    ));
}

#[test]
fn blob_not_found_degrades_to_empty() {
    let (base_url, server) = spawn_http_server(vec![MockResponse::new(
        "404 The specified blob does not exist.",
        "<Error><Code>BlobNotFound</Code></Error>",
    )]);
    let raw = format!("BlobEndpoint={base_url};SharedAccessSignature=sig=abc");
    let cache = RecordCache::new();
    let loader = RecordLoader::new(&cache)
        .with_backend(BlobBackend::from_connection_string(Some(&raw)).unwrap());

    let report = loader.load_articles(&SourceParams::new(
        SourceLocation::blob("processed-data", "articles_metadata.json"),
        RecordFormat::JsonLines,
    ));

    assert!(report.records.is_empty());
    assert!(matches!(
        report.failure.as_deref(),
        Some(SourceError::NotFound { .. })
    ));
    server.join().unwrap();

    let again = loader.load_articles(&SourceParams::new(
        SourceLocation::blob("processed-data", "articles_metadata.json"),
        RecordFormat::JsonLines,
    ));
    assert!(again.from_cache);
    assert_eq!(cache.len(), 1);
}

#[test]
fn blob_location_without_credentials_reports_missing_credential() {
    let loader =
        RecordLoader::new(&RecordCache::new()).with_backend(BlobBackend::from_connection_string(None).unwrap());
    let report = loader.load_interactions(&SourceParams::new(
        SourceLocation::blob("processed-data", "user_interactions.json"),
        RecordFormat::JsonLines,
    ));
    assert!(matches!(
        report.failure.as_deref(),
        Some(SourceError::MissingCredential { .. })
    ));
}

#[test]
fn location_without_backend_reports_no_backend() {
    let loader = local_loader(&RecordCache::new());
    let report = loader.load_interactions(&SourceParams::new(
        SourceLocation::blob("processed-data", "user_interactions.json"),
        RecordFormat::JsonLines,
    ));
    assert!(matches!(
        report.failure.as_deref(),
        Some(SourceError::NoBackend { .. })
    ));
}
