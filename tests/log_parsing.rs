/// Parser and file-mode extraction tests over pre-recorded history fixtures
use std::collections::BTreeMap;
use std::path::PathBuf;

use githarvest::error::HarvestError;
use githarvest::extractor::Git;
use githarvest::parser;
use githarvest::types::{uuid, Commit, FileChange, RecordEnvelope};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn parse_fixture(name: &str) -> Vec<Commit> {
    parser::parse_file(&fixture(name))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_parse_full_log() {
    let commits = parse_fixture("git_log.txt");

    let expected = [
        "456a68ee1407a77f3e804a30dff245bb6c6b872f",
        "51a3b654f252210572297f47597b31527c475fb8",
        "ce8e0b86a1e9877f42fe9453ede418519115f367",
        "589bb080f059834829a2a5955bebfd7c2baa110a",
        "c6ba8f7a1058db3e6b4bc6f1090e932b107605fb",
        "c0d66f92a95e31c77be08dc9d0f11a16715d1885",
        "7debcf8a2f57f86663809c58b5c07a398be7674c",
        "87783129c3f00d2c81a3a8e585eb86a47e39891a",
        "bc57a9209f096a130dcc5ba7089a8663f758a703",
    ];
    let hashes: Vec<&str> = commits.iter().map(|c| c.hash.as_str()).collect();
    assert_eq!(hashes, expected);
}

#[test]
fn test_parse_merge_commit() {
    let commits = parse_fixture("git_log.txt");

    let expected = Commit {
        hash: "456a68ee1407a77f3e804a30dff245bb6c6b872f".to_string(),
        parents: vec![
            "ce8e0b86a1e9877f42fe9453ede418519115f367".to_string(),
            "51a3b654f252210572297f47597b31527c475fb8".to_string(),
        ],
        refs: vec!["HEAD -> refs/heads/master".to_string()],
        headers: headers(&[
            ("Merge", "ce8e0b8 51a3b65"),
            ("Author", "Zhongpeng Lin (林中鹏) <lin.zhp@example.com>"),
            ("AuthorDate", "Tue Feb 11 22:10:39 2014 -0800"),
            ("Commit", "Zhongpeng Lin (林中鹏) <lin.zhp@example.com>"),
            ("CommitDate", "Tue Feb 11 22:10:39 2014 -0800"),
        ]),
        message: "Merge branch 'lzp'\n\nConflicts:\n\taaa/otherthing".to_string(),
        files: vec![FileChange {
            file: "aaa/otherthing.renamed".to_string(),
            newfile: None,
            added: Some(1),
            removed: Some(0),
            modes: vec![
                "100644".to_string(),
                "100644".to_string(),
                "100644".to_string(),
            ],
            indexes: vec![
                "e69de29...".to_string(),
                "58a6c75...".to_string(),
                "58a6c75...".to_string(),
            ],
            action: Some("MR".to_string()),
        }],
    };
    assert_eq!(commits[0], expected);
}

#[test]
fn test_parse_delete_and_rename_commit() {
    let commits = parse_fixture("git_log.txt");

    let expected = Commit {
        hash: "c0d66f92a95e31c77be08dc9d0f11a16715d1885".to_string(),
        parents: vec!["7debcf8a2f57f86663809c58b5c07a398be7674c".to_string()],
        refs: vec![],
        headers: headers(&[
            ("Author", "Eduardo Morais <companheiro.vermelho@example.com>"),
            ("AuthorDate", "Tue Aug 14 14:35:02 2012 -0300"),
            ("Commit", "Eduardo Morais <companheiro.vermelho@example.com>"),
            ("CommitDate", "Tue Aug 14 14:35:02 2012 -0300"),
        ]),
        message: "Deleted and renamed file".to_string(),
        files: vec![
            FileChange {
                file: "bbb/bthing".to_string(),
                newfile: None,
                added: Some(0),
                removed: Some(0),
                modes: vec!["100644".to_string(), "000000".to_string()],
                indexes: vec!["e69de29...".to_string(), "0000000...".to_string()],
                action: Some("D".to_string()),
            },
            FileChange {
                file: "bbb/something".to_string(),
                newfile: Some("bbb/something.renamed".to_string()),
                added: Some(0),
                removed: Some(0),
                modes: vec!["100644".to_string(), "100644".to_string()],
                indexes: vec!["e69de29...".to_string(), "e69de29...".to_string()],
                action: Some("R100".to_string()),
            },
        ],
    };
    assert_eq!(commits[5], expected);
}

#[test]
fn test_parse_binary_counts() {
    let commits = parse_fixture("git_log.txt");
    let binary = &commits[6];
    assert_eq!(binary.hash, "7debcf8a2f57f86663809c58b5c07a398be7674c");
    assert_eq!(binary.files.len(), 1);
    assert_eq!(binary.files[0].file, "ccc/finn.jpg");
    assert_eq!(binary.files[0].added, None);
    assert_eq!(binary.files[0].removed, None);
}

#[test]
fn test_parse_root_commit_has_no_parents() {
    let commits = parse_fixture("git_log.txt");
    let root = &commits[8];
    assert!(root.parents.is_empty());
    assert!(root.refs.is_empty());
    assert_eq!(root.files.len(), 4);
}

#[test]
fn test_parse_empty_log() {
    let commits = parse_fixture("git_log_empty.txt");
    assert!(commits.is_empty());
}

#[test]
fn test_bad_encoding_is_escaped_not_dropped() {
    let commits = parse_fixture("git_bad_encoding.txt");
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].hash, "cb24e4f2f7b2a7f3450bfb15d1cbaa97371e93fb");
    assert_eq!(
        commits[0].message,
        "Calling \u{e093}Open Type\u{e094} (CTRL+SHIFT+T) after startup - performance improvement."
    );
    // The escape is reversible: re-encoding restores the original bytes.
    let bytes = githarvest::encoding::encode(&commits[0].message);
    assert!(bytes.windows(2).any(|w| w == [0x93, b'O']));
}

#[test]
fn test_embedded_carriage_return_does_not_break_parsing() {
    let commits = parse_fixture("git_bad_cr.txt");
    assert_eq!(commits.len(), 1);
    assert_eq!(
        commits[0].message,
        "Fix the thing.\r(cherry picked from commit 0183fa73da6a3ac5f4dfbe0dee4e4b3dd095b3a5)\n\nReviewed by: mittens"
    );
}

#[test]
fn test_fetch_from_file() {
    let git = Git::new("http://example.com.git", fixture("git_log.txt"));
    let records: Vec<RecordEnvelope> = git
        .fetch(None)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let expected = [
        ("456a68ee1407a77f3e804a30dff245bb6c6b872f", 1392185439.0),
        ("51a3b654f252210572297f47597b31527c475fb8", 1392185366.0),
        ("ce8e0b86a1e9877f42fe9453ede418519115f367", 1392185269.0),
        ("589bb080f059834829a2a5955bebfd7c2baa110a", 1344967441.0),
        ("c6ba8f7a1058db3e6b4bc6f1090e932b107605fb", 1344966351.0),
        ("c0d66f92a95e31c77be08dc9d0f11a16715d1885", 1344965702.0),
        ("7debcf8a2f57f86663809c58b5c07a398be7674c", 1344965607.0),
        ("87783129c3f00d2c81a3a8e585eb86a47e39891a", 1344965535.0),
        ("bc57a9209f096a130dcc5ba7089a8663f758a703", 1344965413.0),
    ];

    assert_eq!(records.len(), expected.len());
    for (record, (hash, updated_on)) in records.iter().zip(expected) {
        assert_eq!(record.data.hash, hash);
        assert_eq!(record.origin, "http://example.com.git");
        assert_eq!(record.uuid, uuid("http://example.com.git", hash));
        assert_eq!(record.updated_on, updated_on);
    }
}

#[test]
fn test_fetch_from_file_respects_origin_override() {
    let git = Git::with_origin(
        "http://example.com.git",
        fixture("git_log.txt"),
        Some("test".to_string()),
    );
    let record = git.fetch(None).unwrap().next().unwrap().unwrap();
    assert_eq!(record.origin, "test");
    assert_eq!(
        record.uuid,
        uuid("test", "456a68ee1407a77f3e804a30dff245bb6c6b872f")
    );
}

#[test]
fn test_fetch_from_missing_file_is_an_error() {
    let git = Git::new("http://example.com.git", fixture("git_log.txt"));
    // A directory that is not a repository: fetch tries to clone and fails.
    // A missing file path is treated as a repository location instead.
    let missing = Git::new("definitely/not/reachable", "/nonexistent/githarvest-test");
    match missing.fetch(None) {
        Err(HarvestError::Repository(_)) => {}
        other => panic!("expected a repository error, got {:?}", other.is_ok()),
    }
    // The valid fixture still works after the failure above.
    assert_eq!(git.fetch(None).unwrap().count(), 9);
}
