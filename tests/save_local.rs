//! Integration tests for loading local dataset directories and saving them.

use std::fs::File;

use arrow::ipc::reader::StreamReader;
use dataset_fetch::dataset::save::save_to_disk;
use dataset_fetch::dataset::{load_dataset, Split};
use dataset_fetch::hf::acquire::HubOptions;
use dataset_fetch::hf::resolve::parse_dataset_input;
use dataset_fetch::{download, DownloadRequest, FetchError};

mod common;
use common::{create_local_dataset, write_file, write_jsonl, write_parquet};

fn load_local(root: &std::path::Path, config: Option<&str>) -> dataset_fetch::dataset::DatasetDict {
    let input = root.to_string_lossy();
    let location = parse_dataset_input(&input, None, config, None).expect("resolve");
    load_dataset(&location, &HubOptions::default()).expect("load dataset")
}

#[test]
fn saved_shards_hold_every_row() {
    let source = tempfile::tempdir().expect("tempdir");
    create_local_dataset(source.path());
    let dict = load_local(source.path(), None);

    let target = tempfile::tempdir().expect("tempdir");
    save_to_disk(&dict, target.path()).expect("save");

    for split in dict.splits() {
        let mut saved_rows = 0;
        for idx in 0..split.shards.len() {
            let name = format!("data-{:05}-of-{:05}.arrow", idx, split.shards.len());
            let file = File::open(target.path().join(&split.name).join(name)).expect("open shard");
            let reader = StreamReader::try_new(file, None).expect("stream reader");
            saved_rows += reader
                .map(|batch| batch.expect("batch").num_rows())
                .sum::<usize>();
        }
        assert_eq!(saved_rows, split.num_rows(), "split {}", split.name);
    }
}

#[test]
fn report_counts_match_dataset_handle() {
    let source = tempfile::tempdir().expect("tempdir");
    create_local_dataset(source.path());
    let dict = load_local(source.path(), None);

    let target = tempfile::tempdir().expect("tempdir");
    let report = download(&DownloadRequest::new(
        source.path().to_string_lossy(),
        target.path().join("out"),
    ))
    .expect("download");

    let expected: Vec<(String, usize)> = dict
        .splits()
        .iter()
        .map(|split| (split.name.clone(), split.num_rows()))
        .collect();
    let reported: Vec<(String, usize)> = report
        .splits
        .iter()
        .map(|split| (split.name.clone(), split.num_rows))
        .collect();
    assert_eq!(reported, expected);
    assert_eq!(reported, vec![("train".to_string(), 5), ("test".to_string(), 4)]);
}

#[test]
fn card_config_selects_data_files() {
    let source = tempfile::tempdir().expect("tempdir");
    write_parquet(&source.path().join("en/train.parquet"), 6);
    write_parquet(&source.path().join("fr/train.parquet"), 2);
    write_jsonl(&source.path().join("fr/test.jsonl"), 1);
    write_file(
        &source.path().join("README.md"),
        "---\nconfigs:\n- config_name: en\n  default: true\n  data_files:\n  - split: train\n    path: en/*.parquet\n- config_name: fr\n  data_files:\n  - split: train\n    path: fr/*.parquet\n  - split: test\n    path: fr/*.jsonl\n---\n# Card\n",
    );

    let default = load_local(source.path(), None);
    assert_eq!(default.keys().collect::<Vec<_>>(), vec!["train"]);
    assert_eq!(default.split("train").map(Split::num_rows), Some(6));

    let french = load_local(source.path(), Some("fr"));
    assert_eq!(french.keys().collect::<Vec<_>>(), vec!["train", "test"]);
    assert_eq!(french.split("train").map(Split::num_rows), Some(2));
    assert_eq!(french.origin().config.as_deref(), Some("fr"));
}

#[test]
fn unknown_config_is_rejected() {
    let source = tempfile::tempdir().expect("tempdir");
    write_jsonl(&source.path().join("data.jsonl"), 1);
    write_file(
        &source.path().join("README.md"),
        "---\nconfigs:\n- config_name: default\n  data_files: data.jsonl\n---\n",
    );

    let location = parse_dataset_input(&source.path().to_string_lossy(), None, Some("de"), None)
        .expect("resolve");
    let err = load_dataset(&location, &HubOptions::default()).expect_err("unknown config");
    match err {
        FetchError::ConfigNotFound {
            requested,
            available,
            ..
        } => {
            assert_eq!(requested, "de");
            assert_eq!(available, "default");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn mixed_csv_and_jsonl_keep_the_majority_format() {
    let source = tempfile::tempdir().expect("tempdir");
    write_file(&source.path().join("train.csv"), "q,a\nx,1\ny,2\n");
    write_file(&source.path().join("test.csv"), "q,a\nz,3\n");
    write_jsonl(&source.path().join("extra/train.jsonl"), 10);

    let dict = load_local(source.path(), None);
    assert_eq!(dict.split("train").map(Split::num_rows), Some(2));
    assert_eq!(dict.split("test").map(Split::num_rows), Some(1));
}

#[test]
fn card_split_names_cannot_escape_the_save_path() {
    for split in ["\"..\"", "\"\"", "a/b"] {
        let source = tempfile::tempdir().expect("tempdir");
        write_jsonl(&source.path().join("data/rows.jsonl"), 2);
        write_file(
            &source.path().join("README.md"),
            &format!(
                "---\nconfigs:\n- config_name: default\n  data_files:\n  - split: {split}\n    path: data/*.jsonl\n---\n"
            ),
        );

        let target = tempfile::tempdir().expect("tempdir");
        let parent = target.path().join("parent");
        let out = parent.join("out");
        write_file(&parent.join("precious.txt"), "keep");
        write_file(&out.join("notes.txt"), "keep");

        let err = download(&DownloadRequest::new(source.path().to_string_lossy(), &out))
            .expect_err(split);
        assert!(matches!(err, FetchError::ReadmeParse { .. }), "{split}: {err:?}");
        assert!(parent.join("precious.txt").is_file(), "{split}");
        assert!(out.join("notes.txt").is_file(), "{split}");
    }
}

#[test]
fn saved_directory_loads_back_with_the_same_counts() {
    let source = tempfile::tempdir().expect("tempdir");
    write_jsonl(&source.path().join("train.jsonl"), 5);
    write_jsonl(&source.path().join("test.jsonl"), 3);

    let target = tempfile::tempdir().expect("tempdir");
    let first = target.path().join("first");
    let second = target.path().join("second");
    let saved = download(&DownloadRequest::new(source.path().to_string_lossy(), &first))
        .expect("first download");
    let reloaded = download(&DownloadRequest::new(first.to_string_lossy(), &second))
        .expect("download from saved directory");

    let counts = |report: &dataset_fetch::report::DownloadReport| {
        report
            .splits
            .iter()
            .map(|split| (split.name.clone(), split.num_rows, split.num_columns))
            .collect::<Vec<_>>()
    };
    assert_eq!(counts(&reloaded), counts(&saved));
    assert_eq!(
        counts(&reloaded),
        vec![("train".to_string(), 5, 2), ("test".to_string(), 3, 2)]
    );
}

#[test]
fn mixed_columns_are_described_by_the_saved_features() {
    let source = tempfile::tempdir().expect("tempdir");
    write_file(&source.path().join("train/a.jsonl"), "{\"x\":1}\n");
    write_file(&source.path().join("train/b.jsonl"), "{\"y\":\"s\"}\n");

    let target = tempfile::tempdir().expect("tempdir");
    download(&DownloadRequest::new(
        source.path().to_string_lossy(),
        target.path(),
    ))
    .expect("download");

    let info: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(target.path().join("train/dataset_info.json")).expect("read info"),
    )
    .expect("parse info");
    assert_eq!(info["features"]["x"]["dtype"], "int64");
    assert_eq!(info["features"]["y"]["dtype"], "string");

    for idx in 0..2 {
        let name = format!("data-{idx:05}-of-00002.arrow");
        let file = File::open(target.path().join("train").join(name)).expect("open shard");
        let reader = StreamReader::try_new(file, None).expect("stream reader");
        let names: Vec<String> = reader
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect();
        assert_eq!(names, vec!["x", "y"]);
    }
}

#[test]
fn card_config_without_data_files_uses_file_names() {
    let source = tempfile::tempdir().expect("tempdir");
    write_jsonl(&source.path().join("train.jsonl"), 4);
    write_file(
        &source.path().join("README.md"),
        "---\nconfigs:\n- config_name: default\n---\n",
    );

    let dict = load_local(source.path(), None);
    assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["train"]);
    assert_eq!(dict.split("train").map(Split::num_rows), Some(4));
}
