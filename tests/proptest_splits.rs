use dataset_fetch::hf::splits::{
    infer_data_files, infer_split_from_path, is_valid_split_name, normalize_split_name,
};
use proptest::prelude::*;

fn keyword() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "train",
        "training",
        "validation",
        "valid",
        "val",
        "dev",
        "test",
        "testing",
        "eval",
        "evaluation",
    ])
}

fn extension() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["parquet", "arrow", "jsonl", "json", "csv", "tsv"])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn push_to_hub_shard_names_map_to_their_split(
        kw in keyword(),
        ext in extension(),
        index in 0usize..100,
        extra in 0usize..100,
    ) {
        let total = index + extra + 1;
        let path = format!("data/{kw}-{index:05}-of-{total:05}.{ext}");
        let expected = normalize_split_name(kw).map(str::to_string);
        prop_assert_eq!(infer_split_from_path(&path), expected);
    }

    #[test]
    fn every_data_file_lands_in_exactly_one_split(
        names in prop::collection::btree_set("[a-z]{1,8}", 1..8),
        ext in extension(),
    ) {
        let paths: Vec<String> = names.iter().map(|name| format!("{name}_part.{ext}")).collect();
        let splits = infer_data_files(&paths);

        let assigned: Vec<&str> = splits
            .iter()
            .flat_map(|(_, files)| files.iter().map(|file| file.path.as_str()))
            .collect();
        let mut deduped = assigned.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), assigned.len());

        let with_split = paths.iter().filter(|path| infer_split_from_path(path).is_some()).count();
        if with_split == 0 {
            prop_assert_eq!(assigned.len(), paths.len());
            prop_assert_eq!(splits[0].0.as_str(), "train");
        } else {
            prop_assert_eq!(assigned.len(), with_split);
        }
    }

    #[test]
    fn inferred_split_names_are_safe_directory_names(
        prefix in "[A-Za-z0-9_.-]{1,12}",
        ext in extension(),
    ) {
        let paths = vec![format!("data/{prefix}-00000-of-00001.{ext}")];
        for (name, _) in infer_data_files(&paths) {
            prop_assert!(is_valid_split_name(&name), "split name {:?}", name);
        }
    }
}
