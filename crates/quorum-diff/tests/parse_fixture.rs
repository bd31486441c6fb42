use std::path::PathBuf;

use quorum_core::{ChangeType, LineKind};
use quorum_diff::parse_unified_diff;

#[test]
fn fixture_parses_all_file_kinds() {
    let diff = include_str!("fixtures/simple.diff");
    let files = parse_unified_diff(diff).unwrap();
    assert_eq!(files.len(), 4);

    let auth = &files[0];
    assert_eq!(auth.new_path, PathBuf::from("app/auth.py"));
    assert_eq!(auth.change_type, ChangeType::Modified);
    assert_eq!(auth.hunks.len(), 1);
    assert_eq!(auth.hunks[0].old_count, 5);
    assert_eq!(auth.hunks[0].new_count, 7);

    let db = &files[1];
    assert_eq!(db.change_type, ChangeType::Added);
    assert!(db.hunks[0].lines.iter().all(|l| l.kind == LineKind::Added));

    let logo = &files[2];
    assert!(logo.is_binary);
    assert!(logo.hunks.is_empty());

    let renamed = &files[3];
    assert_eq!(renamed.change_type, ChangeType::Renamed);
    assert_eq!(renamed.old_path, PathBuf::from("app/old_utils.py"));
    assert_eq!(renamed.new_path, PathBuf::from("app/utils.py"));
}

#[test]
fn fixture_hunks_satisfy_count_invariant() {
    let diff = include_str!("fixtures/simple.diff");
    let files = parse_unified_diff(diff).unwrap();

    for file in &files {
        for hunk in &file.hunks {
            let old_side = hunk
                .lines
                .iter()
                .filter(|l| l.kind != LineKind::Added)
                .count() as u32;
            let new_side = hunk
                .lines
                .iter()
                .filter(|l| l.kind != LineKind::Removed)
                .count() as u32;
            assert_eq!(old_side, hunk.old_count, "old side of {}", file);
            assert_eq!(new_side, hunk.new_count, "new side of {}", file);
        }
    }
}

#[test]
fn modified_hunk_line_numbers_continue_from_start() {
    let diff = include_str!("fixtures/simple.diff");
    let files = parse_unified_diff(diff).unwrap();
    let hunk = &files[0].hunks[0];

    assert_eq!(hunk.new_start, 10);
    let added: Vec<u32> = hunk
        .lines
        .iter()
        .filter(|l| l.kind == LineKind::Added)
        .filter_map(|l| l.new_line)
        .collect();
    assert_eq!(added, vec![12, 13, 14]);
}
