use super::*;

fn at(start_ms: u32, mode: MotionMode, text: &str) -> Comment {
    Comment::new(start_ms, mode, text)
}

fn starts_and_modes(store: &CommentStore) -> Vec<(u32, MotionMode, String)> {
    store
        .items()
        .iter()
        .map(|c| (c.start_ms, c.mode, c.text.clone()))
        .collect()
}

#[test]
fn replace_all_rejects_unsorted_input() {
    let mut store = CommentStore::new();
    let err = store
        .replace_all(vec![
            at(20, MotionMode::Rolling, "a"),
            at(10, MotionMode::Rolling, "b"),
        ])
        .unwrap_err();
    assert!(err.to_string().contains("sorted"));
    assert!(store.is_empty());
}

#[test]
fn replace_all_rewinds_cursor() {
    let mut store = CommentStore::new();
    store
        .replace_all(vec![at(10, MotionMode::Rolling, "a")])
        .unwrap();
    store.advance();
    assert_eq!(store.cursor(), 1);
    store
        .replace_all(vec![at(5, MotionMode::Top, "b")])
        .unwrap();
    assert_eq!(store.cursor(), 0);
}

#[test]
fn insert_sorted_goes_after_equal_starts() {
    let mut store = CommentStore::new();
    store
        .replace_all(vec![
            at(10, MotionMode::Rolling, "a"),
            at(20, MotionMode::Rolling, "b"),
            at(30, MotionMode::Rolling, "c"),
        ])
        .unwrap();
    assert_eq!(store.insert_sorted(at(20, MotionMode::Top, "x")), 2);
    assert_eq!(store.insert_sorted(at(99, MotionMode::Top, "tail")), 4);
    assert_eq!(store.insert_sorted(at(0, MotionMode::Top, "head")), 0);
    let texts: Vec<_> = store.items().iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["head", "a", "b", "x", "c", "tail"]);
}

#[test]
fn insert_before_cursor_keeps_next_comment() {
    let mut store = CommentStore::new();
    store
        .replace_all(vec![
            at(10, MotionMode::Rolling, "a"),
            at(20, MotionMode::Rolling, "b"),
        ])
        .unwrap();
    store.advance();
    store.insert_sorted(at(5, MotionMode::Rolling, "early"));
    assert_eq!(store.cursor(), 2);
    assert_eq!(store.due_mut(20).map(|c| c.text.clone()).as_deref(), Some("b"));
}

#[test]
fn insert_behind_cursor_clears_the_realtime_flag() {
    let mut store = CommentStore::new();
    store
        .replace_all(vec![at(10, MotionMode::Rolling, "a"), at(30, MotionMode::Rolling, "b")])
        .unwrap();
    store.advance();

    let mut passed = at(20, MotionMode::Rolling, "passed");
    passed.realtime = true;
    let mut ahead = at(40, MotionMode::Rolling, "ahead");
    ahead.realtime = true;
    let passed_idx = store.insert_sorted(passed);
    let ahead_idx = store.insert_sorted(ahead);

    assert!(!store.items()[passed_idx].realtime);
    assert!(store.items()[ahead_idx].realtime);
}

#[test]
fn merge_keeps_primary_first_on_equal_starts() {
    let mut store = CommentStore::new();
    store
        .replace_all(vec![
            at(10, MotionMode::Rolling, "p10"),
            at(30, MotionMode::Rolling, "p30a"),
            at(30, MotionMode::Top, "p30b"),
            at(50, MotionMode::Rolling, "p50"),
        ])
        .unwrap();
    store
        .merge_sorted(
            vec![
                at(20, MotionMode::Subtitle, "s20"),
                at(30, MotionMode::Subtitle, "s30"),
            ],
            0,
        )
        .unwrap();

    let got: Vec<_> = starts_and_modes(&store)
        .into_iter()
        .map(|(start, _, text)| (start, text))
        .collect();
    let want: Vec<_> = [
        (10, "p10"),
        (20, "s20"),
        (30, "p30a"),
        (30, "p30b"),
        (30, "s30"),
        (50, "p50"),
    ]
    .into_iter()
    .map(|(s, t)| (s, t.to_owned()))
    .collect();
    assert_eq!(got, want);
}

#[test]
fn merge_into_empty_store_appends() {
    let mut store = CommentStore::new();
    store
        .merge_sorted(
            vec![
                at(1, MotionMode::Subtitle, "a"),
                at(2, MotionMode::Subtitle, "b"),
            ],
            0,
        )
        .unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.cursor(), 0);
}

#[test]
fn merge_moves_cursor_past_already_elapsed_subtitles() {
    let mut store = CommentStore::new();
    store
        .replace_all(vec![
            at(100, MotionMode::Rolling, "a"),
            at(200, MotionMode::Rolling, "b"),
            at(300, MotionMode::Rolling, "c"),
        ])
        .unwrap();
    store.set_cursor(2);
    store
        .merge_sorted(
            vec![
                at(50, MotionMode::Subtitle, "s50"),
                at(150, MotionMode::Subtitle, "s150"),
                at(260, MotionMode::Subtitle, "s260"),
            ],
            250,
        )
        .unwrap();
    assert_eq!(store.cursor(), 4);
    assert_eq!(
        store.due_mut(1000).map(|c| c.text.clone()).as_deref(),
        Some("s260")
    );
}

#[test]
fn remove_mode_is_a_pure_filter() {
    let mut store = CommentStore::new();
    store
        .replace_all(vec![
            at(10, MotionMode::Subtitle, "s1"),
            at(20, MotionMode::Rolling, "a"),
            at(30, MotionMode::Subtitle, "s2"),
            at(40, MotionMode::Top, "b"),
        ])
        .unwrap();
    store.set_cursor(3);
    assert_eq!(store.remove_mode(MotionMode::Subtitle), 2);
    assert!(store.items().iter().all(|c| c.mode != MotionMode::Subtitle));
    assert_eq!(store.len(), 2);
    assert_eq!(store.cursor(), 1);
    assert_eq!(store.due_mut(40).map(|c| c.text.clone()).as_deref(), Some("b"));
}

#[test]
fn seek_index_finds_first_at_or_after_target() {
    let mut store = CommentStore::new();
    store
        .replace_all(vec![
            at(10, MotionMode::Rolling, "a"),
            at(20, MotionMode::Rolling, "b"),
            at(20, MotionMode::Rolling, "c"),
        ])
        .unwrap();
    assert_eq!(store.seek_index(0), 0);
    assert_eq!(store.seek_index(15), 1);
    assert_eq!(store.seek_index(20), 1);
    assert_eq!(store.seek_index(21), 3);
}

#[test]
fn subtitle_restore_only_checks_nearest_subtitle() {
    let mut store = CommentStore::new();
    store
        .replace_all(vec![
            at(0, MotionMode::Subtitle, "long").with_duration(10_000),
            at(1000, MotionMode::Subtitle, "short").with_duration(200),
            at(1200, MotionMode::Rolling, "r"),
            at(5000, MotionMode::Rolling, "later"),
        ])
        .unwrap();
    // At 1300 the nearest subtitle ("short") has ended; the older one is not considered.
    let idx = store.seek_index(1300);
    assert_eq!(store.subtitle_to_restore(idx, 1300), None);
    // At 1100 "short" is still showing.
    let idx = store.seek_index(1100);
    assert_eq!(store.subtitle_to_restore(idx, 1100), Some(1));
}
