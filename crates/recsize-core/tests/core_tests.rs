use recsize_core::{
    AggregateState, Aggregator, AnalysisError, BinSlot, BinTable, Recordsize, ScanConfig,
};

/// Deterministic size stream spanning every bin and the overflow tier.
fn sample_sizes(n: usize) -> Vec<u64> {
    let mut x: u64 = 0x2545_f491_4f6c_dd1d;
    (0..n)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            // Spread across 0..2^32 on a log scale.
            let shift = x % 33;
            (x >> 32) & ((1u64 << shift) - 1).max(1)
        })
        .collect()
}

fn aggregate(bins: &BinTable, sizes: &[u64]) -> AggregateState {
    let mut agg = Aggregator::new(bins.clone());
    for &size in sizes {
        agg.observe(size as i64).unwrap();
    }
    agg.finish()
}

#[test]
fn test_count_and_byte_invariants() {
    let sizes = sample_sizes(5000);
    let state = aggregate(&BinTable::standard(), &sizes);

    let counts: u64 = state.tallies().iter().map(|t| t.count).sum();
    let bytes: u64 = state.tallies().iter().map(|t| t.bytes).sum();

    assert_eq!(state.total_files(), 5000);
    assert_eq!(state.total_bytes(), sizes.iter().sum::<u64>());
    assert_eq!(counts + state.overflow().count, state.total_files());
    assert_eq!(bytes + state.overflow().bytes, state.total_bytes());
}

#[test]
fn test_order_independence() {
    let bins = BinTable::standard();
    let sizes = sample_sizes(2000);

    let forward = aggregate(&bins, &sizes);

    let mut reversed = sizes.clone();
    reversed.reverse();
    let backward = aggregate(&bins, &reversed);

    let mut sorted = sizes.clone();
    sorted.sort_unstable();
    let ascending = aggregate(&bins, &sorted);

    let mut rotated = sizes;
    rotated.rotate_left(777);
    let shifted = aggregate(&bins, &rotated);

    assert_eq!(forward, backward);
    assert_eq!(forward, ascending);
    assert_eq!(forward, shifted);
}

#[test]
fn test_threshold_size_lands_in_its_own_bin() {
    let bins = BinTable::standard();
    let state = aggregate(&bins, &[131_072]);

    assert_eq!(bins.assign(131_072), BinSlot::Bin(8));
    assert_eq!(state.tally(BinSlot::Bin(8)).count, 1);
    assert_eq!(state.tally(BinSlot::Bin(9)).count, 0);
    assert_eq!(Recordsize::from_bytes(131_072), Recordsize::K128);
}

#[test]
fn test_zero_sized_files_go_to_first_bin() {
    let state = aggregate(&BinTable::standard(), &[0, 0, 0]);
    assert_eq!(state.total_files(), 3);
    assert_eq!(state.total_bytes(), 0);
    assert_eq!(state.tally(BinSlot::Bin(0)).count, 3);
    assert!(state.require_data().is_ok());
}

#[test]
fn test_negative_sample_is_fatal_for_the_sample() {
    let mut agg = Aggregator::default();
    assert_eq!(
        agg.observe(-4096),
        Err(AnalysisError::InvalidSample { size: -4096 })
    );
    assert!(agg.finish().is_empty());
}

#[test]
fn test_injected_coarse_table() {
    let coarse = BinTable::new(vec![4096, 1 << 20]).unwrap();
    let state = aggregate(&coarse, &[1, 4096, 4097, 1 << 20, (1 << 20) + 1]);

    assert_eq!(state.tallies().len(), 2);
    assert_eq!(state.tally(BinSlot::Bin(0)).count, 2);
    assert_eq!(state.tally(BinSlot::Bin(1)).count, 2);
    assert_eq!(state.overflow().count, 1);
    assert_eq!(Recordsize::from_slot(&coarse, BinSlot::Bin(0)), Recordsize::K4);
    assert_eq!(Recordsize::from_slot(&coarse, BinSlot::Bin(1)), Recordsize::M1);
}

#[test]
fn test_mapper_totality_over_ladder() {
    use strum::IntoEnumIterator;

    for rs in Recordsize::iter() {
        assert_eq!(Recordsize::from_bytes(rs.bytes()), rs);
        assert!(Recordsize::from_bytes(rs.bytes() + 1) >= rs);
    }
}

#[test]
fn test_scan_config_builder() {
    let config = ScanConfig::builder()
        .root("/test/path")
        .max_depth(Some(5))
        .include_hidden(false)
        .cross_filesystems(true)
        .dedupe_hardlinks(false)
        .ignore_patterns(vec!["*.tmp".to_string(), ".DS_Store".to_string()])
        .build()
        .unwrap();

    assert_eq!(config.root.to_str().unwrap(), "/test/path");
    assert_eq!(config.max_depth, Some(5));
    assert!(!config.include_hidden);
    assert!(config.cross_filesystems);
    assert!(!config.dedupe_hardlinks);
    assert_eq!(config.ignore_patterns.len(), 2);
}
