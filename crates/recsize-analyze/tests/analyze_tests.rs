use recsize_analyze::{
    AggregateState, Aggregator, BinSlot, BinTable, Cdf, RecommendConfig, Recommender, Recordsize,
    Report, SkewConfig, SkewDetector, SkewPolicy, Tier, Verdict,
};

fn state_of(groups: &[(u64, usize)]) -> AggregateState {
    let mut agg = Aggregator::new(BinTable::standard());
    for &(size, n) in groups {
        for _ in 0..n {
            agg.observe(size as i64).unwrap();
        }
    }
    agg.finish()
}

fn analysis_of(groups: &[(u64, usize)]) -> recsize_analyze::Analysis {
    match Recommender::new().recommend(&state_of(groups)) {
        Report::Analyzed(analysis) => *analysis,
        Report::Empty => panic!("expected a populated report"),
    }
}

#[test]
fn test_half_tiny_half_large_collapses_to_one_mib() {
    let state = state_of(&[(500, 5), (2_097_152, 5)]);
    assert_eq!(state.total_bytes(), 10_488_260);

    let two_mib = state.bins().assign(2_097_152);
    assert!(state.byte_fraction(two_mib) > 0.9997);

    let analysis = analysis_of(&[(500, 5), (2_097_152, 5)]);
    for tier in &analysis.tiers {
        assert_eq!(tier.slot, two_mib);
        assert_eq!(tier.recordsize, Recordsize::M1);
    }
    assert!(!analysis.skew.is_skewed);
    assert_eq!(
        analysis.verdict,
        Verdict::Unified {
            recordsize: Recordsize::M1
        }
    );
    assert_eq!(analysis.verdict.outputs(), vec![(None, Recordsize::M1)]);
}

#[test]
fn test_many_small_few_huge_is_skewed() {
    let analysis = analysis_of(&[(4096, 10_000), (104_857_600, 10)]);

    assert_eq!(analysis.total_files, 10_010);
    assert_eq!(analysis.total_bytes, 1_089_536_000);
    assert!(analysis.skew.small_count_fraction > 0.998);
    assert!(analysis.skew.large_byte_fraction > 0.96);
    assert!(analysis.skew.is_skewed);

    assert_eq!(
        analysis.verdict,
        Verdict::PerTier {
            sequential_write: Recordsize::K128,
            mixed: Recordsize::K256,
            sequential_read: Recordsize::M1,
        }
    );

    let split = analysis.split.expect("skewed trees get a split");
    assert_eq!(split.large_files, Recordsize::M1);
    assert_eq!(split.small_files, Recordsize::K4);
}

#[test]
fn test_empty_stream_reports_no_data() {
    let state = Aggregator::new(BinTable::standard()).finish();
    let report = Recommender::new().recommend(&state);
    assert!(report.is_empty());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "empty");
}

#[test]
fn test_single_file_on_threshold() {
    let analysis = analysis_of(&[(131_072, 1)]);
    for tier in &analysis.tiers {
        assert_eq!(tier.slot, BinSlot::Bin(8));
        assert_eq!(tier.bin_label, "128K");
    }
    assert_eq!(
        analysis.verdict,
        Verdict::Unified {
            recordsize: Recordsize::K128
        }
    );
}

#[test]
fn test_tier_percentiles_are_monotonic() {
    let shapes: &[&[(u64, usize)]] = &[
        &[(100, 1000), (70_000, 30), (5 << 20, 2), (3 << 30, 1)],
        &[(8192, 10), (16_384, 10), (65_536, 10), (262_144, 10)],
        &[(0, 5), (1, 5)],
        &[(2 << 30, 3)],
    ];

    for shape in shapes {
        let state = state_of(shape);
        let cdf = Cdf::new(&state);
        let p50 = cdf.find_percentile(0.50);
        let p70 = cdf.find_percentile(0.70);
        let p90 = cdf.find_percentile(0.90);
        assert!(p50 <= p70 && p70 <= p90, "non-monotonic for {shape:?}");

        let analysis = analysis_of(shape);
        let slots: Vec<BinSlot> = analysis.tiers.iter().map(|t| t.slot).collect();
        assert_eq!(slots, vec![p50, p70, p90]);
    }
}

#[test]
fn test_skew_flag_matches_joint_condition() {
    let detector = SkewDetector::new();
    for small in [0usize, 10, 100, 1000, 5000] {
        for large in [0usize, 1, 5, 50] {
            for mid in [0usize, 20, 400] {
                let state = state_of(&[(2048, small), (300 << 10, mid), (50 << 20, large)]);
                let report = detector.detect(&state);
                assert_eq!(
                    report.is_skewed,
                    report.small_count_fraction > 0.60 && report.large_byte_fraction > 0.80,
                    "small={small} mid={mid} large={large}"
                );
            }
        }
    }
}

#[test]
fn test_collapse_only_when_all_tiers_agree() {
    let shapes: &[&[(u64, usize)]] = &[
        &[(3000, 20)],
        &[(16 << 10, 64), (128 << 10, 8), (1 << 20, 1)],
        &[(4096, 10_000), (104_857_600, 10)],
    ];
    for shape in shapes {
        let analysis = analysis_of(shape);
        let sizes: Vec<Recordsize> = analysis.tiers.iter().map(|t| t.recordsize).collect();
        let all_equal = sizes.windows(2).all(|w| w[0] == w[1]);
        assert_eq!(analysis.verdict.outputs().len(), if all_equal { 1 } else { 3 });
    }
}

#[test]
fn test_count_floor_policy_is_selectable() {
    let config = RecommendConfig::builder()
        .skew(SkewConfig::with_policy(SkewPolicy::count_floor()))
        .build()
        .unwrap();
    let shape = [(2048u64, 6000usize), (256 << 10, 6000)];

    let default = analysis_of(&shape);
    assert!(!default.skew.is_skewed);

    let report = Recommender::with_config(config).recommend(&state_of(&shape));
    let analysis = report.analysis().unwrap();
    assert!(analysis.skew.is_skewed);
    assert_eq!(
        analysis.tier(Tier::SequentialWrite).unwrap().recordsize,
        Recordsize::K128
    );
    assert_eq!(
        analysis.tier(Tier::Mixed).unwrap().recordsize,
        Recordsize::K256
    );
}

#[test]
fn test_custom_bin_table_flows_through() {
    let coarse = BinTable::new(vec![8192, 1 << 20]).unwrap();
    let mut agg = Aggregator::new(coarse);
    agg.extend([100u64, 200, 300, 5 << 20]);
    let report = Recommender::new().recommend(&agg.finish());
    let analysis = report.analysis().unwrap();

    // 3 regular rows plus the populated overflow row.
    assert_eq!(analysis.bins.len(), 3);
    assert_eq!(analysis.bins[2].label, ">1M");
    assert_eq!(
        analysis.tier(Tier::SequentialRead).unwrap().slot,
        BinSlot::Overflow
    );
}

#[test]
fn test_report_json_shape() {
    let state = state_of(&[(4096, 10_000), (104_857_600, 10)]);
    let report = Recommender::new().recommend(&state);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["status"], "analyzed");
    let analysis = &json["analysis"];
    assert_eq!(analysis["verdict"]["kind"], "per-tier");
    assert_eq!(analysis["verdict"]["sequential_write"], "128k");
    assert_eq!(analysis["tiers"][0]["tier"], "sequential-write");
    assert_eq!(analysis["skew"]["policy"]["policy"], "cdf-joint");
    assert_eq!(analysis["split"]["large_files"], "1M");
    assert!(analysis["reference"].as_array().unwrap().len() >= 3);
}
