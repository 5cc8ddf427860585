use graminscore::{
    config::Config,
    policy::{decide, Verdict},
};

#[test]
fn rejection_wins_over_acceptance() {
    let cfg = Config::default();
    let d = decide(&cfg, &["house", "roof", "tabby_cat", "door", "window"]);
    assert!(!d.is_house);
    assert_eq!(d.verdict, Verdict::Rejected);
    assert_eq!(d.matched, Some(("tabby_cat".to_string(), "cat".to_string())));
}

#[test]
fn acceptance_without_rejection_is_house() {
    let cfg = Config::default();
    for labels in [
        ["boathouse", "dock", "lakeside", "pier", "paddle"],
        ["thatch", "yurt", "hay", "cliff", "valley"],
        ["patio", "sundial", "birdhouse", "fountain", "bench"],
        ["Tile_Roof", "dome", "mosque", "palace", "bell_cote"],
    ] {
        let d = decide(&cfg, &labels);
        assert!(d.is_house, "{labels:?}");
        assert_eq!(d.verdict, Verdict::House);
    }
}

#[test]
fn unmatched_labels_are_unknown() {
    let cfg = Config::default();
    let d = decide(&cfg, &["volcano", "alp", "valley", "geyser", "lakeside"]);
    assert!(!d.is_house);
    assert_eq!(d.verdict, Verdict::Unknown);
    assert!(d.matched.is_none());
}

#[test]
fn substring_matching_rejects_carport() {
    // "carport" contains "car": a known false positive of substring matching.
    let cfg = Config::default();
    let d = decide(&cfg, &["carport", "house", "garage", "roof", "door"]);
    assert!(!d.is_house);
    assert_eq!(d.verdict, Verdict::Rejected);
}

#[test]
fn cat_photo_reports_top_label() {
    let cfg = Config::default();
    let d = decide(&cfg, &["cat", "animal", "pet", "fur", "whiskers"]);
    assert!(!d.is_house);
    assert_eq!(d.top_label(), "cat");
    assert_eq!(d.labels.len(), 5);
}

#[test]
fn labels_are_lowercased_and_kept_in_order() {
    let cfg = Config::default();
    let d = decide(&cfg, &["House", "SKY", "Cloud"]);
    assert_eq!(d.labels, ["house", "sky", "cloud"]);
    assert_eq!(d.top_label(), "house");
}

#[test]
fn empty_label_list_is_unknown() {
    let cfg = Config::default();
    let d = decide::<&str>(&cfg, &[]);
    assert_eq!(d.verdict, Verdict::Unknown);
    assert_eq!(d.top_label(), "Unknown");
}

#[test]
fn keyword_sets_come_from_config() {
    let mut cfg = Config::default();
    cfg.validation.reject_keywords.clear();
    cfg.validation.house_keywords = vec!["igloo".into()];
    cfg.validation.component_keywords.clear();
    assert!(decide(&cfg, &["igloo", "cat"]).is_house);
    assert!(!decide(&cfg, &["house"]).is_house);
}
