use graminscore::{
    aggregate::{aggregate, mean_trunc, ComponentScores, Severity},
    component::Component,
};

#[test]
fn averages_truncate() {
    assert_eq!(mean_trunc(&[79, 80]), Some(79));
    assert_eq!(mean_trunc(&[1, 2]), Some(1));
    assert_eq!(mean_trunc(&[]), None);
}

#[test]
fn only_walls_present() {
    let scores = ComponentScores {
        wall: vec![55, 70, 61],
        ..Default::default()
    };
    let agg = aggregate(&scores);
    assert_eq!(agg.wall, Some(62));
    assert_eq!(agg.overall, 62);
    assert_eq!(agg.roof, None);
    assert_eq!(agg.door, None);
}

#[test]
fn overall_averages_present_components() {
    let mut scores = ComponentScores::default();
    scores.push(Component::Roof, 80);
    scores.push(Component::Wall, 60);
    let agg = aggregate(&scores);
    assert_eq!(agg.overall, 70);
    assert_eq!(agg.severity, Severity::Good);
}

#[test]
fn component_means_feed_overall_not_raw_scores() {
    let mut scores = ComponentScores::default();
    for s in [90, 90, 90] {
        scores.push(Component::Roof, s);
    }
    scores.push(Component::Door, 30);
    // (90 + 30) / 2, not (90 * 3 + 30) / 4
    assert_eq!(aggregate(&scores).overall, 60);
}

#[test]
fn empty_batch_scores_zero() {
    let scores = ComponentScores::default();
    assert!(scores.is_empty());
    let agg = aggregate(&scores);
    assert_eq!(agg.overall, 0);
    assert_eq!(agg.severity, Severity::Poor);
}

#[test]
fn severity_bands() {
    assert_eq!(Severity::from_score(100), Severity::Excellent);
    assert_eq!(Severity::from_score(80), Severity::Excellent);
    assert_eq!(Severity::from_score(79), Severity::Good);
    assert_eq!(Severity::from_score(60), Severity::Good);
    assert_eq!(Severity::from_score(59), Severity::Fair);
    assert_eq!(Severity::from_score(40), Severity::Fair);
    assert_eq!(Severity::from_score(39), Severity::Poor);
    assert_eq!(Severity::from_score(0), Severity::Poor);
}

#[test]
fn description_text_is_literal() {
    assert_eq!(
        Severity::Excellent.description(),
        "The structure appears to be in Excellent condition. No significant structural defects, cracks, or weathering were detected. The walls and roof appear intact and stable."
    );
    assert_eq!(
        Severity::Good.description(),
        "The structure is in Good condition. Minor signs of wear or weathering may be present, but the structural integrity appears sound. Routine maintenance is recommended."
    );
    assert_eq!(
        Severity::Fair.description(),
        "The structure is in Average/Fair condition. There are visible signs of degradation, potential surface cracks, or material fatigue. Immediate inspection is advised to prevent further damage."
    );
    assert_eq!(
        Severity::Poor.description(),
        "The structure appears to be in Poor/Damaged condition. Significant defects, cracks, or collapse risks were detected. Urgent structural intervention or reconstruction may be required."
    );
}
