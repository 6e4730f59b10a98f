use staylens::dashboard::listing_template;
use staylens::error::StaylensError;
use staylens::facet::{FacetSelection, RankingMetric, compose};
use staylens::store::Value;

fn facets(room_type: Option<&str>, neighbourhood: Option<&str>) -> FacetSelection {
    FacetSelection {
        room_type: room_type.map(str::to_string),
        neighbourhood: neighbourhood.map(str::to_string),
        ranking_metric: RankingMetric::Price,
    }
}

#[test]
fn facet_matrix_predicate_counts() {
    let combinations = [
        (facets(None, None), 0),
        (facets(None, Some("Khlong Toei")), 1),
        (facets(Some("Private room"), None), 1),
        (facets(Some("Private room"), Some("Khlong Toei")), 2),
    ];
    for (selection, expected) in combinations {
        let spec = compose(&listing_template(), &selection).expect("compose ok");
        assert_eq!(
            spec.predicates().len(),
            expected,
            "facet combination {selection:?} should yield {expected} predicates"
        );
    }
}

#[test]
fn canonical_predicate_order() {
    let spec = compose(
        &listing_template(),
        &facets(Some("Private room"), Some("Khlong Toei")),
    )
    .expect("compose ok");
    assert_eq!(spec.predicates()[0].column(), "room_type");
    assert_eq!(spec.predicates()[1].column(), "neighbourhood_cleansed");
}

#[test]
fn combinations_differ_only_in_predicates() {
    let specs: Vec<_> = [
        facets(None, None),
        facets(None, Some("Khlong Toei")),
        facets(Some("Private room"), None),
        facets(Some("Private room"), Some("Khlong Toei")),
    ]
    .iter()
    .map(|f| compose(&listing_template(), f).expect("compose ok"))
    .collect();
    for spec in &specs {
        assert_eq!(spec.order_by(), "price");
        assert_eq!(spec.limit(), 10);
        assert!(spec.sql().contains("group by name, host_info.host_name"));
        assert!(spec.sql().ends_with("order by price desc limit 10"));
    }
}

#[test]
fn values_appear_only_as_bound_parameters() {
    let selection = facets(Some("Private room"), Some("x' or '1'='1"));
    let spec = compose(&listing_template(), &selection).expect("compose ok");
    assert!(
        !spec.sql().contains("Private room"),
        "facet value must not be interpolated into {:?}",
        spec.sql()
    );
    assert!(!spec.sql().contains("1'='1"));
    assert!(spec.params().contains(&Value::Text("Private room".to_string())));
    assert!(spec.params().contains(&Value::Text("x' or '1'='1".to_string())));
}

#[test]
fn composition_is_stable_across_reruns() {
    let selection = facets(Some("Private room"), Some("Khlong Toei"));
    let first = compose(&listing_template(), &selection).expect("compose ok");
    let second = compose(&listing_template(), &selection).expect("compose ok");
    assert_eq!(first, second, "equal selections must compose equal specs");
}

#[test]
fn private_room_by_price_end_to_end() {
    let selection = facets(Some("Private room"), None);
    let spec = compose(&listing_template(), &selection).expect("compose ok");
    assert_eq!(spec.predicates().len(), 1);
    assert_eq!(spec.predicates()[0].column(), "room_type");
    assert_eq!(
        spec.predicates()[0].bind(),
        Some(&Value::Text("Private room".to_string()))
    );
    assert!(spec.sql().contains("room_type = ?"));
    assert!(spec.sql().contains("group by name, host_info.host_name"));
    assert!(spec.sql().ends_with("order by price desc limit 10"));
    // guards bind before facets: minimum review sample, then the room type
    assert_eq!(
        spec.params(),
        &[Value::Integer(10), Value::Text("Private room".to_string())][..]
    );
}

#[test]
fn ranking_metric_labels() {
    assert_eq!("Price".parse::<RankingMetric>().unwrap(), RankingMetric::Price);
    assert_eq!(
        "Number of Review".parse::<RankingMetric>().unwrap(),
        RankingMetric::ReviewCount
    );
    assert_eq!(
        "Review Scores Rating".parse::<RankingMetric>().unwrap(),
        RankingMetric::ReviewScore
    );
    let err = "Weekly Rate".parse::<RankingMetric>().unwrap_err();
    assert!(matches!(err, StaylensError::InvalidFacet(_)));
}

#[test]
fn template_must_carry_the_rank_column() {
    use staylens::facet::QueryTemplate;
    let template = QueryTemplate::new("room_type, count(*)", "listing").rankable("price");
    let selection = FacetSelection {
        ranking_metric: RankingMetric::ReviewScore,
        ..FacetSelection::default()
    };
    let err = compose(&template, &selection).unwrap_err();
    assert!(matches!(err, StaylensError::EmptyTemplate(_)));
}

#[test]
fn sentinel_options_mean_unconstrained() {
    let selection = FacetSelection::from_options("All", "All Region", "Price").expect("parse ok");
    assert_eq!(selection, FacetSelection::default());
    let constrained =
        FacetSelection::from_options("Hotel room", "Bang Rak", "Number of Review").expect("parse ok");
    assert_eq!(constrained.room_type.as_deref(), Some("Hotel room"));
    assert_eq!(constrained.neighbourhood.as_deref(), Some("Bang Rak"));
    assert_eq!(constrained.ranking_metric, RankingMetric::ReviewCount);
}
