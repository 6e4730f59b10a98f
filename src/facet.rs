//! Faceted query composition.
//!
//! A [`FacetSelection`] captures the independent, optional filter dimensions a
//! user can pick (room type, neighbourhood, ranking metric). [`compose`] turns
//! a selection and a [`QueryTemplate`] into a single well-formed, parameterized
//! [`QuerySpec`]: always-on guards and facet predicates joined with `and`,
//! grouping by the display key, descending order by the rank column, and a
//! fixed row cap. Facet values never appear in the query text, only in the
//! ordered bind list, so equal selections always yield byte-identical SQL.
//!
//! Predicates are appended in canonical order (room type before neighbourhood)
//! regardless of which facets are set, which keeps the generated text stable
//! and cacheable by facet tuple.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, StaylensError};
use crate::store::Value;

/// Number of rows a ranked leaderboard keeps.
pub const TOP_LISTING_LIMIT: usize = 10;
/// Facet option meaning "any room type".
pub const ALL_ROOM_TYPES: &str = "All";
/// Facet option meaning "any neighbourhood".
pub const ALL_REGIONS: &str = "All Region";

// ------------- RankingMetric -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankingMetric {
    #[default]
    Price,
    ReviewCount,
    ReviewScore,
}

impl RankingMetric {
    /// The listing column this metric ranks by.
    pub fn column(&self) -> &'static str {
        match self {
            RankingMetric::Price => "price",
            RankingMetric::ReviewCount => "number_of_reviews",
            RankingMetric::ReviewScore => "review_scores_rating",
        }
    }
}

impl FromStr for RankingMetric {
    type Err = StaylensError;
    // The labels are the ones the selection menus present.
    fn from_str(label: &str) -> Result<Self> {
        match label {
            "Price" => Ok(RankingMetric::Price),
            "Number of Review" => Ok(RankingMetric::ReviewCount),
            "Review Scores Rating" => Ok(RankingMetric::ReviewScore),
            other => Err(StaylensError::InvalidFacet(format!(
                "no ranking column is known for {other:?}"
            ))),
        }
    }
}

// ------------- FacetSelection -------------
/// The filters currently selected by the user. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetSelection {
    #[serde(default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub neighbourhood: Option<String>,
    #[serde(default)]
    pub ranking_metric: RankingMetric,
}

impl FacetSelection {
    /// Builds a selection from the option labels a menu hands over,
    /// mapping the "All" sentinels back to unconstrained facets.
    pub fn from_options(room_type: &str, neighbourhood: &str, metric: &str) -> Result<Self> {
        Ok(Self {
            room_type: facet_value(room_type, ALL_ROOM_TYPES),
            neighbourhood: facet_value(neighbourhood, ALL_REGIONS),
            ranking_metric: metric.parse()?,
        })
    }

    /// Facet predicates in canonical order: room type before neighbourhood.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(room_type) = &self.room_type {
            predicates.push(Predicate::eq("room_type", Value::Text(room_type.clone())));
        }
        if let Some(neighbourhood) = &self.neighbourhood {
            predicates.push(Predicate::eq(
                "neighbourhood_cleansed",
                Value::Text(neighbourhood.clone()),
            ));
        }
        predicates
    }
}

fn facet_value(option: &str, sentinel: &str) -> Option<String> {
    if option == sentinel {
        None
    } else {
        Some(option.to_string())
    }
}

// ------------- Predicate -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    NotNull,
}

/// One where-clause entry. The column is always a fixed schema name, the
/// compared value is always a bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: String,
    comparison: Comparison,
    bind: Option<Value>,
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: Value) -> Self {
        Self {
            column: column.into(),
            comparison: Comparison::Eq,
            bind: Some(value),
        }
    }
    pub fn gt(column: impl Into<String>, value: Value) -> Self {
        Self {
            column: column.into(),
            comparison: Comparison::Gt,
            bind: Some(value),
        }
    }
    pub fn not_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            comparison: Comparison::NotNull,
            bind: None,
        }
    }
    pub fn column(&self) -> &str {
        &self.column
    }
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }
    pub fn bind(&self) -> Option<&Value> {
        self.bind.as_ref()
    }
    fn clause(&self) -> String {
        match self.comparison {
            Comparison::Eq => format!("{} = ?", self.column),
            Comparison::Gt => format!("{} > ?", self.column),
            Comparison::NotNull => format!("{} is not null", self.column),
        }
    }
}

// ------------- QueryTemplate -------------
/// The base statement skeleton a ranked query is composed over: projection,
/// source tables and joins, always-on guards, grouping key, and the columns
/// the source can rank by.
#[derive(Debug, Clone)]
pub struct QueryTemplate {
    select: String,
    source: String,
    guards: Vec<Predicate>,
    group_by: Vec<String>,
    rankable: Vec<String>,
    limit: usize,
}

impl QueryTemplate {
    pub fn new(select: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            select: select.into(),
            source: source.into(),
            guards: Vec::new(),
            group_by: Vec::new(),
            rankable: Vec::new(),
            limit: TOP_LISTING_LIMIT,
        }
    }
    /// Adds an always-on predicate, included independent of facet selection.
    pub fn guard(mut self, predicate: Predicate) -> Self {
        self.guards.push(predicate);
        self
    }
    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }
    /// Declares a column the template's source can order by.
    pub fn rankable(mut self, column: impl Into<String>) -> Self {
        self.rankable.push(column.into());
        self
    }
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

// ------------- QuerySpec -------------
/// A fully composed query: statement text plus the ordered bind values.
/// Immutable once built; equal facet selections compose equal specs.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    sql: String,
    params: Vec<Value>,
    predicates: Vec<Predicate>,
    order_by: String,
    limit: usize,
}

impl QuerySpec {
    pub fn sql(&self) -> &str {
        &self.sql
    }
    pub fn params(&self) -> &[Value] {
        &self.params
    }
    /// The facet predicates that made it into the query, in canonical order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
    pub fn order_by(&self) -> &str {
        &self.order_by
    }
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Composes a template and a facet selection into a single query spec.
///
/// All four facet combinations (none, room type only, neighbourhood only,
/// both) produce specs that differ only in predicate presence: same grouping,
/// same ordering, same cap. Pure function, no side effects.
pub fn compose(template: &QueryTemplate, facets: &FacetSelection) -> Result<QuerySpec> {
    let rank_column = facets.ranking_metric.column();
    if !template.rankable.iter().any(|c| c == rank_column) {
        return Err(StaylensError::EmptyTemplate(format!(
            "source {:?} cannot rank by {rank_column}",
            template.source
        )));
    }
    let predicates = facets.predicates();
    let mut clauses = Vec::new();
    let mut params = Vec::new();
    for predicate in template.guards.iter().chain(predicates.iter()) {
        clauses.push(predicate.clause());
        if let Some(value) = predicate.bind() {
            params.push(value.clone());
        }
    }
    let mut sql = format!("select {} from {}", template.select, template.source);
    if !clauses.is_empty() {
        sql.push_str(" where ");
        sql.push_str(&clauses.join(" and "));
    }
    if !template.group_by.is_empty() {
        sql.push_str(" group by ");
        sql.push_str(&template.group_by.join(", "));
    }
    // the rank column comes from the fixed metric lookup, never from user text
    sql.push_str(&format!(
        " order by {rank_column} desc limit {}",
        template.limit
    ));
    Ok(QuerySpec {
        sql,
        params,
        predicates,
        order_by: rank_column.to_string(),
        limit: template.limit,
    })
}

/// A facet-filtered scan without grouping or ranking, for pulling the raw
/// rows of a multi-valued column under the same canonical predicates.
pub fn facet_scan(select: &str, source: &str, facets: &FacetSelection) -> (String, Vec<Value>) {
    let predicates = facets.predicates();
    let mut sql = format!("select {select} from {source}");
    let mut params = Vec::new();
    if !predicates.is_empty() {
        let clauses: Vec<String> = predicates.iter().map(|p| p.clause()).collect();
        sql.push_str(" where ");
        sql.push_str(&clauses.join(" and "));
        params.extend(predicates.into_iter().filter_map(|p| p.bind));
    }
    (sql, params)
}
