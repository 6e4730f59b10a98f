//! Dashboard section assembly.
//!
//! Each function here is a thin consumer of the composer and the aggregator:
//! it issues one or two parameterized queries against the [`Store`] and shapes
//! the rows into a serializable payload for the presentation layer. Sections
//! are independent of each other so a failing query takes down one panel, not
//! the whole dashboard.

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{self, LIST_DELIMITER, TokenFrequency};
use crate::error::{Result, StaylensError};
use crate::facet::{self, FacetSelection, Predicate, QueryTemplate, TOP_LISTING_LIMIT};
use crate::store::{RawRow, Store, Value};

/// Upper bound on markers handed to the map widget per render. This bounds
/// client-side rendering cost and is part of the map interface, not of the
/// underlying query.
pub const MARKER_RENDER_CAP: usize = 5000;
/// Listings with this many reviews or fewer are too noisy to rank.
pub const MIN_REVIEW_SAMPLE: i64 = 10;

// ------------- Overview -------------
#[derive(Debug, Serialize)]
pub struct Overview {
    pub listing_count: i64,
    pub host_count: i64,
    pub review_total: i64,
}

pub fn overview(store: &Store) -> Result<Overview> {
    Ok(Overview {
        listing_count: count(store, "select count(*) as freq from listing")?,
        host_count: count(store, "select count(*) as freq from host_info")?,
        review_total: count(store, "select sum(number_of_reviews) as freq from listing")?,
    })
}

fn count(store: &Store, sql: &str) -> Result<i64> {
    let rows = store.select(sql, &[])?;
    aggregate::scalar(&rows, "freq")
}

// ------------- Host summary -------------
#[derive(Debug, Serialize)]
pub struct HostSummary {
    pub superhost_count: i64,
    pub verified_count: i64,
    pub unverified_count: i64,
}

pub fn host_summary(store: &Store) -> Result<HostSummary> {
    // the source data stores these flags as 0/1 integers
    Ok(HostSummary {
        superhost_count: flag_count(store, "host_is_superhost", 1)?,
        verified_count: flag_count(store, "host_identity_verified", 1)?,
        unverified_count: flag_count(store, "host_identity_verified", 0)?,
    })
}

fn flag_count(store: &Store, column: &str, flag: i64) -> Result<i64> {
    let sql = format!("select count(*) as freq from host_info where {column} = ?");
    let rows = store.select(&sql, &[Value::Integer(flag)])?;
    aggregate::scalar(&rows, "freq")
}

// ------------- Host leaderboard -------------
/// One leaderboard entry. Earning is the product of listing price, review
/// count as a stand-in for customers, and minimum nights as a stand-in for
/// stay length, summed over the host's listings.
#[derive(Debug, Serialize)]
pub struct HostRow {
    pub host_id: i64,
    pub host_name: String,
    pub host_since: String,
    pub superhost: bool,
    pub identity_verified: bool,
    pub listing_count: i64,
    pub earning: f64,
    pub host_url: String,
}

pub fn top_hosts(store: &Store, include_superhost: bool) -> Result<Vec<HostRow>> {
    let mut sql = String::from(
        "select listing.host_id, host_info.host_name, host_info.host_since, \
         host_info.host_is_superhost, host_info.host_identity_verified, \
         count(*) as number_of_listing, \
         sum(price * number_of_reviews * minimum_nights) as earning, \
         host_info.host_url \
         from listing left join host_info on listing.host_id = host_info.host_id \
         where host_info.host_since is not null",
    );
    let mut params = Vec::new();
    if !include_superhost {
        sql.push_str(" and host_info.host_is_superhost = ?");
        params.push(Value::Integer(0));
    }
    sql.push_str(&format!(
        " group by listing.host_id order by earning desc limit {TOP_LISTING_LIMIT}"
    ));
    let rows = store.select(&sql, &params)?;
    Ok(rows
        .iter()
        .map(|row| HostRow {
            host_id: int_field(row, "host_id"),
            host_name: text_field(row, "host_name", "No Host Name"),
            host_since: text_field(row, "host_since", ""),
            superhost: int_field(row, "host_is_superhost") == 1,
            identity_verified: int_field(row, "host_identity_verified") == 1,
            listing_count: int_field(row, "number_of_listing"),
            earning: float_field(row, "earning"),
            host_url: text_field(row, "host_url", ""),
        })
        .collect())
}

// ------------- Host timeline -------------
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub joined: i64,
}

/// Hosts joined per calendar month, chronologically sorted and materialized
/// as first-of-month dates.
pub fn host_timeline(store: &Store) -> Result<Vec<TimelinePoint>> {
    let rows = store.select(
        "select cast(strftime('%Y', host_since) as integer) as year, \
         cast(strftime('%m', host_since) as integer) as month, \
         count(*) as frequency \
         from host_info where host_since is not null \
         group by year, month order by year, month",
        &[],
    )?;
    let mut points = Vec::with_capacity(rows.len());
    for row in &rows {
        let year = int_field(row, "year") as i32;
        let month = int_field(row, "month") as u32;
        let date = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            StaylensError::DataStore(format!(
                "host_since yields no calendar month: {year}-{month}"
            ))
        })?;
        points.push(TimelinePoint {
            date,
            joined: int_field(row, "frequency"),
        });
    }
    Ok(points)
}

// ------------- Verification treemap -------------
pub fn verification_breakdown(store: &Store) -> Result<Vec<TokenFrequency>> {
    let rows = store.select(
        "select host_verifications from host_info \
         where host_identity_verified is not null and host_verifications is not null",
        &[],
    )?;
    aggregate::aggregate(&rows, "host_verifications", LIST_DELIMITER)
}

// ------------- Room types -------------
#[derive(Debug, Serialize)]
pub struct RoomTypeShare {
    pub room_type: String,
    pub listing_count: i64,
    pub mean_price: f64,
}

pub fn room_type_breakdown(store: &Store) -> Result<Vec<RoomTypeShare>> {
    let rows = store.select(
        "select room_type, count(*) as frequency, avg(price) as mean_price \
         from listing group by room_type order by count(*) desc",
        &[],
    )?;
    Ok(rows
        .iter()
        .map(|row| RoomTypeShare {
            room_type: relabel_room_type(&text_field(row, "room_type", "")),
            listing_count: int_field(row, "frequency"),
            mean_price: float_field(row, "mean_price"),
        })
        .collect())
}

// The export abbreviates this label; spell it out for display.
fn relabel_room_type(room_type: &str) -> String {
    if room_type == "Entire home/apt" {
        "Entire home/apartment".to_string()
    } else {
        room_type.to_string()
    }
}

/// Room type facet options, sentinel first.
pub fn room_type_options(store: &Store) -> Result<Vec<String>> {
    let rows = store.select("select distinct room_type from listing", &[])?;
    let mut options = vec![facet::ALL_ROOM_TYPES.to_string()];
    options.extend(text_column(&rows, "room_type"));
    Ok(options)
}

/// Neighbourhood facet options, sorted, sentinel first.
pub fn neighbourhood_options(store: &Store) -> Result<Vec<String>> {
    let rows = store.select("select distinct neighbourhood_cleansed from listing", &[])?;
    let mut neighbourhoods = text_column(&rows, "neighbourhood_cleansed");
    neighbourhoods.sort();
    let mut options = vec![facet::ALL_REGIONS.to_string()];
    options.extend(neighbourhoods);
    Ok(options)
}

fn text_column(rows: &[RawRow], column: &str) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(column).and_then(Value::as_text))
        .map(str::to_string)
        .collect()
}

// ------------- Top listings -------------
#[derive(Debug, Serialize)]
pub struct ListingRow {
    pub name: String,
    pub price: f64,
    pub review_scores_rating: f64,
    pub number_of_reviews: f64,
    pub host_name: String,
}

/// The base statement the listing leaderboard is composed over: averaged
/// metrics per (name, host name) display key, rated listings only, and the
/// minimum review sample that keeps statistically noisy listings out.
pub fn listing_template() -> QueryTemplate {
    QueryTemplate::new(
        "name, avg(price) as price, \
         avg(review_scores_rating) as review_scores_rating, \
         avg(number_of_reviews) as number_of_reviews, host_info.host_name",
        "listing left join host_info on listing.host_id = host_info.host_id",
    )
    .guard(Predicate::not_null("review_scores_rating"))
    .guard(Predicate::gt(
        "number_of_reviews",
        Value::Integer(MIN_REVIEW_SAMPLE),
    ))
    .group_by("name")
    .group_by("host_info.host_name")
    .rankable("price")
    .rankable("number_of_reviews")
    .rankable("review_scores_rating")
}

pub fn top_listings(store: &Store, facets: &FacetSelection) -> Result<Vec<ListingRow>> {
    let spec = facet::compose(&listing_template(), facets)?;
    let rows = store.select_spec(&spec)?;
    Ok(rows
        .iter()
        .map(|row| ListingRow {
            name: text_field(row, "name", "No Name"),
            price: float_field(row, "price"),
            review_scores_rating: float_field(row, "review_scores_rating"),
            number_of_reviews: float_field(row, "number_of_reviews"),
            host_name: text_field(row, "host_name", "No Host Name"),
        })
        .collect())
}

// ------------- Amenities treemap -------------
pub fn amenity_breakdown(store: &Store, facets: &FacetSelection) -> Result<Vec<TokenFrequency>> {
    let (sql, params) = facet::facet_scan("amenities", "listing", facets);
    let rows = store.select(&sql, &params)?;
    aggregate::aggregate(&rows, "amenities", LIST_DELIMITER)
}

// ------------- Map markers -------------
/// One listing pin for the clustered map: coordinates plus the popup fields
/// in display order.
#[derive(Debug, Serialize)]
pub struct MapMarker {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub display_fields: Vec<(String, String)>,
}

/// Markers for up to `cap` listings; callers pass [`MARKER_RENDER_CAP`].
/// Listings without coordinates cannot be pinned and are skipped.
pub fn map_markers(store: &Store, cap: usize) -> Result<Vec<MapMarker>> {
    let sql = format!(
        "select id, name, listing_url, latitude, longitude, price, \
         review_scores_rating, number_of_reviews, host_info.host_name \
         from listing left join host_info on listing.host_id = host_info.host_id \
         limit {cap}"
    );
    let rows = store.select(&sql, &[])?;
    let mut markers = Vec::with_capacity(rows.len());
    for row in &rows {
        let (Some(lat), Some(lon)) = (
            row.get("latitude").and_then(Value::as_f64),
            row.get("longitude").and_then(Value::as_f64),
        ) else {
            continue;
        };
        let display_fields = vec![
            ("Name".to_string(), text_field(row, "name", "No Name")),
            ("Host Name".to_string(), text_field(row, "host_name", "No Host Name")),
            ("Price".to_string(), text_field(row, "price", "")),
            (
                "Review Scores Rating".to_string(),
                text_field(row, "review_scores_rating", "No Rating Yet"),
            ),
            (
                "Number of Reviews".to_string(),
                text_field(row, "number_of_reviews", "0"),
            ),
            ("Listing URL".to_string(), text_field(row, "listing_url", "")),
        ];
        markers.push(MapMarker {
            id: int_field(row, "id"),
            lat,
            lon,
            display_fields,
        });
    }
    Ok(markers)
}

// ------------- Row field helpers -------------
fn text_field(row: &RawRow, column: &str, missing: &str) -> String {
    match row.get(column) {
        Some(Value::Text(text)) => text.clone(),
        Some(Value::Integer(i)) => i.to_string(),
        Some(Value::Real(r)) => r.to_string(),
        _ => missing.to_string(),
    }
}

fn int_field(row: &RawRow, column: &str) -> i64 {
    row.get(column).and_then(Value::as_i64).unwrap_or(0)
}

fn float_field(row: &RawRow, column: &str) -> f64 {
    row.get(column).and_then(Value::as_f64).unwrap_or(0.0)
}
