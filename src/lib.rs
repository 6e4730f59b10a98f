//! Staylens – a faceted analytics engine over an Airbnb-listings dataset.
//!
//! The engine answers dashboard questions about a relational dataset of
//! lodging listings and their hosts: summary counters, host leaderboards,
//! room-type breakdowns, amenity and verification frequency treemaps, and a
//! capped set of map markers.
//!
//! Two pure components form the core:
//! * The **facet query composer** ([`facet::compose`]) turns a
//!   [`facet::FacetSelection`] and a [`facet::QueryTemplate`] into a single
//!   parameterized [`facet::QuerySpec`] with canonical predicate order, fixed
//!   grouping and ordering, and a named result cap. Facet values are bound
//!   parameters, never interpolated text.
//! * The **multi-value frequency aggregator** ([`aggregate::aggregate`])
//!   explodes delimiter-joined columns such as amenities lists into
//!   case-normalized [`aggregate::TokenFrequency`] tables with per-token
//!   ratio percentages, ready for treemap rendering.
//!
//! ## Modules
//! * [`facet`] – Facet selections, predicates, templates, and composition.
//! * [`aggregate`] – Token frequency aggregation and scalar summaries.
//! * [`store`] – SQLite access with positional binding and bounded retry.
//! * [`dashboard`] – Section assembly on top of the core.
//! * [`settings`] – File/environment configuration.
//! * [`server`] – JSON presentation surface.
//!
//! ## Quick Start
//! ```
//! use staylens::dashboard;
//! use staylens::facet::FacetSelection;
//! use staylens::store::Store;
//! let store = Store::open_in_memory().unwrap();
//! store
//!     .execute_batch(
//!         "create table listing (
//!              id integer, name text, listing_url text, room_type text,
//!              neighbourhood_cleansed text, price real, number_of_reviews integer,
//!              review_scores_rating real, minimum_nights integer, amenities text,
//!              latitude real, longitude real, host_id integer
//!          );
//!          create table host_info (
//!              host_id integer, host_name text, host_since text,
//!              host_is_superhost integer, host_identity_verified integer,
//!              host_verifications text, host_url text
//!          );",
//!     )
//!     .unwrap();
//! let listings = dashboard::top_listings(&store, &FacetSelection::default()).unwrap();
//! assert!(listings.is_empty());
//! ```

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod facet;
pub mod server;
pub mod settings;
pub mod store;
