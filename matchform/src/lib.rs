//! Leakage-safe rolling-form features and season-aware outcome models for football results.
//!
//! Raw result rows are normalised into [MatchRecord](record::MatchRecord)s, arranged into
//! per-team timelines, enriched with trailing-window form that only ever looks at matches already
//! played, one-hot encoded against a frozen [FeatureSchema](schema::FeatureSchema) and partitioned
//! by season. A grid-searched random forest is then fitted on the training seasons and persisted
//! alongside its schema, so that hypothetical fixtures can be scored later without the training
//! data.

#![allow(clippy::too_many_arguments)]

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod csv;
pub mod dataset;
pub mod evaluate;
pub mod file;
pub mod forest;
pub mod form;
pub mod hash_lookup;
pub mod matrix;
pub mod pipeline;
pub mod predict;
pub mod print;
pub mod record;
pub mod schema;
pub mod season;
pub mod select;
pub mod synthetic;
pub mod timed;
pub mod timeline;

#[doc = include_str!("../../README.md")]
#[cfg(doc)]
fn readme() {}
