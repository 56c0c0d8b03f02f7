//! insightboard: filter insight records and turn them into chart specs.
//!
//! The pipeline is: fetch ([`source`]) → decode ([`model`]) → facets
//! ([`facets`]) and filter ([`filter`]) → chart spec ([`chart`]), with
//! [`dashboard::DashboardController`] owning the state in between.

pub mod activity;
pub mod chart;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod facets;
pub mod filter;
pub mod model;
pub mod source;
pub mod web;
