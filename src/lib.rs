//! Tour Planner - AI-assisted travel plan service
//!
//! A trip request flows through a two-stage generation chain (prompt
//! synthesis, then plan text) and a multi-model budget ensemble before the
//! enriched plan is stored and served over HTTP.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
