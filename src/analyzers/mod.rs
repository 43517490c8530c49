//! Route punctuality aggregation.
//!
//! This module computes the KPIs shown for a selected route, the per-period
//! series behind the charts, and the delay severity used to color the map.

pub mod metrics;
pub mod series;
pub mod severity;
pub mod types;
pub mod utility;
