//! Multi-leg flight itinerary time calculator.
//!
//! Given an ordered list of flight legs, each with local departure and
//! arrival times and the UTC offset at either end, computes total air time,
//! total layover time, total travel time and every individual layover.
//!
//! Around that core sit rolling date inference for legs entered without
//! dates, city timezone resolution with graceful fallback, and a small JSON
//! API.

pub mod cache;
pub mod config;
pub mod domain;
pub mod itinerary;
pub mod timezone;
pub mod web;
