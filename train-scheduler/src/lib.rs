//! Train trip scheduling server.
//!
//! Keeps a registry of stations, trains and the track segments between
//! stations, and schedules trips over that network so that no two live trips
//! ever occupy a single-track segment at the same time.

pub mod config;
pub mod domain;
pub mod schedule;
pub mod store;
pub mod web;
