//! Backend library for the Elbtal rental platform: spreadsheet import
//! pipeline, admin session gating, and the HTTP upload surface.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod import;
pub mod store;
