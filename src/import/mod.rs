//! Property import module - normalizes spreadsheet rows into listings

pub mod city;
pub mod fields;
pub mod insert;
pub mod row;
pub mod types;

pub use types::*;
