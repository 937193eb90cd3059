//! content-service: read API for the solar site's content collections and
//! the solar savings calculator.
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod query;
pub mod services;
pub mod startup;
