//! Library crate for flip-match-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;
