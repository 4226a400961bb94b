//! One-time image share backend
//!
//! Uploads land in S3, each upload gets a single-use token recorded in `DynamoDB`,
//! and the first redemption of that token wins the image for a bounded window.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]
#![allow(clippy::module_name_repetitions)]

pub mod media_storage;
pub mod routes;
pub mod server;
pub mod share;
pub mod types;
pub mod viewer;
