//! Backend storage services for one-time image shares
//!
//! This crate owns the durable share record table consumed by the backend:
//! issuing inserts records, redemption flips their `viewed` flag exactly once.

pub mod share_record;
