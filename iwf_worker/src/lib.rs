//! iWF worker implementation.
//!
//! This crate hosts registered workflow states: [`WorkerService`] runs their
//! `start` and `decide` phases for the iWF server, and [`create_router`]
//! exposes it over HTTP.

pub mod router;
pub mod worker;

pub use router::create_router;
pub use worker::*;
