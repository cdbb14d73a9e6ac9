//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Translates
//! JSON requests into domain commands, domain results into the wire DTOs of
//! the `shared` crate, and domain errors into HTTP status codes.

pub mod rest;
