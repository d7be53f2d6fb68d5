//! # accobot core
//!
//! Shared, I/O-free logic for accobot: the folder and message data
//! contracts, the append-only conversation log with its context window,
//! reply normalization, and the [`answering::AnsweringService`] seam.
//!
//! This crate contains no tokio, filesystem, or HTTP dependencies. The
//! ingestion pipeline, the HTTP client, and the local server live in the
//! `accobot` crate and build on these types.

pub mod answering;
pub mod conversation;
pub mod models;
pub mod reply;
