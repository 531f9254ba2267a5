//! Progressive multi-source supplier search and ranking engine in a strictly linted crate.

// Strict ban on dangerous or non-idiomatic practices
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(dead_code)]
#![deny(non_camel_case_types)]
#![warn(unused_imports)]
#![warn(unused_variables)]
#![deny(unused_must_use)]
#![deny(non_snake_case)]
#![deny(non_upper_case_globals)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy discipline
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::redundant_clone)]
#![deny(overflowing_literals)]
#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)
)]

/// Supplier search: normalization, recall, scoring, dedup, scheduling, assembly.
#[allow(clippy::module_name_repetitions)]
pub mod search;
/// HTTP server and API routes.
#[allow(clippy::missing_errors_doc, clippy::unused_async)]
pub mod server;
/// Entry helpers to start the sourcing server.
pub mod start_sourcing;
/// External web search (DuckDuckGo, Brave) with caching and retries.
#[allow(clippy::doc_markdown, clippy::missing_errors_doc)]
pub mod web;
