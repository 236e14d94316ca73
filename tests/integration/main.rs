//! Integration tests for car-scout
//!
//! These tests use wiremock to stand in for the classifieds site and the
//! search index, and drive the real reqwest-backed pipeline end-to-end.

mod common;
mod enrich_tests;
mod search_tests;
