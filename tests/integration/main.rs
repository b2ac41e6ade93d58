//! Integration tests

mod client_test;
mod e2e_test;
mod fetch_test;
mod ingest_test;
