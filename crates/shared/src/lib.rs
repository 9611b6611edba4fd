//! Types shared by the reservation client and its tools: identifiers and
//! domain values, the JSON wire protocol, and client-side validation errors.

pub mod domain;
pub mod error;
pub mod protocol;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
