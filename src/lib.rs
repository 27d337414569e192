#![forbid(unsafe_code)]

pub mod config;
pub mod http;
pub mod parsing;
pub mod sheets;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
