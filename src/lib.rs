pub mod config;
pub mod duck;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod http;
pub mod record;

#[cfg(test)]
pub(crate) mod test_support;
