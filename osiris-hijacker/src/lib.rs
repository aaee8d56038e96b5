//! A mutating admission webhook that patches Osiris-enabled Services, so that their
//! endpoints are managed by the Osiris endpoints controller instead of the built-in one.
pub mod annotations;
pub mod config;
pub mod decode;
pub mod error;
pub mod handler;
pub mod planner;
pub mod response;
pub mod server;
pub mod validate;

#[cfg(test)]
mod test_utils;
