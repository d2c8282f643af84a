#![doc = include_str!("../README.md")]
#![warn(
    unreachable_pub,
    missing_debug_implementations,
    missing_docs,
    clippy::pedantic
)]

pub mod api;
pub mod auth;
mod client;
pub mod errors;
mod fileops;
pub mod metadata;
pub mod path;
pub(crate) mod serde;
pub mod upload;

pub(crate) type Result<T> = core::result::Result<T, errors::Error>;

pub use client::*;
pub use errors::Error;
pub use fileops::CopySource;
