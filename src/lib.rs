#![deny(unexpected_cfgs)]
//
#![warn(clippy::cargo)]
#![warn(clippy::nursery)]
//
// https://github.com/rust-lang/rust-clippy/issues/16440
#![allow(clippy::multiple_crate_versions)]

mod json_util;

pub mod discord;
pub mod fields;
pub mod flatten;
pub mod http;
pub mod server;
pub mod validate;

pub use discord::{DeliveryOutcome, DiscordClient, Notification, Source};
pub use fields::{format_message, format_or_fallback};
