//! A small blocking client for the SwitchBot developer API.
//!
//! Requests are signed per call with an HMAC-SHA256 of the account token, a
//! millisecond timestamp and a random nonce.
//!
//! ```no_run
//! use switchbot_rs::{Credentials, SwitchBotClient, API_BASE};
//!
//! let credentials = Credentials::from_env()?;
//! let client = SwitchBotClient::new(API_BASE, credentials)?;
//! let devices = client.devices()?;
//! println!("{} devices", devices.len());
//! # Ok::<(), switchbot_rs::SwitchBotError>(())
//! ```

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod report;

pub use auth::{AuthHeaders, Credentials};
pub use client::SwitchBotClient;
pub use error::{Result, SwitchBotError};
pub use models::{Device, DeviceList, DeviceStatus};

pub const API_BASE: &str = "https://api.switch-bot.com";
