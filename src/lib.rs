//! Localization workflow sidebar.
//!
//! Tracks each target language of an entry through its lifecycle
//! (unsubmitted, submitted, processing, completed, cancelled) and derives the
//! primary action the sidebar offers.

pub mod config;
pub mod display;
pub mod host;
pub mod lifecycle;
pub mod locales;
pub mod poller;
pub mod session;
