//! Shared services for application screens: a persisted attribution record
//! and status flag, ad-configuration lookup, analytics event emission, and
//! per-screen orientation support.
//!
//! One [`services::Services`] bundle is opened at process start; each screen
//! receives a [`screen::context::ScreenContext`] from it.

pub mod config;
pub mod error;
pub mod identity;
pub mod reporting;
pub mod screen;
pub mod services;
