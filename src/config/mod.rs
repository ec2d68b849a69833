// src/config/mod.rs

//! Settings for distmake.
//!
//! - `model.rs` holds the TOML data model, the named defaults and the
//!   validated per-component settings.
//! - `loader.rs` reads a settings file through the [`crate::fs`] seam.
//! - `validate.rs` turns [`RawSettings`] into [`Settings`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, resolve_settings};
pub use model::{
    defaults, ClassifierSettings, DispatchSettings, PoolLimits, RawSettings, SchedulerOptions,
    Settings,
};
