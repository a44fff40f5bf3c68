//! Engine core: registration, dispatch and action lifecycle.
//!
//! The public API of this module is [`Engine`] and its [`EngineBuilder`].
//!
//! Internal modules:
//! - [`registry`]: event → actions and action → admission tables;
//! - [`builder`]: fluent registration, frozen into an engine by `build()`;
//! - [`engine`]: admission and spawning of bound actions, drain and shutdown;
//! - [`runner`]: runs one admitted action and releases its admission;
//! - [`dispatch`]: per-action outcome report of one event;
//! - [`config`]: engine-wide settings.

mod builder;
mod config;
mod dispatch;
mod engine;
mod registry;
mod runner;

pub use builder::{ActionBuilder, EngineBuilder};
pub use config::EngineConfig;
pub use dispatch::{Admission, Dispatch};
pub use engine::{ENGINE_GROUP, Engine};
pub use registry::Registry;
