//! # Lightrules Library
//!
//! Internal library for the lightrules binary application.
//!
//! This library exists to enable testing of the scheduling engine and provide
//! clean separation between CLI dispatch (main.rs) and application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Lightrules` builder loads configuration, connects to the
//!   bridge and starts the execution loop
//! - **Core Logic**: `core` module with the scheduler, condition evaluator and
//!   the blocking execution loop
//! - **Rules**: `rules` module with the validated rule data model
//! - **Bridges**: `bridge` module with the `LightBridge` seam, the Hue client
//!   and the in-memory bridge
//! - **Configuration**: `config` module for the TOML file
//! - **Commands**: `commands` module for the `schedule` and `simulate` subcommands
//! - **Geographic**: `geo` module for sunrise/sunset calculations
//! - **Infrastructure**: time source abstraction and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod args;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod constants;
pub mod core;
pub mod geo;
pub mod rules;
pub mod time_source;

mod lightrules;

// Re-export for binary
pub use lightrules::Lightrules;
