//! pdkit — development-environment bootstrapper and project tool for the
//! Playdate SDK.
//!
//! Everything hard is delegated to the vendor toolchain: `pdc` compiles,
//! the Playdate Simulator runs, `pdutil` talks to hardware. This crate
//! is the glue (platform resolution, process capture, diagnostic
//! parsing, project scaffolding), exposed both as a CLI (`pdkit`) and as
//! callable tools for agent clients (`pdkit-mcp`).

pub mod commands;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod platform;
pub mod process;
pub mod tools;
pub mod util;

pub use context::ToolContext;
pub use diagnostics::{Diagnostic, Severity};
pub use error::{Result, ToolError};
pub use platform::{OsFamily, Platform};
