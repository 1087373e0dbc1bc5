//! Shared traits and helper types reused across the plugin subsystem crates.
//! The goal is to keep the discovery/loader/executor crates decoupled from
//! any single host application's configuration and telemetry wiring while
//! still sharing common contracts.

pub mod errors;
pub mod paths;
pub mod reference;
pub mod telemetry;

pub use errors::{DisplayErrorFormatter, ErrorFormatter, ErrorReporter, NoopErrorReporter};
pub use paths::{
    PathResolver, PathScope, WorkspacePaths, file_name_from_path, is_safe_relative_path,
    normalize_ascii_identifier, resolve_workspace_path,
};
pub use reference::{MemoryErrorReporter, MemoryTelemetry, StaticWorkspacePaths};
pub use telemetry::{NoopTelemetry, TelemetrySink};
