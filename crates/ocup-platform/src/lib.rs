//! Host-specific helpers for ocup: where settings and logs live, which
//! release asset matches the running machine, and where a new build gets
//! unpacked.

mod commands;
mod install_dir;
mod paths;
mod platform;

pub use commands::HideWindow;
pub use install_dir::{installation_dir, resolve_extraction_root};
pub use paths::{AppPaths, AppPathsError};
pub use platform::{pattern_for, platform_pattern};
