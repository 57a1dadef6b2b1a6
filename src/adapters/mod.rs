// Adapters - External system implementations

pub mod fs_scan;
pub mod probe_ffprobe;
pub mod render_powershell;
pub mod toml_config;

// Re-export adapters
pub use fs_scan::scan_targets;
pub use probe_ffprobe::FfprobeAdapter;
pub use render_powershell::PowerShellRenderer;
pub use toml_config::AppConfig;
