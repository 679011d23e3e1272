pub const DEFAULT_CONFIG_PATH: &str = "./dashboard.toml";

/// Default per-environment entry limit, matching the original dashboard backend.
pub const DEFAULT_MAXSIZE: usize = 256;
