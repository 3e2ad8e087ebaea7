//! Environment variable lookups with home-directory fallbacks.
//!
//! Every override the daemon and CLI honor lives here so the rest of the
//! crate never touches `std::env` directly.

use std::path::PathBuf;

pub const ENV_CONFIG_DIR: &str = "BERTH_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "BERTH_DATA_DIR";
pub const ENV_BIND_ADDRESS: &str = "BERTH_BIND_ADDRESS";
pub const ENV_PORT: &str = "BERTH_PORT";
pub const ENV_SOCKET: &str = "BERTH_SOCKET";

const BERTH_SUBDIR: &str = "berth";

// Bound on all interfaces so co-located containers can reach the control
// plane through the docker bridge.
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_DAEMON_PORT: u16 = 9999;

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Config directory ($BERTH_CONFIG_DIR or ~/.config/berth)
pub fn config_dir() -> PathBuf {
    let dir = env_opt(ENV_CONFIG_DIR).map(PathBuf::from).unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| std::env::temp_dir().join("berth-config"))
            .join(BERTH_SUBDIR)
    });
    tracing::trace!(dir = %dir.display(), "Resolved config directory");
    dir
}

/// Data directory ($BERTH_DATA_DIR or ~/.local/share/berth)
pub fn data_dir() -> PathBuf {
    let dir = env_opt(ENV_DATA_DIR).map(PathBuf::from).unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| std::env::temp_dir().join("berth-data"))
            .join(BERTH_SUBDIR)
    });
    tracing::trace!(dir = %dir.display(), "Resolved data directory");
    dir
}

/// Daemon TCP bind address ($BERTH_BIND_ADDRESS or 0.0.0.0)
pub fn bind_address() -> String {
    let addr = env_opt(ENV_BIND_ADDRESS).unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
    tracing::trace!(addr = %addr, "Daemon bind address");
    addr
}

/// Daemon TCP port ($BERTH_PORT or 9999)
pub fn daemon_port() -> u16 {
    env_opt(ENV_PORT)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_DAEMON_PORT)
}

/// Daemon unix socket override ($BERTH_SOCKET). When set, the daemon listens
/// on this socket instead of TCP.
pub fn socket_path() -> Option<PathBuf> {
    let path = env_opt(ENV_SOCKET).map(PathBuf::from);
    tracing::trace!(path = ?path, "Daemon socket override");
    path
}
