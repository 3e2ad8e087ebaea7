//! Canonical filesystem locations for everything berth owns on disk.

use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "config.yml";
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";
pub const STATE_FILE_NAME: &str = "state.json";
pub const SOCKET_FILE_NAME: &str = "berthd.sock";

/// Bundle of absolute paths derived once from a base config/data directory
/// pair. Construction does no I/O; callers create directories as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub compose_file: PathBuf,
    pub state_file: PathBuf,
    pub socket_file: PathBuf,
    pub app_data_dir: PathBuf,
}

impl Paths {
    /// Derive all paths from the given directories. `None` falls back to the
    /// environment override or the OS-appropriate default.
    pub fn new(config_dir: Option<PathBuf>, data_dir: Option<PathBuf>) -> Self {
        let config_dir = config_dir.unwrap_or_else(crate::env::config_dir);
        let data_dir = data_dir.unwrap_or_else(crate::env::data_dir);

        Self {
            config_file: config_dir.join(CONFIG_FILE_NAME),
            compose_file: data_dir.join(COMPOSE_FILE_NAME),
            state_file: data_dir.join(STATE_FILE_NAME),
            socket_file: data_dir.join(SOCKET_FILE_NAME),
            app_data_dir: data_dir.join("data"),
            config_dir,
            data_dir,
        }
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_derive_from_base_dirs() {
        let paths = Paths::new(
            Some(PathBuf::from("/etc/berth")),
            Some(PathBuf::from("/var/lib/berth")),
        );
        assert_eq!(paths.config_file, PathBuf::from("/etc/berth/config.yml"));
        assert_eq!(
            paths.compose_file,
            PathBuf::from("/var/lib/berth/docker-compose.yml")
        );
        assert_eq!(paths.state_file, PathBuf::from("/var/lib/berth/state.json"));
        assert_eq!(paths.socket_file, PathBuf::from("/var/lib/berth/berthd.sock"));
        assert_eq!(paths.app_data_dir, PathBuf::from("/var/lib/berth/data"));
    }

    #[test]
    fn same_base_yields_same_bundle() {
        let a = Paths::new(Some("/tmp/c".into()), Some("/tmp/d".into()));
        let b = Paths::new(Some("/tmp/c".into()), Some("/tmp/d".into()));
        assert_eq!(a, b);
    }
}
