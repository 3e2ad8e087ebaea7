//! Configuration and installation-state documents.
//!
//! The config document is user-editable YAML that evolves release to release:
//! loading always merges the on-disk document with compiled-in defaults so an
//! old file gains new fields without hand-editing, while every customization
//! is preserved. The state document is machine-owned JSON; its absence means
//! "not installed".

use crate::error::{BerthError, Result};
use crate::paths::Paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_IMAGE_TAG: &str = "0.3.2";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_LLM_BASE_URL: &str = "http://host.docker.internal:30000/v1";
pub const DEFAULT_MODEL: &str = "qwen3-awq";

pub const DEFAULT_INFERENCE_PORT: u16 = 30000;
pub const DEFAULT_INFERENCE_MODEL_FILE: &str = "Qwen3-32B-Q4_K_M.gguf";
pub const DEFAULT_INFERENCE_SHM_SIZE: &str = "16g";
pub const DEFAULT_INFERENCE_CONTEXT_SIZE: u32 = 8192;
pub const DEFAULT_INFERENCE_BATCH_SIZE: u32 = 256;
pub const DEFAULT_INFERENCE_GPU_LAYERS: u32 = 999;
pub const DEFAULT_INFERENCE_TENSOR_SPLIT: &str = "1,1,1";
pub const DEFAULT_INFERENCE_THREADS: u32 = 16;
pub const DEFAULT_INFERENCE_HTTP_THREADS: u32 = 8;
pub const DEFAULT_INFERENCE_FIT: &str = "off";
pub const DEFAULT_INFERENCE_GPU_DEVICES: &str = "0,1,2";

/// The durable deployment specification.
///
/// Runtime-only fields (`config_file`, `data_dir`, `socket_file`) are derived
/// from [`Paths`] on every load and never persisted; they are environment,
/// not user intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub image_tag: String,
    pub port: u16,
    pub llm_base_url: String,
    pub default_model: String,

    /// Required iff `enable_proxy_agent` is set.
    pub proxy_server_url: String,

    pub enable_inference_engine: bool,
    pub enable_proxy_agent: bool,
    pub enable_deep_research: bool,

    pub inference: InferenceConfig,

    #[serde(skip)]
    pub config_file: PathBuf,
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(skip)]
    pub socket_file: PathBuf,
}

/// Runtime parameters for the local GPU inference container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InferenceConfig {
    pub port: u16,
    pub model_file: String,
    pub shm_size: String,
    pub context_size: u32,
    pub batch_size: u32,
    pub gpu_layers: u32,
    pub tensor_split: String,
    /// GPU index 0 is the intended default; 0 is not treated as "unset"
    /// during merge for this field alone, see `merged_with`.
    pub main_gpu: u32,
    pub threads: u32,
    pub http_threads: u32,
    pub fit: String,
    pub gpu_devices: String,
}

/// Machine-owned installation metadata. Never user-edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct State {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub installed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Whether the inference engine was up before the last stop; drives
    /// whether the updater brings it back after an upgrade.
    #[serde(default)]
    pub inference_was_running: bool,
}

impl InferenceConfig {
    pub fn defaults() -> Self {
        Self {
            port: DEFAULT_INFERENCE_PORT,
            model_file: DEFAULT_INFERENCE_MODEL_FILE.to_string(),
            shm_size: DEFAULT_INFERENCE_SHM_SIZE.to_string(),
            context_size: DEFAULT_INFERENCE_CONTEXT_SIZE,
            batch_size: DEFAULT_INFERENCE_BATCH_SIZE,
            gpu_layers: DEFAULT_INFERENCE_GPU_LAYERS,
            tensor_split: DEFAULT_INFERENCE_TENSOR_SPLIT.to_string(),
            main_gpu: 0,
            threads: DEFAULT_INFERENCE_THREADS,
            http_threads: DEFAULT_INFERENCE_HTTP_THREADS,
            fit: DEFAULT_INFERENCE_FIT.to_string(),
            gpu_devices: DEFAULT_INFERENCE_GPU_DEVICES.to_string(),
        }
    }

    /// Per-field merge: zero-valued leaves take the default, everything else
    /// is kept. `main_gpu` is exempt because 0 is its real default and there
    /// is no larger "unset" sentinel worth inventing for it.
    fn merged_with(self, defaults: Self) -> Self {
        Self {
            port: pick(self.port, defaults.port),
            model_file: pick(self.model_file, defaults.model_file),
            shm_size: pick(self.shm_size, defaults.shm_size),
            context_size: pick(self.context_size, defaults.context_size),
            batch_size: pick(self.batch_size, defaults.batch_size),
            gpu_layers: pick(self.gpu_layers, defaults.gpu_layers),
            tensor_split: pick(self.tensor_split, defaults.tensor_split),
            main_gpu: self.main_gpu,
            threads: pick(self.threads, defaults.threads),
            http_threads: pick(self.http_threads, defaults.http_threads),
            fit: pick(self.fit, defaults.fit),
            gpu_devices: pick(self.gpu_devices, defaults.gpu_devices),
        }
    }
}

/// "Zero value means unset" test used by the merge. The known limitation:
/// a user cannot explicitly pin a field to empty/0/false when its default is
/// non-zero; the merge will read that as absent and substitute the default.
trait ZeroValue {
    fn is_zero_value(&self) -> bool;
}

impl ZeroValue for String {
    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl ZeroValue for u16 {
    fn is_zero_value(&self) -> bool {
        *self == 0
    }
}

impl ZeroValue for u32 {
    fn is_zero_value(&self) -> bool {
        *self == 0
    }
}

impl ZeroValue for bool {
    fn is_zero_value(&self) -> bool {
        !*self
    }
}

fn pick<T: ZeroValue>(loaded: T, default: T) -> T {
    if loaded.is_zero_value() {
        default
    } else {
        loaded
    }
}

impl Config {
    /// Fully-defaulted config seeded with `paths`-derived runtime fields.
    pub fn defaults(paths: &Paths) -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            image_tag: DEFAULT_IMAGE_TAG.to_string(),
            port: DEFAULT_PORT,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            proxy_server_url: String::new(),
            enable_inference_engine: false,
            enable_proxy_agent: false,
            enable_deep_research: false,
            inference: InferenceConfig::defaults(),
            config_file: paths.config_file.clone(),
            data_dir: paths.app_data_dir.clone(),
            socket_file: paths.socket_file.clone(),
        }
    }

    /// Deserialize the on-disk document. Absence is reported as
    /// [`BerthError::NotFound`] so callers can choose default construction;
    /// a malformed document is always a [`BerthError::Parse`].
    pub fn load(path: &Path) -> Result<Self> {
        let data = read_document(path)?;
        serde_yaml::from_str(&data).map_err(|e| BerthError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load and merge with defaults, or construct pure defaults when the file
    /// is absent. Merging recurses into the inference block field by field so
    /// a partially-specified nested block only picks up its missing leaves.
    pub fn load_or_default(path: &Path, paths: &Paths) -> Result<Self> {
        let existing = match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) if e.is_not_found() => return Ok(Self::defaults(paths)),
            Err(e) => return Err(e),
        };

        let defaults = Self::defaults(paths);
        let mut merged = Self {
            version: pick(existing.version, defaults.version),
            image_tag: pick(existing.image_tag, defaults.image_tag),
            port: pick(existing.port, defaults.port),
            llm_base_url: pick(existing.llm_base_url, defaults.llm_base_url),
            default_model: pick(existing.default_model, defaults.default_model),
            proxy_server_url: pick(existing.proxy_server_url, defaults.proxy_server_url),
            enable_inference_engine: pick(
                existing.enable_inference_engine,
                defaults.enable_inference_engine,
            ),
            enable_proxy_agent: pick(existing.enable_proxy_agent, defaults.enable_proxy_agent),
            enable_deep_research: pick(existing.enable_deep_research, defaults.enable_deep_research),
            inference: existing.inference.merged_with(defaults.inference),
            config_file: PathBuf::new(),
            data_dir: PathBuf::new(),
            socket_file: PathBuf::new(),
        };

        // Runtime-only fields are always freshly computed, never loaded.
        merged.config_file = paths.config_file.clone();
        merged.data_dir = paths.app_data_dir.clone();
        merged.socket_file = paths.socket_file.clone();

        Ok(merged)
    }

    /// Serialize back to YAML, full fidelity.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self).map_err(|e| BerthError::Other(e.to_string()))?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.image_tag.is_empty() {
            return Err(invalid("image_tag", "cannot be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port", "must be between 1 and 65535"));
        }
        if self.llm_base_url.is_empty() {
            return Err(invalid("llm_base_url", "cannot be empty"));
        }
        if self.default_model.is_empty() {
            return Err(invalid("default_model", "cannot be empty"));
        }

        if self.enable_proxy_agent && self.proxy_server_url.is_empty() {
            return Err(invalid(
                "proxy_server_url",
                "required when enable_proxy_agent is set",
            ));
        }

        if self.enable_inference_engine {
            if self.inference.port == 0 {
                return Err(invalid("inference.port", "must be between 1 and 65535"));
            }
            if self.inference.model_file.is_empty() {
                return Err(invalid("inference.model_file", "cannot be empty"));
            }
            if self.inference.context_size == 0 {
                return Err(invalid("inference.context_size", "must be positive"));
            }
            if self.inference.batch_size == 0 {
                return Err(invalid("inference.batch_size", "must be positive"));
            }
            if self.inference.threads == 0 {
                return Err(invalid("inference.threads", "must be positive"));
            }
            if self.inference.http_threads == 0 {
                return Err(invalid("inference.http_threads", "must be positive"));
            }
        }

        Ok(())
    }

    /// Change the image tag, validate the result, and persist. The mutation
    /// is tried on a scratch copy first so a failed validation leaves the
    /// in-memory config untouched and nothing is written to disk.
    pub fn update_image_tag(&mut self, new_tag: &str, path: &Path) -> Result<()> {
        let mut candidate = self.clone();
        candidate.image_tag = new_tag.to_string();
        candidate.validate()?;

        candidate.save(path)?;
        *self = candidate;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> BerthError {
    BerthError::Validation {
        field,
        reason: reason.to_string(),
    }
}

fn read_document(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(BerthError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

impl State {
    pub fn load(path: &Path) -> Result<Self> {
        let data = read_document(path)?;
        serde_json::from_str(&data).map_err(|e| BerthError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Load, or an empty state when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(state) => Ok(state),
            Err(e) if e.is_not_found() => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema drift detection
// ---------------------------------------------------------------------------

/// Keys present in the raw document but unknown to the current schema
/// (stale or misspelled). Nested inference keys are reported as
/// `inference.<leaf>`. The load itself never fails over these.
pub fn find_unknown_fields(path: &Path) -> Result<Vec<String>> {
    let raw = raw_mapping(path)?;
    let schema = schema_mapping()?;

    let mut unknown = Vec::new();
    diff_keys(&raw, &schema, "", &mut unknown);
    unknown.sort();
    Ok(unknown)
}

/// Schema-known keys absent from the raw document: these fields will
/// silently receive defaults on the next load.
pub fn find_missing_fields(path: &Path) -> Result<Vec<String>> {
    let raw = raw_mapping(path)?;
    let schema = schema_mapping()?;

    let mut missing = Vec::new();
    diff_keys(&schema, &raw, "", &mut missing);
    missing.sort();
    Ok(missing)
}

/// Keys of `left` not present in `right`, recursing where both sides carry a
/// mapping under the same key.
fn diff_keys(
    left: &serde_yaml::Mapping,
    right: &serde_yaml::Mapping,
    prefix: &str,
    out: &mut Vec<String>,
) {
    for (key, left_value) in left {
        let Some(name) = key.as_str() else {
            continue;
        };
        let dotted = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };

        match right.get(key) {
            None => out.push(dotted),
            Some(right_value) => {
                if let (Some(l), Some(r)) = (left_value.as_mapping(), right_value.as_mapping()) {
                    diff_keys(l, r, &dotted, out);
                }
            }
        }
    }
}

fn raw_mapping(path: &Path) -> Result<serde_yaml::Mapping> {
    let data = read_document(path)?;
    let value: serde_yaml::Value = serde_yaml::from_str(&data).map_err(|e| BerthError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    value
        .as_mapping()
        .cloned()
        .ok_or_else(|| BerthError::Parse {
            path: path.to_path_buf(),
            reason: "document is not a mapping".to_string(),
        })
}

/// The current schema as a key tree, derived by serializing a default
/// document so the key list can never drift from the struct definition.
/// Runtime-only fields are serde-skipped and therefore excluded.
fn schema_mapping() -> Result<serde_yaml::Mapping> {
    let paths = Paths::new(Some(PathBuf::new()), Some(PathBuf::new()));
    let value = serde_yaml::to_value(Config::defaults(&paths))
        .map_err(|e| BerthError::Other(e.to_string()))?;
    value
        .as_mapping()
        .cloned()
        .ok_or_else(|| BerthError::Other("config schema is not a mapping".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_paths(dir: &TempDir) -> Paths {
        Paths::new(
            Some(dir.path().join("config")),
            Some(dir.path().join("data")),
        )
    }

    #[test]
    fn load_or_default_without_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);

        let cfg = Config::load_or_default(&paths.config_file, &paths).unwrap();
        assert_eq!(cfg.version, DEFAULT_VERSION);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.inference.port, DEFAULT_INFERENCE_PORT);
        assert!(!cfg.enable_inference_engine);
        assert_eq!(cfg.config_file, paths.config_file);
        assert_eq!(cfg.socket_file, paths.socket_file);
    }

    #[test]
    fn load_distinguishes_absent_from_malformed() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);

        let err = Config::load(&paths.config_file).unwrap_err();
        assert!(err.is_not_found());

        std::fs::create_dir_all(&paths.config_dir).unwrap();
        std::fs::write(&paths.config_file, "port: [not a number").unwrap();
        let err = Config::load(&paths.config_file).unwrap_err();
        assert!(matches!(err, BerthError::Parse { .. }));

        // A malformed document must not be silently defaulted.
        assert!(Config::load_or_default(&paths.config_file, &paths).is_err());
    }

    #[test]
    fn merge_preserves_custom_values_and_fills_missing() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        std::fs::create_dir_all(&paths.config_dir).unwrap();

        let partial = "\
version: \"0.1.2\"
image_tag: \"0.1.2\"
port: 8080
llm_base_url: \"http://custom-url:9000/v1\"
default_model: \"custom-model\"
";
        std::fs::write(&paths.config_file, partial).unwrap();

        let cfg = Config::load_or_default(&paths.config_file, &paths).unwrap();

        assert_eq!(cfg.version, "0.1.2");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.llm_base_url, "http://custom-url:9000/v1");

        // Missing fields picked up defaults.
        assert_eq!(cfg.inference.port, DEFAULT_INFERENCE_PORT);
        assert_eq!(cfg.inference.gpu_layers, DEFAULT_INFERENCE_GPU_LAYERS);
        assert!(!cfg.enable_proxy_agent);
    }

    #[test]
    fn merge_recurses_into_partial_inference_block() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        std::fs::create_dir_all(&paths.config_dir).unwrap();

        let partial = "\
image_tag: \"0.2.0\"
inference:
  port: 40000
  model_file: \"my-model.gguf\"
";
        std::fs::write(&paths.config_file, partial).unwrap();

        let cfg = Config::load_or_default(&paths.config_file, &paths).unwrap();
        assert_eq!(cfg.inference.port, 40000);
        assert_eq!(cfg.inference.model_file, "my-model.gguf");
        // Unspecified leaves of the nested block still defaulted.
        assert_eq!(cfg.inference.threads, DEFAULT_INFERENCE_THREADS);
        assert_eq!(cfg.inference.shm_size, DEFAULT_INFERENCE_SHM_SIZE);
    }

    #[test]
    fn merge_is_idempotent_on_fully_populated_config() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        std::fs::create_dir_all(&paths.config_dir).unwrap();

        let mut cfg = Config::defaults(&paths);
        cfg.port = 9999;
        cfg.image_tag = "9.9.9".to_string();
        cfg.inference.context_size = 16384;
        cfg.save(&paths.config_file).unwrap();

        let reloaded = Config::load_or_default(&paths.config_file, &paths).unwrap();
        assert_eq!(reloaded, cfg);

        // Merging again over its own save changes nothing.
        reloaded.save(&paths.config_file).unwrap();
        let again = Config::load_or_default(&paths.config_file, &paths).unwrap();
        assert_eq!(again, reloaded);
    }

    #[test]
    fn runtime_fields_are_recomputed_not_loaded() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        std::fs::create_dir_all(&paths.config_dir).unwrap();
        Config::defaults(&paths).save(&paths.config_file).unwrap();

        let other = Paths::new(
            Some(dir.path().join("elsewhere")),
            Some(dir.path().join("elsewhere-data")),
        );
        let cfg = Config::load_or_default(&paths.config_file, &other).unwrap();
        assert_eq!(cfg.config_file, other.config_file);
        assert_eq!(cfg.data_dir, other.app_data_dir);
        assert_eq!(cfg.socket_file, other.socket_file);
    }

    #[test]
    fn validation_gating() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        let mut cfg = Config::defaults(&paths);
        assert!(cfg.validate().is_ok());

        cfg.port = 0;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            BerthError::Validation { field: "port", .. }
        ));
        cfg.port = DEFAULT_PORT;

        cfg.image_tag.clear();
        assert!(cfg.validate().is_err());
        cfg.image_tag = DEFAULT_IMAGE_TAG.to_string();

        // Conditionally-required field: only checked while the toggle is on.
        cfg.enable_proxy_agent = true;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            BerthError::Validation {
                field: "proxy_server_url",
                ..
            }
        ));
        cfg.enable_proxy_agent = false;
        assert!(cfg.validate().is_ok());

        cfg.enable_inference_engine = true;
        cfg.inference.threads = 0;
        assert!(cfg.validate().is_err());
        cfg.enable_inference_engine = false;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn update_image_tag_rejects_invalid_without_committing() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        std::fs::create_dir_all(&paths.config_dir).unwrap();

        let mut cfg = Config::defaults(&paths);
        cfg.save(&paths.config_file).unwrap();

        assert!(cfg.update_image_tag("", &paths.config_file).is_err());
        assert_eq!(cfg.image_tag, DEFAULT_IMAGE_TAG);
        let on_disk = Config::load(&paths.config_file).unwrap();
        assert_eq!(on_disk.image_tag, DEFAULT_IMAGE_TAG);

        cfg.update_image_tag("0.4.0", &paths.config_file).unwrap();
        assert_eq!(cfg.image_tag, "0.4.0");
        let on_disk = Config::load(&paths.config_file).unwrap();
        assert_eq!(on_disk.image_tag, "0.4.0");
    }

    #[test]
    fn unknown_and_missing_field_round_trip() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        std::fs::create_dir_all(&paths.config_dir).unwrap();

        let doc = "\
version: \"0.1.0\"
image_tag: \"0.1.0\"
legacy_knob: true
inference:
  port: 40000
  warp_factor: 9
";
        std::fs::write(&paths.config_file, doc).unwrap();

        let unknown = find_unknown_fields(&paths.config_file).unwrap();
        assert_eq!(unknown, vec!["inference.warp_factor", "legacy_knob"]);

        let missing = find_missing_fields(&paths.config_file).unwrap();
        assert!(missing.contains(&"port".to_string()));
        assert!(missing.contains(&"enable_proxy_agent".to_string()));
        assert!(missing.contains(&"inference.model_file".to_string()));
        assert!(!missing.contains(&"version".to_string()));
        assert!(!missing.contains(&"inference.port".to_string()));
    }

    #[test]
    fn fully_populated_file_has_no_missing_fields() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        std::fs::create_dir_all(&paths.config_dir).unwrap();
        Config::defaults(&paths).save(&paths.config_file).unwrap();

        assert!(find_missing_fields(&paths.config_file).unwrap().is_empty());
        assert!(find_unknown_fields(&paths.config_file).unwrap().is_empty());
    }

    #[test]
    fn state_round_trip_and_absence() {
        let dir = TempDir::new().unwrap();
        let paths = test_paths(&dir);
        std::fs::create_dir_all(&paths.data_dir).unwrap();

        // Absence means not installed.
        let state = State::load_or_default(&paths.state_file).unwrap();
        assert!(state.installed_at.is_none());

        let state = State {
            version: "0.3.2".to_string(),
            installed_at: Some(Utc::now()),
            last_updated: Some(Utc::now()),
            inference_was_running: true,
        };
        state.save(&paths.state_file).unwrap();

        let loaded = State::load(&paths.state_file).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn state_tolerates_older_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        // A state file written before inference_was_running existed.
        std::fs::write(
            &path,
            r#"{"version":"0.1.0","installed_at":"2026-01-02T03:04:05Z"}"#,
        )
        .unwrap();

        let state = State::load(&path).unwrap();
        assert_eq!(state.version, "0.1.0");
        assert!(!state.inference_was_running);
        assert!(state.last_updated.is_none());
    }
}
