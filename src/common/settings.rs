//! App-specific configuration, loaded from the `settings:` block of loco's
//! layered YAML config.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub screening: ScreeningSettings,
    #[serde(default)]
    pub uploads: UploadSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            timeout_ms: default_llm_timeout_ms(),
        }
    }
}

fn default_llm_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "llama3".to_string()
}

fn default_llm_timeout_ms() -> u64 {
    15_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningSettings {
    #[serde(default)]
    pub pool: PoolSettings,
}

impl Default for ScreeningSettings {
    fn default() -> Self {
        Self { pool: PoolSettings::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    #[serde(default = "default_core")]
    pub core: usize,
    #[serde(default = "default_max")]
    pub max: usize,
    #[serde(default = "default_queue")]
    pub queue: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self { core: default_core(), max: default_max(), queue: default_queue() }
    }
}

fn default_core() -> usize {
    2
}

fn default_max() -> usize {
    5
}

fn default_queue() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    #[serde(default = "default_resume_dir")]
    pub resume_dir: String,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self { resume_dir: default_resume_dir() }
    }
}

fn default_resume_dir() -> String {
    "uploads/resumes".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            screening: ScreeningSettings::default(),
            uploads: UploadSettings::default(),
        }
    }
}

impl Settings {
    /// Pulls the `settings:` block out of the loco-loaded config, falling
    /// back to defaults when it is absent (e.g. under the `test` environment).
    pub fn from_context(ctx: &loco_rs::app::AppContext) -> Self {
        ctx.config
            .settings
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}
