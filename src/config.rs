use serde::{Deserialize, Serialize};
use anyhow::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub ai_config: AiConfig,
    #[serde(default)]
    pub recognition_config: RecognitionConfig,
    #[serde(default)]
    pub rate_limit_config: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub host: String,
    pub port: u16,
    /// "development" or "production"
    #[serde(default = "default_environment")]
    pub environment: String,
    /// The single origin allowed to call the API cross-origin.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
    /// Read the client address from X-Forwarded-For (set when behind a reverse proxy).
    #[serde(default = "default_true")]
    pub trust_proxy: bool,
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_max_upload_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl SystemConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used for image requests (combined OCR + derive).
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    /// Model used for text-only prompts.
    #[serde(default = "default_text_model")]
    pub text_model: String,
    /// Candidates tried, in order, by the connectivity test endpoint.
    #[serde(default = "default_test_models")]
    pub test_models: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_vision_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_text_model() -> String {
    "gemini-2.5-flash-image-preview".to_string()
}

fn default_test_models() -> Vec<String> {
    vec![
        "models/gemini-1.5-flash".to_string(),
        "models/gemini-1.5-pro".to_string(),
        "models/gemini-pro".to_string(),
    ]
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Which recognition pipeline serves `/process-image`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionStrategyKind {
    /// One vision call that transcribes and derives at once.
    Combined,
    /// Local OCR first, then a text-only prompt.
    TwoStage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default = "default_strategy")]
    pub strategy: RecognitionStrategyKind,
    #[serde(default = "default_ocr_command")]
    pub ocr_command: String,
    /// Tesseract language list, e.g. "eng" or "eng+deu".
    #[serde(default = "default_ocr_languages")]
    pub ocr_languages: String,
    #[serde(default = "default_ocr_timeout_secs")]
    pub ocr_timeout_secs: u64,
}

fn default_strategy() -> RecognitionStrategyKind {
    RecognitionStrategyKind::Combined
}

fn default_ocr_command() -> String {
    "tesseract".to_string()
}

fn default_ocr_languages() -> String {
    "eng".to_string()
}

fn default_ocr_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_max_requests() -> u32 {
    100
}

impl Config {
    /// Build the configuration from defaults, an optional YAML/JSON file and
    /// the environment. Later sources win.
    pub fn load(path: &str) -> Result<Self> {
        let defaults = ::config::Config::try_from(&Config::default())?;

        let builder = ::config::Config::builder()
            .add_source(defaults)
            .add_source(::config::File::with_name(path).required(false))
            .add_source(
                ::config::Environment::with_prefix("STUDY_BUDDY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ai_config.test_models")
                    .try_parsing(true),
            )
            .set_override_option("ai_config.api_key", std::env::var("GOOGLE_AI_API_KEY").ok())?
            .set_override_option("system_config.port", std::env::var("PORT").ok())?
            .set_override_option("system_config.environment", std::env::var("NODE_ENV").ok())?;

        let config: Config = builder.build()?.try_deserialize()?;
        Ok(config)
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            environment: default_environment(),
            cors_origin: default_cors_origin(),
            max_upload_mb: default_max_upload_mb(),
            trust_proxy: default_true(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            vision_model: default_vision_model(),
            text_model: default_text_model(),
            test_models: default_test_models(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            ocr_command: default_ocr_command(),
            ocr_languages: default_ocr_languages(),
            ocr_timeout_secs: default_ocr_timeout_secs(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
        }
    }
}
