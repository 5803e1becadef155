use std::sync::Arc;

use crate::config::Config;
use crate::llm::{GeminiClient, GenerativeModel};
use crate::rate_limit::RateLimiter;
use crate::recognition::{RecognitionFactory, RecognitionStrategy};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub model: Arc<dyn GenerativeModel>,
    pub recognizer: Arc<dyn RecognitionStrategy>,
    /// Present only when rate limiting is enabled.
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let model: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::from_config(&config.ai_config)?);
        Ok(Self::from_parts(config, model))
    }

    /// Assemble state around an existing model client.
    pub fn from_parts(config: Config, model: Arc<dyn GenerativeModel>) -> Self {
        let recognizer =
            RecognitionFactory::create(&config.recognition_config, &config.ai_config, model.clone());
        Self::with_recognizer(config, model, recognizer)
    }

    pub fn with_recognizer(
        config: Config,
        model: Arc<dyn GenerativeModel>,
        recognizer: Arc<dyn RecognitionStrategy>,
    ) -> Self {
        let rate_limiter = config
            .rate_limit_config
            .enabled
            .then(|| Arc::new(RateLimiter::from_config(&config.rate_limit_config)));
        Self {
            config,
            model,
            recognizer,
            rate_limiter,
        }
    }
}
