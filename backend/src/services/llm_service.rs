use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::errors::LlmError;
use crate::external::http_client;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MAX_ATTEMPTS: u32 = 4;
const LLM_TIMEOUT: Duration = Duration::from_secs(30);
const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Configuration for LLM service
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            timeout: LLM_TIMEOUT,
        }
    }
}

impl LlmConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            enabled: config.llm_enabled,
            api_key: config.gemini_api_key.clone(),
            model: config.llm_model.clone(),
            timeout: LLM_TIMEOUT,
        }
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate_completion(&self, prompt: String) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

fn response_text(response: GeminiResponse) -> Result<String, LlmError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::InvalidResponse("No text in response candidates".to_string()));
    }
    Ok(text)
}

/// Google Gemini `generateContent` provider
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = http_client(timeout).map_err(|e| LlmError::NetworkError(e.to_string()))?;
        Ok(Self { api_key, model, client })
    }

    async fn call_gemini_with_retry(&self, request: &GeminiRequest) -> Result<GeminiResponse, LlmError> {
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.call_gemini(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_ATTEMPTS {
                        error!("Gemini call failed after {} attempts: {}", MAX_ATTEMPTS, e);
                        return Err(e);
                    }

                    warn!(
                        "Gemini call failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt, MAX_ATTEMPTS, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    async fn call_gemini(&self, request: &GeminiRequest) -> Result<GeminiResponse, LlmError> {
        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate_completion(&self, prompt: String) -> Result<String, LlmError> {
        info!("Generating LLM completion (model: {})", self.model);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = self.call_gemini_with_retry(&request).await?;

        if let Some(usage) = &response.usage_metadata {
            info!(
                "LLM completion generated. Tokens: {} prompt + {} completion",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        response_text(response)
    }
}

#[derive(Debug, Clone)]
struct CachedResponse {
    content: String,
    created_at: Instant,
}

/// LLM response cache with TTL
pub struct LlmCache {
    cache: Arc<RwLock<HashMap<String, CachedResponse>>>,
    ttl: Duration,
}

impl LlmCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let cache = self.cache.read().await;
        cache
            .get(key)
            .filter(|cached| cached.created_at.elapsed() < self.ttl)
            .map(|cached| cached.content.clone())
    }

    pub async fn set(&self, key: String, value: String) {
        let mut cache = self.cache.write().await;
        cache.retain(|_, v| v.created_at.elapsed() < self.ttl);
        cache.insert(
            key,
            CachedResponse {
                content: value,
                created_at: Instant::now(),
            },
        );
    }
}

/// Morning-briefing prompt for `topic` as of `date`.
pub fn build_research_prompt(topic: &str, date: NaiveDate) -> String {
    let today = date.format("%d %B %Y");
    format!(
        "Role: You are a senior crypto market analyst giving a morning briefing to a trader.\n\
         Style: Straight to the point, dense, data-driven and confident.\n\n\
         Time context: Assume today is **{today}**. Use the most recent information you have, \
         focusing on events and data from the last few months where possible.\n\n\
         Task: Give a strategic briefing on the following topic: '{topic}'.\n\n\
         Follow this structure exactly:\n\n\
         ### [Asset Name] Outlook - {today}\n\n\
         * **Conclusion & Sentiment:** (One sentence. State whether short-term sentiment is Bullish, \
         Bearish or Neutral and give the main reason.)\n\n\
         * **Key Analysis:**\n\
         \x20   * **Technical:** Name the specific support and resistance levels that matter now, and \
         the state of key indicators such as RSI (e.g. \"RSI at 45, neutral\").\n\
         \x20   * **Sentiment & News:** Name one or two recent stories or narratives moving the market.\n\
         \x20   * **Macro/On-Chain Factor:** Pick one external factor (e.g. Fed policy) OR one \
         on-chain metric that matters most.\n\n\
         * **Main Market Driver This Week:** (The single most important event to watch.)\n\n\
         IMPORTANT: Do not use placeholders. Answer as if you have access to current market data."
    )
}

/// LLM service with provider abstraction and caching
pub struct LlmService {
    provider: Option<Arc<dyn LlmProvider>>,
    cache: LlmCache,
}

impl LlmService {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let provider = match (config.enabled, config.api_key) {
            (false, _) => {
                info!("LLM features are disabled in configuration");
                None
            }
            (true, Some(api_key)) if !api_key.trim().is_empty() => {
                info!("Initializing LLM service with Gemini model {}", config.model);
                let provider = GeminiProvider::new(api_key, config.model, config.timeout)?;
                Some(Arc::new(provider) as Arc<dyn LlmProvider>)
            }
            (true, _) => {
                warn!("LLM API key not configured. LLM features disabled.");
                None
            }
        };

        Ok(Self::with_provider(provider))
    }

    pub fn with_provider(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            provider,
            cache: LlmCache::new(CACHE_TTL),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Briefing for `topic`, cached per topic and date.
    pub async fn research(&self, topic: &str, date: NaiveDate) -> Result<String, LlmError> {
        let provider = self.provider.as_ref().ok_or(LlmError::Disabled)?;

        let cache_key = format!("research:{}:{}", date, topic.trim().to_lowercase());
        if let Some(cached) = self.cache.get(&cache_key).await {
            info!("Research cache hit for '{}'", topic);
            return Ok(cached);
        }

        let analysis = provider
            .generate_completion(build_research_prompt(topic.trim(), date))
            .await?;
        self.cache.set(cache_key, analysis.clone()).await;
        Ok(analysis)
    }

    /// Like [`LlmService::research`] but folds failures into readable text.
    pub async fn analyze_topic(&self, topic: &str, date: NaiveDate) -> String {
        match self.research(topic, date).await {
            Ok(analysis) => analysis,
            Err(LlmError::Disabled) => {
                "AI research is disabled. Configure GEMINI_API_KEY to enable it.".to_string()
            }
            Err(e) => {
                warn!("Research for '{}' failed: {}", topic, e);
                format!("An error occurred while contacting the AI: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for CountingProvider {
        async fn generate_completion(&self, prompt: String) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LlmError::ApiError("HTTP 500: boom".to_string()));
            }
            Ok(format!("briefing ({} chars)", prompt.len()))
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 5).unwrap()
    }

    #[test]
    fn test_prompt_carries_topic_and_date() {
        let prompt = build_research_prompt("ETH ETF flows", day());
        assert!(prompt.contains("'ETH ETF flows'"));
        assert!(prompt.contains("### [Asset Name] Outlook - 05 October 2024"));
        assert!(prompt.contains("Main Market Driver This Week"));
    }

    #[test]
    fn test_disabled_without_key() {
        let service = LlmService::new(LlmConfig {
            enabled: true,
            ..LlmConfig::default()
        })
        .unwrap();
        assert!(!service.is_enabled());

        let service = LlmService::new(LlmConfig::default()).unwrap();
        assert!(!service.is_enabled());
    }

    #[tokio::test]
    async fn test_research_is_cached_per_topic_and_date() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let service = LlmService::with_provider(Some(provider.clone() as Arc<dyn LlmProvider>));

        let first = service.research("Bitcoin", day()).await.unwrap();
        let second = service.research("bitcoin ", day()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        service.research("Bitcoin", day().succ_opt().unwrap()).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_analyze_topic_never_fails() {
        let service = LlmService::with_provider(None);
        assert!(service.analyze_topic("BTC", day()).await.contains("disabled"));

        let provider: Arc<dyn LlmProvider> = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let failing = LlmService::with_provider(Some(provider));
        let text = failing.analyze_topic("BTC", day()).await;
        assert!(text.starts_with("An error occurred while contacting the AI"));
        assert!(text.contains("boom"));
    }

    #[tokio::test]
    async fn test_cache_expires() {
        let cache = LlmCache::new(Duration::from_millis(50));
        cache.set("k".to_string(), "v".to_string()).await;
        assert_eq!(cache.get("k").await, Some("v".to_string()));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body: GeminiResponse = serde_json::from_str(
            r####"{"candidates":[{"content":{"parts":[{"text":"### BTC"},{"text":" Outlook"}]}}]}"####,
        )
        .unwrap();
        assert_eq!(response_text(body).unwrap(), "### BTC Outlook");

        let empty: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(response_text(empty), Err(LlmError::InvalidResponse(_))));
    }
}
