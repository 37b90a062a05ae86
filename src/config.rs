use serde::Deserialize;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://api.firecrawl.dev";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro-exp-03-25";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub host: String,
    /// Bearer token for the hosted search service.
    pub firecrawl_api_key: Option<String>,
    /// Self-hosted search deployment; takes precedence over the hosted endpoint.
    pub firecrawl_internal_url: Option<String>,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Upper bound on leads enriched concurrently by a batch call.
    pub batch_concurrency: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let firecrawl_api_key = non_blank("FIRECRAWL_API_KEY");
        let firecrawl_internal_url = non_blank("FIRECRAWL_INTERNAL_URL")
            .map(|url| validate_http_url("FIRECRAWL_INTERNAL_URL", &url))
            .transpose()?;

        if firecrawl_api_key.is_none() && firecrawl_internal_url.is_none() {
            anyhow::bail!("Configure FIRECRAWL_API_KEY or FIRECRAWL_INTERNAL_URL");
        }

        let config = Self {
            port: non_blank("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            host: non_blank("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            firecrawl_api_key,
            firecrawl_internal_url,
            gemini_api_key: non_blank("GEMINI_API_KEY")
                .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY environment variable required"))?,
            gemini_model: non_blank("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: non_blank("GEMINI_BASE_URL")
                .map(|url| validate_http_url("GEMINI_BASE_URL", &url))
                .transpose()?
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            batch_concurrency: non_blank("ENRICH_BATCH_CONCURRENCY")
                .unwrap_or_else(|| "4".to_string())
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    anyhow::anyhow!("ENRICH_BATCH_CONCURRENCY must be a positive integer")
                })?,
        };

        // Never log the keys themselves
        if config.firecrawl_internal_url.is_some() {
            tracing::info!("Using internal search backend: {}", config.search_base_url());
        } else {
            tracing::info!("Using cloud search backend: {}", config.search_base_url());
        }
        tracing::debug!("Gemini model: {}", config.gemini_model);
        tracing::debug!("Batch concurrency: {}", config.batch_concurrency);
        tracing::debug!("Server: {}:{}", config.host, config.port);

        Ok(config)
    }

    /// Base URL of the search backend, without a trailing slash.
    pub fn search_base_url(&self) -> String {
        self.firecrawl_internal_url
            .as_deref()
            .unwrap_or(DEFAULT_SEARCH_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }
}

fn validate_http_url(key: &str, raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    let parsed = url::Url::parse(raw)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", key, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", key);
    }
    Ok(raw.trim_end_matches('/').to_string())
}
