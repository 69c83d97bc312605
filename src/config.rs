use anyhow::Result;
use dotenvy::dotenv;

/// Upload cap for dataset files. Larger payloads are rejected before parsing.
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

// Keys shipped in example .env files. Treated the same as no key at all.
const PLACEHOLDER_API_KEY: &str = "YOUR_ACTUAL_GEMINI_API_KEY_HERE";

#[derive(Debug, Clone)]
pub struct Config {
    pub max_upload_bytes: usize,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
}

pub fn load() -> Result<Config> {
    // Load .env file first
    dotenv().ok();

    let gemini_api_key = std::env::var("GEMINI_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty() && key != PLACEHOLDER_API_KEY);

    let gemini_base_url = std::env::var("GEMINI_BASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

    Ok(Config {
        max_upload_bytes: MAX_UPLOAD_BYTES,
        gemini_api_key,
        gemini_base_url,
    })
}
