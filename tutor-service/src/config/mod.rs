use secrecy::Secret;
use service_core::config::{self as core_config, first_present, require_any};
use service_core::error::AppError;
use std::env;

/// Public Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Frontend dev servers allowed to call the API with credentials.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

const DEFAULT_QUESTION_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TABLE: &str = "questions";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct TutorConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub supabase: SupabaseSettings,
    pub cors: CorsSettings,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Secret<String>,
    pub base_url: String,
    /// Model answering student questions.
    pub question_model: String,
    /// Model used for summarize/explain.
    pub analysis_model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub api_key: Secret<String>,
    pub table: String,
}

#[derive(Debug, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl TutorConfig {
    pub fn load() -> Result<Self, AppError> {
        // Also pulls in .env / .env.local before the lookups below.
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let request_timeout_secs = match first_present(&lookup, &["HTTP_TIMEOUT_SECS"]) {
            Some(raw) => raw.parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("HTTP_TIMEOUT_SECS is invalid: {}", e))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let allowed_origins = first_present(&lookup, &["CORS_ALLOWED_ORIGINS"])
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect());

        Ok(TutorConfig {
            common,
            gemini: GeminiSettings {
                api_key: Secret::new(require_any(&lookup, &["GEMINI_API_KEY"])?),
                base_url: get_env(&lookup, "GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
                question_model: get_env(&lookup, "GENAI_QUESTION_MODEL", DEFAULT_QUESTION_MODEL),
                analysis_model: get_env(&lookup, "GENAI_ANALYSIS_MODEL", DEFAULT_ANALYSIS_MODEL),
                request_timeout_secs,
            },
            supabase: SupabaseSettings {
                url: require_any(&lookup, &["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"])?,
                api_key: Secret::new(require_any(
                    &lookup,
                    &["SUPABASE_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"],
                )?),
                table: get_env(&lookup, "SUPABASE_TABLE", DEFAULT_TABLE),
            },
            cors: CorsSettings { allowed_origins },
        })
    }
}

fn get_env<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    first_present(lookup, &[key]).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<TutorConfig, AppError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TutorConfig::from_lookup(core_config::Config::default(), move |key| {
            map.get(key).cloned()
        })
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("GEMINI_API_KEY", "gemini-key"),
        ("SUPABASE_URL", "https://project.supabase.co"),
        ("SUPABASE_KEY", "service-key"),
    ];

    #[test]
    fn loads_required_values_and_defaults() {
        let config = load(&REQUIRED).expect("config should load");

        assert_eq!(config.gemini.api_key.expose_secret(), "gemini-key");
        assert_eq!(config.gemini.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.gemini.question_model, "gemini-2.0-flash");
        assert_eq!(config.gemini.analysis_model, "gemini-2.5-flash");
        assert_eq!(config.supabase.url, "https://project.supabase.co");
        assert_eq!(config.supabase.table, "questions");
        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
    }

    #[test]
    fn falls_back_to_public_supabase_names() {
        let config = load(&[
            ("GEMINI_API_KEY", "k"),
            ("NEXT_PUBLIC_SUPABASE_URL", "https://public.supabase.co"),
            ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon"),
        ])
        .expect("config should load");

        assert_eq!(config.supabase.url, "https://public.supabase.co");
        assert_eq!(config.supabase.api_key.expose_secret(), "anon");
    }

    #[test]
    fn private_supabase_names_take_precedence() {
        let config = load(&[
            ("GEMINI_API_KEY", "k"),
            ("SUPABASE_URL", "https://private.supabase.co"),
            ("NEXT_PUBLIC_SUPABASE_URL", "https://public.supabase.co"),
            ("SUPABASE_KEY", "service"),
            ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon"),
        ])
        .expect("config should load");

        assert_eq!(config.supabase.url, "https://private.supabase.co");
        assert_eq!(config.supabase.api_key.expose_secret(), "service");
    }

    #[test]
    fn missing_gemini_key_is_a_config_error() {
        let err = load(&REQUIRED[1..]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn missing_supabase_key_is_a_config_error() {
        let err = load(&REQUIRED[..2]).unwrap_err();
        assert!(err.to_string().contains("NEXT_PUBLIC_SUPABASE_ANON_KEY"));
    }

    #[test]
    fn parses_origin_list_and_timeout() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"));
        pairs.push(("HTTP_TIMEOUT_SECS", "30"));
        let config = load(&pairs).expect("config should load");

        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.gemini.request_timeout_secs, 30);
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("HTTP_TIMEOUT_SECS", "soon"));
        assert!(matches!(load(&pairs), Err(AppError::ConfigError(_))));
    }
}
