use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use tripweave_maps::ResolverLimits;

pub const DEFAULT_PLANNER_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_KEYWORD: &str = "景点";
pub const AIRPORT_KEYWORD: &str = "机场";

#[derive(Clone)]
pub struct OrchestratorConfig {
    /// Model planner credential; `None` routes every request to the fallback.
    pub planner_api_key: Option<String>,
    pub planner_timeout: Duration,
    pub limits: ResolverLimits,
    /// Search keyword when the request states no preference.
    pub default_keyword: String,
    pub airport_keyword: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            planner_api_key: None,
            planner_timeout: DEFAULT_PLANNER_TIMEOUT,
            limits: ResolverLimits::default(),
            default_keyword: DEFAULT_KEYWORD.to_string(),
            airport_keyword: AIRPORT_KEYWORD.to_string(),
        }
    }
}

impl fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field(
                "planner_api_key",
                &self.planner_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("planner_timeout", &self.planner_timeout)
            .field("limits", &self.limits)
            .field("default_keyword", &self.default_keyword)
            .field("airport_keyword", &self.airport_keyword)
            .finish()
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let planner_api_key = non_empty("LLM_API_KEY").or_else(|| non_empty("OPENAI_API_KEY"));
        let planner_timeout = Duration::from_secs(parse_or(
            "TRIPWEAVE_PLANNER_TIMEOUT_SECS",
            non_empty("TRIPWEAVE_PLANNER_TIMEOUT_SECS"),
            defaults.planner_timeout.as_secs(),
        ));
        let limits = ResolverLimits {
            max_pois: parse_or(
                "TRIPWEAVE_MAX_POIS",
                non_empty("TRIPWEAVE_MAX_POIS"),
                defaults.limits.max_pois,
            ),
            first_poi_candidates: parse_or(
                "TRIPWEAVE_FIRST_POI_CANDIDATES",
                non_empty("TRIPWEAVE_FIRST_POI_CANDIDATES"),
                defaults.limits.first_poi_candidates,
            ),
        };

        Self {
            planner_api_key,
            planner_timeout,
            limits,
            default_keyword: non_empty("TRIPWEAVE_DEFAULT_KEYWORD")
                .unwrap_or(defaults.default_keyword),
            airport_keyword: non_empty("TRIPWEAVE_AIRPORT_KEYWORD")
                .unwrap_or(defaults.airport_keyword),
        }
    }

    pub fn has_planner_credential(&self) -> bool {
        self.planner_api_key.is_some()
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }
    }
}
