use courtside_api::client::DEFAULT_BASE_URL;
use log::LevelFilter;
use std::time::Duration;

pub const DEFAULT_TEAM_NAME: &str = "Skywalkers";
pub const DEFAULT_REFRESH_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    pub api_url: String,
    pub team_name: String,
    pub refresh_interval: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            api_url: DEFAULT_BASE_URL.to_owned(),
            team_name: DEFAULT_TEAM_NAME.to_owned(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset, blank or unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            full_screen: false,
            log_level: get("COURTSIDE_LOG_LEVEL").and_then(|v| v.parse::<LevelFilter>().ok()),
            api_url: get("COURTSIDE_API_URL").unwrap_or(defaults.api_url),
            team_name: get("COURTSIDE_TEAM_NAME").unwrap_or(defaults.team_name),
            refresh_interval: get("COURTSIDE_REFRESH_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> AppSettings {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(settings(&[]), AppSettings::default());
        assert_eq!(AppSettings::default().api_url, "http://localhost:8001");
    }

    #[test]
    fn environment_overrides() {
        let s = settings(&[
            ("COURTSIDE_API_URL", "https://team.example/api"),
            ("COURTSIDE_TEAM_NAME", " Red Dragons "),
            ("COURTSIDE_REFRESH_SECS", "15"),
            ("COURTSIDE_LOG_LEVEL", "debug"),
        ]);
        assert_eq!(s.api_url, "https://team.example/api");
        assert_eq!(s.team_name, "Red Dragons");
        assert_eq!(s.refresh_interval, Duration::from_secs(15));
        assert_eq!(s.log_level, Some(LevelFilter::Debug));
    }

    #[test]
    fn bad_values_fall_back() {
        let s = settings(&[
            ("COURTSIDE_REFRESH_SECS", "0"),
            ("COURTSIDE_LOG_LEVEL", "loud"),
            ("COURTSIDE_TEAM_NAME", "   "),
        ]);
        assert_eq!(s.refresh_interval, Duration::from_secs(DEFAULT_REFRESH_SECS));
        assert_eq!(s.log_level, None);
        assert_eq!(s.team_name, DEFAULT_TEAM_NAME);
    }
}
