// src/config/mod.rs
// Runtime configuration: loaded once from the environment (plus .env if present).

use std::str::FromStr;

/// Everything the binary needs to know at startup: where the store lives,
/// which repositories to ingest, and which API credentials to rotate through.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store connection string, e.g. `sqlite:./prospector.db`.
    pub database_url: String,
    /// Repositories to ingest, as `owner/name` full names.
    pub projects: Vec<String>,
    /// Pool of GitHub API tokens; one is picked at random per request.
    /// May be empty, in which case requests go out unauthenticated.
    pub github_tokens: Vec<String>,
    /// Optional commit-metrics CSV feed.
    pub csv_path: Option<String>,
    /// API root, overridable for tests.
    pub api_base_url: String,
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean = val.split('#').next().unwrap_or("").trim();
            match clean.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => default,
            }
        }
        Err(_) => default,
    }
}

fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl Config {
    pub fn from_env() -> Self {
        // Not an error when missing; plain env vars still apply.
        let _ = dotenvy::dotenv();

        Self {
            database_url: env_var_or("PROSPECTOR_DATABASE_URL", "sqlite:./prospector.db".to_string()),
            projects: env_list("PROSPECTOR_PROJECTS"),
            github_tokens: env_list("PROSPECTOR_GH_TOKENS"),
            csv_path: std::env::var("PROSPECTOR_CSV_PATH").ok().filter(|s| !s.is_empty()),
            api_base_url: env_var_or("PROSPECTOR_API_URL", "https://api.github.com".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_or_strips_comments() {
        std::env::set_var("PROSPECTOR_TEST_PORT", "8080 # local override");
        let port: u16 = env_var_or("PROSPECTOR_TEST_PORT", 0);
        assert_eq!(port, 8080);
    }

    #[test]
    fn env_list_splits_and_trims() {
        std::env::set_var("PROSPECTOR_TEST_LIST", "a/b, c/d ,,e/f");
        assert_eq!(env_list("PROSPECTOR_TEST_LIST"), vec!["a/b", "c/d", "e/f"]);
    }
}
