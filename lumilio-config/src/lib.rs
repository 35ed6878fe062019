//! Typed engine configuration: environment variables (via `dotenvy` and
//! `std::env`) layered under an optional TOML file override, validated
//! eagerly at load time so a bad deployment fails at startup, not mid-run.

use std::path::{Path, PathBuf};

use lumilio_model::ids::RepoID;
use lumilio_model::{FeatureFlags, Repository};
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileIo { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    FileParse { path: PathBuf, source: toml::de::Error },

    #[error("failed to parse {var} as JSON: {source}")]
    EnvJson { var: &'static str, source: serde_json::Error },

    #[error("invalid {field} url: {source}")]
    InvalidUrl { field: &'static str, source: url::ParseError },

    #[error("repository path does not exist: {0}")]
    RepositoryPathMissing(PathBuf),

    #[error("no repositories configured")]
    NoRepositories,
}

/// One `{id, path, name}` bootstrap entry. `id` is optional; when absent a
/// stable id is derived from the path so repeated loads of the same
/// deployment don't mint a new repository identity every startup.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositorySeed {
    pub id: Option<String>,
    pub path: PathBuf,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TimeoutsConfig {
    pub debounce_interval_ms: Option<u64>,
    pub reconciliation_batch_size: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub repositories: Vec<Repository>,
    pub database_url: String,
    pub queue_url: Option<String>,
    pub ml_service_url: String,
    pub feature_flags: FeatureFlags,
    pub timeouts: TimeoutsConfig,
    pub staging_dir: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
struct FileOverrides {
    #[serde(default)]
    repositories: Vec<RepositorySeed>,
    database_url: Option<String>,
    queue_url: Option<String>,
    ml_service_url: Option<String>,
    feature_flags: Option<FeatureFlags>,
    timeouts: Option<TimeoutsConfig>,
    staging_dir: Option<PathBuf>,
}

/// Loads `.env` + `std::env`, then applies `config_path`'s TOML overrides
/// (when given) on top, then validates every field eagerly.
pub fn load(config_path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let mut database_url = std::env::var("DATABASE_URL").ok();
    let mut queue_url = std::env::var("QUEUE_URL").ok();
    let mut ml_service_url = std::env::var("ML_SERVICE_URL").ok();
    let mut staging_dir = std::env::var("STAGING_DIR").ok().map(PathBuf::from);
    let mut timeouts = TimeoutsConfig::default();
    let mut feature_flags = FeatureFlags {
        clip_enabled: env_flag("CLIP_ENABLED"),
        ocr_enabled: env_flag("OCR_ENABLED"),
        caption_enabled: env_flag("CAPTION_ENABLED"),
        face_enabled: env_flag("FACE_ENABLED"),
    };
    let mut seeds: Vec<RepositorySeed> = match std::env::var("REPOSITORIES") {
        Ok(raw) => serde_json::from_str(&raw)
            .map_err(|source| ConfigError::EnvJson { var: "REPOSITORIES", source })?,
        Err(_) => Vec::new(),
    };

    if let Some(path) = config_path {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::FileIo { path: path.to_path_buf(), source })?;
        let overrides: FileOverrides = toml::from_str(&contents)
            .map_err(|source| ConfigError::FileParse { path: path.to_path_buf(), source })?;

        if !overrides.repositories.is_empty() {
            seeds = overrides.repositories;
        }
        database_url = overrides.database_url.or(database_url);
        queue_url = overrides.queue_url.or(queue_url);
        ml_service_url = overrides.ml_service_url.or(ml_service_url);
        if let Some(flags) = overrides.feature_flags {
            feature_flags = flags;
        }
        if let Some(t) = overrides.timeouts {
            timeouts = t;
        }
        staging_dir = overrides.staging_dir.or(staging_dir);
    }

    let database_url = database_url.unwrap_or_default();
    Url::parse(&database_url)
        .map_err(|source| ConfigError::InvalidUrl { field: "database_url", source })?;

    let ml_service_url = ml_service_url.unwrap_or_default();
    Url::parse(&ml_service_url)
        .map_err(|source| ConfigError::InvalidUrl { field: "ml_service_url", source })?;

    if let Some(url) = &queue_url {
        Url::parse(url).map_err(|source| ConfigError::InvalidUrl { field: "queue_url", source })?;
    }

    if seeds.is_empty() {
        return Err(ConfigError::NoRepositories);
    }

    let mut repositories = Vec::with_capacity(seeds.len());
    for seed in seeds {
        if !seed.path.exists() {
            return Err(ConfigError::RepositoryPathMissing(seed.path));
        }
        repositories.push(Repository {
            id: resolve_repository_id(&seed),
            path: seed.path,
            name: seed.name,
        });
    }

    Ok(EngineConfig {
        repositories,
        database_url,
        queue_url,
        ml_service_url,
        feature_flags,
        timeouts,
        staging_dir: staging_dir.unwrap_or_else(|| PathBuf::from("./staging")),
    })
}

fn resolve_repository_id(seed: &RepositorySeed) -> RepoID {
    match seed.id.as_deref().and_then(|id| id.parse().ok()) {
        Some(id) => id,
        None => RepoID::from(Uuid::new_v5(&Uuid::NAMESPACE_PATH, seed.path.to_string_lossy().as_bytes())),
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_repositories_is_an_error() {
        // SAFETY: single-threaded test, no other code reads this var concurrently.
        unsafe { std::env::remove_var("REPOSITORIES") };
        let err = load(None).unwrap_err();
        assert!(matches!(err, ConfigError::NoRepositories));
    }

    #[test]
    fn repository_id_is_stable_across_calls() {
        let seed = RepositorySeed { id: None, path: PathBuf::from("/tmp/photos"), name: "main".into() };
        assert_eq!(resolve_repository_id(&seed), resolve_repository_id(&seed));
    }

    #[test]
    fn file_overrides_take_precedence_over_env() {
        let dir = tempdir().unwrap();
        let repo_dir = dir.path().join("repo");
        std::fs::create_dir_all(&repo_dir).unwrap();

        let config_path = dir.path().join("lumilio.toml");
        std::fs::write(
            &config_path,
            format!(
                r#"
                database_url = "postgres://localhost/lumilio"
                ml_service_url = "http://localhost:9000"

                [[repositories]]
                path = "{}"
                name = "main"
                "#,
                repo_dir.display()
            ),
        )
        .unwrap();

        let config = load(Some(&config_path)).unwrap();
        assert_eq!(config.repositories.len(), 1);
        assert_eq!(config.database_url, "postgres://localhost/lumilio");
    }
}
