//! Data-source configuration, resolved once at startup.
//!
//! Each setting is taken from the first layer that has it:
//! explicit flag, file named by a flag, process environment, `.env` file.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::providers::vontobel_api::VontobelApiConfig;
use crate::providers::SourceError;

pub const URL_KEY: &str = "VONTOBEL_URL";
pub const COOKIE_KEY: &str = "VONTOBEL_COOKIE";

/// Catalog source settings as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct SourceArgs {
    pub use_api: bool,
    pub api: VontobelApiConfig,
    pub csv_path: Option<PathBuf>,
    pub url: Option<String>,
    pub url_file: Option<PathBuf>,
    pub cookie: Option<String>,
    pub cookie_file: Option<PathBuf>,
}

/// Fully resolved catalog source settings.
#[derive(Clone, Default)]
pub struct SourceConfig {
    pub use_api: bool,
    pub api: VontobelApiConfig,
    pub csv_path: Option<PathBuf>,
    pub url: Option<String>,
    pub cookie: Option<String>,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("use_api", &self.use_api)
            .field("api", &self.api)
            .field("csv_path", &self.csv_path)
            .field("url", &self.url)
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SourceConfig {
    pub fn resolve(args: SourceArgs, env: &EnvLayers) -> Result<Self, SourceError> {
        let url = resolve_setting(args.url.as_deref(), args.url_file.as_deref(), URL_KEY, env)?;
        let cookie = resolve_setting(args.cookie.as_deref(), args.cookie_file.as_deref(), COOKIE_KEY, env)?;

        let config = Self {
            use_api: args.use_api,
            api: args.api,
            csv_path: args.csv_path,
            url,
            cookie,
        };
        debug!(config = ?config, "Resolved source configuration");
        Ok(config)
    }
}

/// Environment values from the process and from a `.env` file, kept apart.
/// The process environment is never modified.
#[derive(Debug, Clone, Default)]
pub struct EnvLayers {
    process: HashMap<String, String>,
    dotenv: HashMap<String, String>,
}

impl EnvLayers {
    /// Snapshot the process environment and read `env_file` if it exists.
    pub fn load(env_file: &Path) -> Result<Self, SourceError> {
        let dotenv = if env_file.exists() {
            read_dotenv(env_file)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            process: std::env::vars().collect(),
            dotenv,
        })
    }

    pub fn from_maps(process: HashMap<String, String>, dotenv: HashMap<String, String>) -> Self {
        Self { process, dotenv }
    }

    /// Process environment first, then `.env`. Blank values count as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        [&self.process, &self.dotenv]
            .into_iter()
            .filter_map(|layer| layer.get(key))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }
}

fn read_dotenv(path: &Path) -> Result<HashMap<String, String>, SourceError> {
    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| SourceError::parse("env file", format!("{}: {}", path.display(), e)))?;

    let mut values = HashMap::new();
    for item in iter {
        let (key, value) =
            item.map_err(|e| SourceError::parse("env file", format!("{}: {}", path.display(), e)))?;
        values.insert(key, value);
    }
    debug!(path = %path.display(), keys = values.len(), "Read env file");
    Ok(values)
}

/// Resolve one setting through flag, flag file, process env and `.env`.
pub fn resolve_setting(
    flag: Option<&str>,
    file: Option<&Path>,
    key: &str,
    env: &EnvLayers,
) -> Result<Option<String>, SourceError> {
    if let Some(value) = flag.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(Some(value.to_string()));
    }
    if let Some(path) = file {
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        return Ok(Some(text.trim().to_string()).filter(|v| !v.is_empty()));
    }
    Ok(env.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn layers(process: &[(&str, &str)], dotenv: &[(&str, &str)]) -> EnvLayers {
        let to_map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>()
        };
        EnvLayers::from_maps(to_map(process), to_map(dotenv))
    }

    #[test]
    fn test_flag_beats_everything() {
        let env = layers(&[(URL_KEY, "from-env")], &[(URL_KEY, "from-dotenv")]);
        let value = resolve_setting(Some("from-flag"), None, URL_KEY, &env).unwrap();
        assert_eq!(value.as_deref(), Some("from-flag"));
    }

    #[test]
    fn test_file_beats_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  session=abc  ").unwrap();

        let env = layers(&[(COOKIE_KEY, "from-env")], &[]);
        let value = resolve_setting(None, Some(file.path()), COOKIE_KEY, &env).unwrap();
        assert_eq!(value.as_deref(), Some("session=abc"));
    }

    #[test]
    fn test_process_env_beats_dotenv() {
        let env = layers(&[(URL_KEY, " from-env ")], &[(URL_KEY, "from-dotenv")]);
        assert_eq!(resolve_setting(None, None, URL_KEY, &env).unwrap().as_deref(), Some("from-env"));

        let env = layers(&[(URL_KEY, "")], &[(URL_KEY, "from-dotenv")]);
        assert_eq!(resolve_setting(None, None, URL_KEY, &env).unwrap().as_deref(), Some("from-dotenv"));

        let env = layers(&[], &[]);
        assert_eq!(resolve_setting(None, None, URL_KEY, &env).unwrap(), None);
    }

    #[test]
    fn test_missing_flag_file_is_an_error() {
        let env = EnvLayers::default();
        let result = resolve_setting(None, Some(Path::new("/nonexistent/cookie.txt")), COOKIE_KEY, &env);
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }

    #[test]
    fn test_load_reads_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# comment\nSTRIKE_SELECTOR_TEST_KEY='quoted value'\n").unwrap();

        let env = EnvLayers::load(&path).unwrap();
        assert_eq!(env.get("STRIKE_SELECTOR_TEST_KEY").as_deref(), Some("quoted value"));

        let absent = EnvLayers::load(&dir.path().join("missing.env")).unwrap();
        assert_eq!(absent.get("STRIKE_SELECTOR_TEST_KEY"), None);
    }

    #[test]
    fn test_debug_redacts_cookie() {
        let config = SourceConfig {
            cookie: Some("secret-session".to_string()),
            ..Default::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret-session"));
        assert!(printed.contains("<redacted>"));
    }
}
