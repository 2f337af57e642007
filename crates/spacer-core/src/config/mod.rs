//! Process configuration
//!
//! Settings come from the process environment. An optional `.env` file is
//! merged in first with `dotenvy`; variables already set in the shell win.

mod interval;

pub use interval::{parse_interval, DEFAULT_INTERVAL};

use crate::error::{ConfigError, Result};
use crate::types::{Credentials, SelectionPolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

/// Default signing region for the object store
pub const DEFAULT_REGION: &str = "ru-central1";

/// Default number of attempts the store client makes per request
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// Default artifact name prefix
pub const DEFAULT_PREFIX: &str = "backup";

/// Default remote folder that snapshots are uploaded under
pub const DEFAULT_FOLDER: &str = "folder";

/// Load an env file into the process environment.
///
/// With an explicit path the file must exist. Without one, `.env` is looked
/// up from the working directory and its absence is not an error.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
                path: path.display().to_string(),
                source,
            })?;
            debug!("Loaded env file: {}", path.display());
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(found) => {
                debug!("Loaded env file: {}", found.display());
                Ok(Some(found))
            }
            Err(e) => {
                debug!("No env file loaded: {}", e);
                Ok(None)
            }
        },
    }
}

/// PostgreSQL connection parameters for the dump producer
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: Option<Zeroizing<String>>,
    pub database: String,
    /// Path or name of the `pg_dump` binary
    pub pg_dump_path: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("pg_dump_path", &self.pg_dump_path)
            .finish()
    }
}

/// Object store connection settings
///
/// The store is an S3-compatible service reached through a custom endpoint,
/// never the provider's default endpoint or credential chain.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Endpoint host, without scheme (e.g. `fra1.digitaloceanspaces.com`)
    pub endpoint: String,
    pub bucket: String,
    /// Signing region
    pub region: String,
    /// Maximum attempts per request, including the first one
    pub retry_limit: u32,
    /// Address buckets as `<endpoint>/<bucket>` instead of `<bucket>.<endpoint>`
    pub force_path_style: bool,
    /// Use `https` for the endpoint; `http` is only meant for local stores
    pub use_tls: bool,
    pub credentials: Credentials,
}

impl StoreConfig {
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            region: DEFAULT_REGION.to_string(),
            retry_limit: DEFAULT_RETRY_LIMIT,
            force_path_style: false,
            use_tls: true,
            credentials,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    /// Base URL of the S3 API endpoint
    pub fn endpoint_url(&self) -> String {
        format!("{}://{}", self.scheme(), self.endpoint)
    }
}

/// Scheduling and naming settings for backup cycles
#[derive(Debug, Clone)]
pub struct BackupSettings {
    /// Artifact name prefix
    pub prefix: String,
    /// Remote folder prefix for uploaded objects
    pub folder: String,
    /// Local directory dumps are written to
    pub dump_dir: PathBuf,
    /// Pause between cycles
    pub interval: Duration,
}

/// Complete process configuration
#[derive(Clone)]
pub struct SpacerConfig {
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub backup: BackupSettings,
    /// Raw symmetric key bytes; length is validated by the cipher
    pub encrypt_key: Zeroizing<Vec<u8>>,
    pub restore_policy: SelectionPolicy,
}

impl std::fmt::Debug for SpacerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpacerConfig")
            .field("database", &self.database)
            .field("store", &self.store)
            .field("backup", &self.backup)
            .field("encrypt_key", &"<redacted>")
            .field("restore_policy", &self.restore_policy)
            .finish()
    }
}

impl SpacerConfig {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let database = DatabaseConfig {
            host: vars.required("POSTGRES_HOST")?,
            port: vars.required("POSTGRES_PORT")?,
            user: vars.required("POSTGRES_USER")?,
            password: vars.optional("POSTGRES_PASSWORD").map(Zeroizing::new),
            database: vars.required("POSTGRES_DATABASE")?,
            pg_dump_path: vars
                .optional("PG_DUMP_PATH")
                .unwrap_or_else(|| "pg_dump".to_string()),
        };

        let store = vars.store()?;
        let interval = parse_interval(&vars.required("DUMP_TIME")?);
        let encrypt_key = Zeroizing::new(vars.required("ENCRYPT_KEY")?.into_bytes());
        let (prefix, folder, dump_dir) = vars.naming();

        Ok(Self {
            database,
            store,
            backup: BackupSettings {
                prefix,
                folder,
                dump_dir,
                interval,
            },
            encrypt_key,
            restore_policy: vars.restore_policy()?,
        })
    }
}

/// Configuration for commands that only read snapshots back
///
/// Needs no database settings or interval, so it loads on a host that only
/// restores.
#[derive(Clone)]
pub struct RestoreConfig {
    pub store: StoreConfig,
    /// Artifact name prefix
    pub prefix: String,
    /// Remote folder prefix
    pub folder: String,
    /// Local directory restored dumps are written to
    pub dump_dir: PathBuf,
    encrypt_key: Option<Zeroizing<Vec<u8>>>,
    pub restore_policy: SelectionPolicy,
}

impl std::fmt::Debug for RestoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestoreConfig")
            .field("store", &self.store)
            .field("prefix", &self.prefix)
            .field("folder", &self.folder)
            .field("dump_dir", &self.dump_dir)
            .field("encrypt_key", &self.encrypt_key.as_ref().map(|_| "<redacted>"))
            .field("restore_policy", &self.restore_policy)
            .finish()
    }
}

impl RestoreConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let store = vars.store()?;
        let (prefix, folder, dump_dir) = vars.naming();

        Ok(Self {
            store,
            prefix,
            folder,
            dump_dir,
            encrypt_key: vars
                .optional("ENCRYPT_KEY")
                .map(|key| Zeroizing::new(key.into_bytes())),
            restore_policy: vars.restore_policy()?,
        })
    }

    /// Key bytes for decryption; listing works without one
    pub fn encrypt_key(&self) -> Result<&[u8]> {
        self.encrypt_key
            .as_ref()
            .map(|key| key.as_slice())
            .ok_or_else(|| ConfigError::missing_var("ENCRYPT_KEY"))
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Empty values count as unset
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.is_empty())
    }

    fn required(&self, name: &str) -> Result<String> {
        self.optional(name)
            .ok_or_else(|| ConfigError::missing_var(name))
    }

    fn parsed<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(name)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|e| ConfigError::invalid_value(name, format!("{raw:?}: {e}")))
            })
            .transpose()
    }

    fn store(&self) -> Result<StoreConfig> {
        let credentials = Credentials::new(
            self.required("S3_ACCESS_KEY")?,
            self.required("S3_SECRET_KEY")?,
        );
        let mut store = StoreConfig::new(
            self.required("S3_HOST")?,
            self.required("S3_BUCKET")?,
            credentials,
        );
        if let Some(region) = self.optional("S3_REGION") {
            store.region = region;
        }
        if let Some(limit) = self.parsed::<u32>("S3_RETRY_LIMIT")? {
            if limit == 0 {
                return Err(ConfigError::invalid_value(
                    "S3_RETRY_LIMIT",
                    "must be at least 1",
                ));
            }
            store.retry_limit = limit;
        }
        if let Some(path_style) = self.flag("S3_FORCE_PATH_STYLE")? {
            store.force_path_style = path_style;
        }
        if let Some(tls) = self.flag("S3_USE_TLS")? {
            store.use_tls = tls;
        }
        Ok(store)
    }

    /// Artifact prefix, remote folder and local dump directory
    fn naming(&self) -> (String, String, PathBuf) {
        (
            self.optional("PREFIX")
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            self.optional("BACKUP_FOLDER")
                .unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
            self.optional("DUMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
        )
    }

    fn restore_policy(&self) -> Result<SelectionPolicy> {
        match self.optional("RESTORE_POLICY") {
            Some(raw) => raw
                .parse::<SelectionPolicy>()
                .map_err(|reason| ConfigError::invalid_value("RESTORE_POLICY", reason)),
            None => Ok(SelectionPolicy::default()),
        }
    }

    fn flag(&self, name: &str) -> Result<Option<bool>> {
        self.optional(name)
            .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::invalid_value(
                    name,
                    format!("{raw:?} is not a boolean"),
                )),
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("POSTGRES_HOST", "db.internal"),
            ("POSTGRES_PORT", "5432"),
            ("POSTGRES_USER", "postgres"),
            ("POSTGRES_PASSWORD", "hunter2"),
            ("POSTGRES_DATABASE", "shop"),
            ("S3_HOST", "storage.example.net"),
            ("S3_BUCKET", "backups"),
            ("S3_ACCESS_KEY", "AKID"),
            ("S3_SECRET_KEY", "SECRET"),
            ("ENCRYPT_KEY", "0123456789abcdef"),
            ("DUMP_TIME", "2h"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<SpacerConfig> {
        SpacerConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.pg_dump_path, "pg_dump");
        assert_eq!(config.store.region, DEFAULT_REGION);
        assert_eq!(config.store.retry_limit, 3);
        assert!(!config.store.force_path_style);
        assert!(config.store.use_tls);
        assert_eq!(config.store.endpoint_url(), "https://storage.example.net");
        assert_eq!(config.backup.prefix, DEFAULT_PREFIX);
        assert_eq!(config.backup.folder, DEFAULT_FOLDER);
        assert_eq!(config.backup.interval, Duration::from_secs(7200));
        assert_eq!(config.encrypt_key.as_slice(), b"0123456789abcdef");
        assert_eq!(config.restore_policy, SelectionPolicy::Oldest);
    }

    #[test]
    fn test_missing_required_var_is_named() {
        let mut vars = base_vars();
        vars.remove("S3_BUCKET");

        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar { ref name } if name == "S3_BUCKET"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("ENCRYPT_KEY", "");

        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar { ref name } if name == "ENCRYPT_KEY"));
    }

    #[test]
    fn test_password_is_optional() {
        let mut vars = base_vars();
        vars.remove("POSTGRES_PASSWORD");

        let config = load(&vars).unwrap();
        assert!(config.database.password.is_none());
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("S3_REGION", "fra1");
        vars.insert("S3_RETRY_LIMIT", "5");
        vars.insert("S3_FORCE_PATH_STYLE", "true");
        vars.insert("S3_USE_TLS", "no");
        vars.insert("PREFIX", "shop");
        vars.insert("BACKUP_FOLDER", "nightly");
        vars.insert("DUMP_DIR", "/var/tmp/spacer");
        vars.insert("RESTORE_POLICY", "newest");

        let config = load(&vars).unwrap();
        assert_eq!(config.store.region, "fra1");
        assert_eq!(config.store.retry_limit, 5);
        assert!(config.store.force_path_style);
        assert_eq!(config.store.endpoint_url(), "http://storage.example.net");
        assert_eq!(config.backup.prefix, "shop");
        assert_eq!(config.backup.folder, "nightly");
        assert_eq!(config.backup.dump_dir, PathBuf::from("/var/tmp/spacer"));
        assert_eq!(config.restore_policy, SelectionPolicy::Newest);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut vars = base_vars();
        vars.insert("S3_RETRY_LIMIT", "many");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));

        let mut vars = base_vars();
        vars.insert("S3_RETRY_LIMIT", "0");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));

        let mut vars = base_vars();
        vars.insert("S3_USE_TLS", "maybe");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));

        let mut vars = base_vars();
        vars.insert("RESTORE_POLICY", "latest-ish");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_restore_config_needs_no_database_settings() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("S3_HOST", "storage.example.net"),
            ("S3_BUCKET", "backups"),
            ("S3_ACCESS_KEY", "AKID"),
            ("S3_SECRET_KEY", "SECRET"),
            ("BACKUP_FOLDER", "nightly"),
            ("RESTORE_POLICY", "newest"),
        ]);

        let config =
            RestoreConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.store.bucket, "backups");
        assert_eq!(config.prefix, DEFAULT_PREFIX);
        assert_eq!(config.folder, "nightly");
        assert_eq!(config.restore_policy, SelectionPolicy::Newest);
        assert!(matches!(
            config.encrypt_key().unwrap_err(),
            ConfigError::MissingVar { ref name } if name == "ENCRYPT_KEY"
        ));
    }

    #[test]
    fn test_restore_config_key_and_store_validation() {
        let mut vars = base_vars();
        vars.remove("POSTGRES_HOST");
        vars.remove("DUMP_TIME");

        let config = RestoreConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.encrypt_key().unwrap(), b"0123456789abcdef");
        assert!(!format!("{:?}", config).contains("0123456789abcdef"));

        vars.remove("S3_SECRET_KEY");
        let err = RestoreConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar { ref name } if name == "S3_SECRET_KEY"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&base_vars()).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("SECRET"));
        assert!(!debug.contains("0123456789abcdef"));
    }

    #[test]
    fn test_explicit_env_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.env");

        let err = load_env_file(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }

    #[test]
    #[serial]
    fn test_env_file_loaded_into_process_env() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join("spacer.env");
        std::fs::write(&env_path, "SPACER_TEST_ENV_FILE_VAR=from-file\n").unwrap();

        std::env::remove_var("SPACER_TEST_ENV_FILE_VAR");
        let loaded = load_env_file(Some(&env_path)).unwrap();

        assert_eq!(loaded, Some(env_path));
        assert_eq!(
            std::env::var("SPACER_TEST_ENV_FILE_VAR").unwrap(),
            "from-file"
        );
        std::env::remove_var("SPACER_TEST_ENV_FILE_VAR");
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_env() {
        let vars = base_vars();
        for (name, value) in &vars {
            std::env::set_var(name, value);
        }

        let config = SpacerConfig::from_env().unwrap();
        assert_eq!(config.store.bucket, "backups");
        assert_eq!(config.database.database, "shop");

        for name in vars.keys() {
            std::env::remove_var(name);
        }
    }
}
