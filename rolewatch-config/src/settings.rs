// Typed rolewatch settings

use crate::Result;
use crate::env::EnvLoader;
use crate::loader::ConfigLoader;
use crate::validation::{ConfigValidator, Diagnostic, Validate};
use rolewatch_cron::CronPresets;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default AWS region for archive uploads.
pub const DEFAULT_REGION: &str = "ap-south-1";

/// Default key prefix for archived role change logs.
pub const ROLE_LOG_PREFIX: &str = "role-change-logs";

/// Default key prefix for archived audit logs.
pub const AUDIT_LOG_PREFIX: &str = "audit-logs";

/// Schedule and upload settings for one rotated log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub enabled: bool,
    pub cron: String,
    pub log_file: PathBuf,
    pub upload: bool,
    pub bucket: String,
    /// Key prefix inside the bucket; `None` until defaults are applied
    pub prefix: Option<String>,
    pub region: String,
    /// Seed for `H` tokens in `cron`
    pub seed: Option<String>,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: CronPresets::DAILY.to_string(),
            log_file: PathBuf::new(),
            upload: false,
            bucket: String::new(),
            prefix: None,
            region: DEFAULT_REGION.to_string(),
            seed: None,
        }
    }
}

impl RotationConfig {
    /// Rotation settings for `log_file` with the given key prefix.
    pub fn for_log(log_file: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            log_file: log_file.into(),
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Key prefix, empty meaning the bucket root.
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    /// Collect diagnostics for this section, naming fields under `section`.
    pub fn diagnostics_for(&self, section: &str) -> Vec<Diagnostic> {
        let field = |name: &str| format!("{}.{}", section, name);
        let mut diagnostics = Vec::new();

        diagnostics.extend(ConfigValidator::cron(
            &self.cron,
            self.seed.as_deref(),
            &field("cron"),
        ));
        diagnostics.extend(ConfigValidator::writable_parent(
            &self.log_file,
            &field("log_file"),
        ));

        if self.upload {
            diagnostics.extend(ConfigValidator::not_blank(
                &self.bucket,
                &field("bucket"),
                "If upload is enabled, the S3 bucket name cannot be empty.",
            ));
            diagnostics.extend(ConfigValidator::not_blank(
                self.prefix(),
                &field("prefix"),
                "If upload is enabled and the key prefix is empty, logs will be uploaded to the root of the S3 bucket.",
            ));
            diagnostics.extend(ConfigValidator::not_blank(
                &self.region,
                &field("region"),
                "If upload is enabled, the S3 region cannot be empty.",
            ));
        }

        diagnostics
    }

    fn fill_defaults(&mut self, log_file: &Path, prefix: &str) {
        if self.log_file.as_os_str().is_empty() {
            self.log_file = log_file.to_path_buf();
        }
        if self.prefix.is_none() {
            self.prefix = Some(prefix.to_string());
        }
    }
}

/// Role change auditing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    /// The watched RBAC configuration document
    pub config_file: PathBuf,
    /// Cached previous snapshot of `config_file`
    pub baseline_file: PathBuf,
    /// Role change log
    pub log_file: PathBuf,
    pub rotation: RotationConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            config_file: PathBuf::new(),
            baseline_file: PathBuf::new(),
            log_file: PathBuf::new(),
            rotation: RotationConfig::default(),
        }
    }
}

/// Complete rolewatch settings.
///
/// # Examples
///
/// ```
/// use rolewatch_config::Settings;
/// use std::path::Path;
///
/// let settings = Settings::with_home("/var/lib/ci");
/// assert_eq!(
///     settings.role_audit.log_file,
///     Path::new("/var/lib/ci/logs/role-changes.log")
/// );
/// assert_eq!(settings.audit_log_rotation.prefix(), "audit-logs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default = "Settings::unresolved")]
pub struct Settings {
    /// Directory that relative default paths hang off
    pub home: PathBuf,
    pub role_audit: AuditConfig,
    pub audit_log_rotation: RotationConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_home(".")
    }
}

impl Settings {
    /// Default settings rooted at `home`.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let mut settings = Self {
            home: home.into(),
            role_audit: AuditConfig::default(),
            audit_log_rotation: RotationConfig::default(),
        };
        settings.fill_defaults();
        settings
    }

    /// Load settings: `.env`, then the optional file, then `ROLEWATCH_*`
    /// variables, then home-relative defaults for anything still unset.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut settings = match path {
            Some(path) => ConfigLoader::auto(path)?.load_file(path)?,
            None => Self::unresolved(),
        };

        settings.apply_env(&EnvLoader::default())?;
        settings.fill_defaults();
        Ok(settings)
    }

    /// Parse settings from a string in the given format and fill defaults.
    pub fn parse(loader: &ConfigLoader, content: &str) -> Result<Self> {
        let mut settings: Self = loader.parse(content)?;
        settings.fill_defaults();
        Ok(settings)
    }

    /// Overlay environment variables onto the loaded values.
    pub fn apply_env(&mut self, env: &EnvLoader) -> Result<()> {
        if let Some(home) = env.var("home") {
            self.home = PathBuf::from(home);
        }
        if let Some(enabled) = env.bool_var("role_audit_enabled")? {
            self.role_audit.enabled = enabled;
        }
        if let Some(log_file) = env.var("role_log_file") {
            self.role_audit.log_file = PathBuf::from(log_file);
        }
        if let Some(log_file) = env.var("audit_log_file") {
            self.audit_log_rotation.log_file = PathBuf::from(log_file);
        }
        if let Some(region) = env.var("s3_region") {
            self.role_audit.rotation.region = region.clone();
            self.audit_log_rotation.region = region;
        }
        Ok(())
    }

    fn unresolved() -> Self {
        Self {
            home: PathBuf::new(),
            role_audit: AuditConfig::default(),
            audit_log_rotation: RotationConfig::default(),
        }
    }

    fn fill_defaults(&mut self) {
        if self.home.as_os_str().is_empty() {
            self.home = PathBuf::from(".");
        }
        let logs = self.home.join("logs");

        let audit = &mut self.role_audit;
        if audit.config_file.as_os_str().is_empty() {
            audit.config_file = self.home.join("config.xml");
        }
        if audit.baseline_file.as_os_str().is_empty() {
            audit.baseline_file = logs.join("roles-prev.xml");
        }
        if audit.log_file.as_os_str().is_empty() {
            audit.log_file = logs.join("role-changes.log");
        }
        let role_log = audit.log_file.clone();
        audit.rotation.fill_defaults(&role_log, ROLE_LOG_PREFIX);

        self.audit_log_rotation
            .fill_defaults(&logs.join("audit-1.log"), AUDIT_LOG_PREFIX);
    }
}

impl Validate for Settings {
    fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if self.role_audit.enabled {
            diagnostics.extend(ConfigValidator::writable_parent(
                &self.role_audit.log_file,
                "role_audit.log_file",
            ));
        } else {
            diagnostics.push(Diagnostic::warning(
                "role_audit.enabled",
                "Role change logging is disabled. No logs will be recorded.",
            ));
        }

        if self.role_audit.rotation.enabled {
            diagnostics.extend(self.role_audit.rotation.diagnostics_for("role_audit.rotation"));
        }
        if self.audit_log_rotation.enabled {
            diagnostics.extend(self.audit_log_rotation.diagnostics_for("audit_log_rotation"));
        }

        diagnostics
    }
}
