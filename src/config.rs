use crate::domain::{BumpOverride, TagTemplate};
use crate::error::{ReleaseError, Result};
use crate::policy::{self, Policy, PolicyConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name searched for from the current directory upwards
pub const CONFIG_FILE_NAME: &str = "trunk-release.toml";

/// Main-branch candidates used when none are configured
pub const DEFAULT_BRANCHES: [&str; 2] = ["main", "master"];

/// Returns the default ordered policy names.
fn default_policies() -> Vec<String> {
    vec![policy::conventional_lax().name, policy::lax().name]
}

/// Represents the complete configuration for trunk-release.
///
/// Contains the main-branch candidates, declared release scopes, commit
/// policies, the tag template, commit checking rules and behavior options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Main-branch candidates, tried in order. Empty means not configured.
    #[serde(default)]
    pub branches: Vec<String>,

    #[serde(default)]
    pub release_scopes: Vec<String>,

    /// Policy names, evaluated in order
    #[serde(default = "default_policies")]
    pub policies: Vec<String>,

    /// Policies defined in the file, shadowing built-ins of the same name
    #[serde(default)]
    pub custom_policies: Vec<PolicyConfig>,

    #[serde(default)]
    pub tag_template: String,

    #[serde(default)]
    pub allowed_scopes: Vec<String>,

    #[serde(default)]
    pub allowed_types: Vec<String>,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

/// Configuration for behavior customization.
///
/// Only `ci` and `dry_run` can come from the file; the rest are set per run
/// from the command line.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct BehaviorConfig {
    #[serde(default)]
    pub ci: bool,

    #[serde(default)]
    pub dry_run: bool,

    /// Analyze every declared release scope
    #[serde(skip)]
    pub all: bool,

    /// Analyze this scope only, instead of the root
    #[serde(skip)]
    pub scope: String,

    #[serde(skip)]
    pub bump: Option<BumpOverride>,

    /// Skip the main-branch reachability check. Not reachable from the
    /// command line; `-P` only clears the policy list.
    #[serde(skip)]
    pub ignore_policies: bool,

    /// Tag without asking for confirmation
    #[serde(skip)]
    pub assume_yes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            branches: Vec::new(),
            release_scopes: Vec::new(),
            policies: default_policies(),
            custom_policies: Vec::new(),
            tag_template: String::new(),
            allowed_scopes: Vec::new(),
            allowed_types: Vec::new(),
            behavior: BehaviorConfig::default(),
        }
    }
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ReleaseError::config(e.to_string()))
    }

    /// Whether main-branch candidates were given explicitly
    pub fn branches_set(&self) -> bool {
        !self.branches.is_empty()
    }

    /// Candidates handed to `get_main_branch`.
    ///
    /// In CI without explicit branches this is empty, meaning "ask the
    /// remote".
    pub fn main_branch_candidates(&self) -> Vec<String> {
        if self.branches_set() {
            return self.branches.clone();
        }
        if self.behavior.ci {
            return Vec::new();
        }
        Self::default_branches()
    }

    pub fn default_branches() -> Vec<String> {
        DEFAULT_BRANCHES.iter().map(|b| b.to_string()).collect()
    }

    /// Compile the configured policies, in order
    pub fn resolve_policies(&self) -> Result<Vec<Arc<Policy>>> {
        policy::resolve(&self.policies, &self.custom_policies)
    }

    pub fn tag_template(&self) -> Result<TagTemplate> {
        TagTemplate::parse(&self.tag_template)
    }

    /// Switch on CI mode when the environment says so
    pub fn apply_env(&mut self) {
        if !self.behavior.ci && detect_ci() {
            self.behavior.ci = true;
        }
    }

    /// Check the combination of settings is usable
    pub fn validate(&self) -> Result<()> {
        self.tag_template()?;
        self.resolve_policies()?;
        if self.behavior.all && !self.behavior.scope.is_empty() {
            return Err(ReleaseError::config("--all and --scope cannot be combined"));
        }
        Ok(())
    }
}

/// Whether the `CI` environment variable marks an unattended run
pub fn detect_ci() -> bool {
    std::env::var("CI")
        .map(|v| matches!(v.as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Find `trunk-release.toml` in `start` or any of its ancestors
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `trunk-release.toml` in the current directory or any parent
/// 3. `trunk-release/config.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_path {
        return load_config_from(path);
    }

    let cwd = std::env::current_dir()?;
    if let Some(path) = find_config_file(&cwd) {
        return load_config_from(&path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("trunk-release").join("config.toml");
        if path.is_file() {
            return load_config_from(&path);
        }
    }

    Ok(Config::default())
}

/// Load and parse one configuration file
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .map_err(|e| ReleaseError::config(format!("cannot read {}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Config::from_toml(&content)
        .map_err(|e| ReleaseError::config(format!("{}: {}", path.display(), e)))
}
