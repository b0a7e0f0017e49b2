use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a dead-symbol analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Report public symbols
    pub include_public: bool,

    /// Report internal symbols
    pub include_internal: bool,

    /// Skip symbols declared in generated files
    pub exclude_generated: bool,

    /// Excluded roots (package caches, build output); glob patterns
    pub exclude: Vec<String>,

    /// Patterns to retain - never report as unused
    pub retain_patterns: Vec<String>,

    /// Explicit entry points (qualified or simple names)
    pub entry_points: Vec<String>,

    /// Skip discard-style parameters (`_`, `_unused`)
    pub skip_underscore_parameters: bool,

    /// Generated-code detection
    pub generated: GeneratedConfig,

    /// Reflection heuristics
    pub reflection: ReflectionConfig,

    /// Report configuration
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedConfig {
    /// Extra regular expressions matched against a file's leading comments
    pub header_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    /// Rule set version; latest when unset
    pub rule_set: Option<u32>,

    /// Additional member-by-name lookup method names
    pub extra_member_lookups: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: String,
}

/// The immutable switches the gate consults during one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfiguration {
    pub include_public: bool,
    pub include_internal: bool,
    pub exclude_generated: bool,
}

impl Default for AnalyzerConfiguration {
    fn default() -> Self {
        Config::default().analyzer()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_public: false,
            include_internal: true,
            exclude_generated: true,
            exclude: vec![
                "**/bin/**".to_string(),
                "**/obj/**".to_string(),
                "**/packages/**".to_string(),
                "**/.nuget/**".to_string(),
                "**/node_modules/**".to_string(),
            ],
            retain_patterns: vec![],
            entry_points: vec![],
            skip_underscore_parameters: true,
            generated: GeneratedConfig::default(),
            reflection: ReflectionConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".deadsymbols.yml",
            ".deadsymbols.yaml",
            ".deadsymbols.toml",
            "deadsymbols.yml",
            "deadsymbols.yaml",
            "deadsymbols.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// Snapshot of the gate switches for one run
    pub fn analyzer(&self) -> AnalyzerConfiguration {
        AnalyzerConfiguration {
            include_public: self.include_public,
            include_internal: self.include_internal,
            exclude_generated: self.exclude_generated,
        }
    }

    /// Check if a path lies under an excluded root
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.exclude.iter().any(|pattern| glob_match(pattern, &path_str))
    }

    /// Directory configuration defaults are searched in for a snapshot
    pub fn default_search_root(snapshot: &Path) -> PathBuf {
        snapshot
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Simple glob matching for patterns like "*Controller" or "**/obj/**"
fn glob_match(pattern: &str, text: &str) -> bool {
    // Handle simple wildcard patterns
    if let Some(suffix) = pattern.strip_prefix('*') {
        if !pattern.contains('/') {
            return text.ends_with(suffix);
        }
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        if !pattern.contains('/') {
            return text.starts_with(prefix);
        }
    }

    // Handle path patterns with **
    if pattern.contains("**") {
        // "**/obj/**" must match a whole directory name, so "/objects/" does not
        if pattern.starts_with("**/") && pattern.ends_with("/**") {
            let dir_name = pattern
                .trim_start_matches("**/")
                .trim_end_matches("/**")
                .trim_matches('/');
            let dir_pattern = format!("/{}/", dir_name);
            return text.contains(&dir_pattern) || text.starts_with(&format!("{}/", dir_name));
        }

        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');

            if prefix.is_empty() && suffix.is_empty() {
                return true;
            }

            if prefix.is_empty() {
                return text.ends_with(suffix) || text.contains(&format!("/{}", suffix));
            }

            if suffix.is_empty() {
                return text.starts_with(prefix) || text.contains(&format!("{}/", prefix));
            }

            return (text.starts_with(prefix) || text.contains(&format!("/{}/", prefix)))
                && (text.ends_with(suffix) || text.contains(&format!("/{}", suffix)));
        }
    }

    // Exact match
    text == pattern
}
