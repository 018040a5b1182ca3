//! Compiler options supplied by the outer driver

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use nomos_registry::ProviderTypeRegistry;

/// Output backend, parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Tfvars,
}

impl OutputFormat {
    /// Canonical file extension appended to extension-less output paths
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Tfvars => "tfvars",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "tfvars" => Ok(OutputFormat::Tfvars),
            other => Err(format!("unsupported output format `{other}`")),
        }
    }
}

/// Everything a single compilation needs from the outside.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// A `.csl` file or a directory of them
    pub path: PathBuf,
    /// Bindings for `${name}` variable substitution
    pub vars: HashMap<String, serde_json::Value>,
    /// Degrade provider failures to warnings with null values
    pub allow_missing_provider: bool,
    /// Wrap the output in a `{data, metadata}` envelope
    pub include_metadata: bool,
    pub format: OutputFormat,
    /// Where to write the output; stdout handling is the driver's business
    pub output_path: Option<PathBuf>,
    /// Treat warnings as failures
    pub strict: bool,
    /// Bound for one provider's whole fetch cycle
    pub per_provider_fetch: Duration,
    /// Concurrent downloads; 0 means available parallelism
    pub max_concurrent_providers: usize,
    /// Pre-registered builtin provider types
    pub type_registry: ProviderTypeRegistry,
    /// Cache root override; defaults to `.nomos` under the invocation dir
    pub cache_root: Option<PathBuf>,
    /// Release index override (tests point this at a mock server)
    pub release_index_url: Option<String>,
}

impl CompileOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            vars: HashMap::new(),
            allow_missing_provider: false,
            include_metadata: false,
            format: OutputFormat::Json,
            output_path: None,
            strict: false,
            per_provider_fetch: Duration::from_secs(300),
            max_concurrent_providers: 0,
            type_registry: ProviderTypeRegistry::new(),
            cache_root: None,
            release_index_url: None,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.vars.insert(name.into(), value);
        self
    }

    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(root.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing_is_case_insensitive() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("Yaml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("TFVARS".parse::<OutputFormat>().unwrap(), OutputFormat::Tfvars);
        assert!("toml".parse::<OutputFormat>().is_err());
    }
}
