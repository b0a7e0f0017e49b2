mod loader;

pub use loader::{AnalyzerConfiguration, Config, GeneratedConfig, ReflectionConfig, ReportConfig};
