use crate::classify::{HiddenPattern, default_hidden_patterns};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Working directory of the sandboxed project inside the virtual filesystem.
pub const WORK_DIR: &str = "/home/project";

pub const DEFAULT_API_BASE_URL: &str = "https://api.websparks.ai";
pub const DEFAULT_CHAT_ENDPOINT: &str = "/api/chat";
pub const DEFAULT_PROVIDER: &str = "OpenAI";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub root_folder: String,
    pub hide_root: bool,
    pub collapsed: bool,
    pub allow_folder_selection: bool,
    /// Extra hidden patterns, applied on top of the defaults.
    pub hidden_files: Vec<HiddenPattern>,
}
impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            root_folder: "/".to_string(),
            hide_root: false,
            collapsed: false,
            allow_folder_selection: false,
            hidden_files: Vec::new(),
        }
    }
}
impl TreeOptions {
    /// The defaults followed by the caller's extra patterns.
    pub fn hidden_patterns(&self) -> Vec<HiddenPattern> {
        let mut patterns = default_hidden_patterns();
        patterns.extend(self.hidden_files.iter().cloned());
        patterns
    }
}
#[derive(Debug, Default)]
pub struct TreeOptionsBuilder {
    options: TreeOptions,
}
impl TreeOptionsBuilder {
    pub fn new(root_folder: impl Into<String>) -> Self {
        Self {
            options: TreeOptions {
                root_folder: root_folder.into(),
                ..Default::default()
            },
        }
    }
    pub fn hide_root(mut self, yes: bool) -> Self {
        self.options.hide_root = yes;
        self
    }
    pub fn collapsed(mut self, yes: bool) -> Self {
        self.options.collapsed = yes;
        self
    }
    pub fn allow_folder_selection(mut self, yes: bool) -> Self {
        self.options.allow_folder_selection = yes;
        self
    }
    pub fn hidden_file(mut self, pattern: HiddenPattern) -> Self {
        self.options.hidden_files.push(pattern);
        self
    }
    pub fn hidden_files(mut self, patterns: Vec<HiddenPattern>) -> Self {
        self.options.hidden_files.extend(patterns);
        self
    }
    pub fn build(self) -> TreeOptions {
        self.options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryDetection {
    Simple,
    Accurate,
    None,
}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotOptions {
    pub root: PathBuf,
    /// Virtual path the directory is mounted at in the resulting file map.
    pub mount_point: String,
    pub respect_gitignore: bool,
    pub max_depth: Option<usize>,
    pub include_hidden: bool,
    pub follow_links: bool,
    pub ignore_patterns: Vec<String>,
    pub file_size_limit: Option<u64>,
    pub binary_detection: BinaryDetection,
}
impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            mount_point: WORK_DIR.to_string(),
            respect_gitignore: true,
            max_depth: None,
            include_hidden: false,
            follow_links: false,
            ignore_patterns: Vec::new(),
            file_size_limit: None,
            binary_detection: BinaryDetection::Simple,
        }
    }
}
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    options: SnapshotOptions,
}
impl SnapshotBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            options: SnapshotOptions {
                root: root.into(),
                ..Default::default()
            },
        }
    }
    pub fn mount_point(mut self, mount: impl Into<String>) -> Self {
        self.options.mount_point = mount.into();
        self
    }
    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.options.respect_gitignore = yes;
        self
    }
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.options.max_depth = depth;
        self
    }
    pub fn include_hidden(mut self, yes: bool) -> Self {
        self.options.include_hidden = yes;
        self
    }
    pub fn follow_links(mut self, yes: bool) -> Self {
        self.options.follow_links = yes;
        self
    }
    pub fn ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.options.ignore_patterns = patterns;
        self
    }
    pub fn file_size_limit(mut self, limit: Option<u64>) -> Self {
        self.options.file_size_limit = limit;
        self
    }
    pub fn binary_detection(mut self, method: BinaryDetection) -> Self {
        self.options.binary_detection = method;
        self
    }
    pub fn build(self) -> SnapshotOptions {
        self.options
    }
}

/// Endpoints and model selection for the chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Chat endpoint, absolute or relative to `api_base_url`.
    pub chat_endpoint: String,
    pub provider: String,
    pub model: String,
}
impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}
impl ClientConfig {
    /// Defaults overridden by `WEBSPARKS_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let vars = [
            ("WEBSPARKS_API_BASE_URL", &mut config.api_base_url),
            ("WEBSPARKS_CHAT_ENDPOINT", &mut config.chat_endpoint),
            ("WEBSPARKS_PROVIDER", &mut config.provider),
            ("WEBSPARKS_MODEL", &mut config.model),
        ];
        for (key, slot) in vars {
            if let Ok(value) = std::env::var(key) {
                if !value.trim().is_empty() {
                    *slot = value;
                }
            }
        }
        config
    }
    /// The tag line prefixed to every outbound user message.
    pub fn model_tag(&self) -> String {
        format!("[Model: {}-{}]", self.provider, self.model)
    }
    pub fn chat_url(&self) -> String {
        if self.chat_endpoint.starts_with("http://") || self.chat_endpoint.starts_with("https://") {
            self.chat_endpoint.clone()
        } else {
            format!(
                "{}/{}",
                self.api_base_url.trim_end_matches('/'),
                self.chat_endpoint.trim_start_matches('/')
            )
        }
    }
}
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}
impl ClientConfigBuilder {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                api_base_url: api_base_url.into(),
                ..Default::default()
            },
        }
    }
    pub fn chat_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.chat_endpoint = endpoint.into();
        self
    }
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.config.provider = provider.into();
        self
    }
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
