//! Experiment configuration and the XML experiment loader.
//!
//! An experiment file holds one or more named experiments, each declaring a
//! tasks CSV path and a set of hosts:
//!
//! ```xml
//! <experiments>
//!   <experiment name="simple">
//!     <tasks>tasks.csv</tasks>
//!     <host id="HOST_0">
//!       <cpu_cores>2</cpu_cores>
//!       <ram>1000</ram>
//!     </host>
//!   </experiment>
//! </experiments>
//! ```
//!
//! The tasks path is resolved relative to the experiment file's directory.
//! Hosts are kept in a `BTreeMap`, so iteration order is sorted by host id
//! and stable across runs.
//!
//! The format is small and fixed, and no crate in our stack covers it, so
//! this module carries a minimal XML reader that accepts exactly this
//! schema (prolog, comments, attributes, nested elements, text content).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SimError;

/// Errors that can occur while loading experiment or task files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration for a single host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Number of CPU cores; must be positive.
    pub cpu_cores: u64,
    /// RAM capacity; must be positive.
    pub ram: u64,
}

impl HostConfig {
    /// Validates the host parameters.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cpu_cores == 0 {
            return Err(ConfigError::Validation(
                "CPU cores must be > 0".to_string(),
            ));
        }
        if self.ram == 0 {
            return Err(ConfigError::Validation("RAM must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Configuration for one experiment: a host set plus a tasks source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Hosts keyed by id, iterated in sorted order.
    pub hosts: BTreeMap<String, HostConfig>,
    /// Path to the tasks CSV, already resolved against the experiment
    /// file's directory.
    pub tasks_csv: PathBuf,
}

impl ExperimentConfig {
    /// Creates an empty configuration (useful for programmatic setup).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a host; builder-style helper for tests and embedding.
    pub fn with_host(mut self, id: impl Into<String>, cpu_cores: u64, ram: u64) -> Self {
        self.hosts.insert(id.into(), HostConfig { cpu_cores, ram });
        self
    }

    /// Validates the experiment structure.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.hosts.is_empty() {
            return Err(ConfigError::Validation(
                "experiment must have at least one host".to_string(),
            ));
        }
        for config in self.hosts.values() {
            config.validate()?;
        }
        Ok(())
    }
}

/// Loads all experiment configurations from an XML file.
pub fn load_experiments(path: &Path) -> ConfigResult<BTreeMap<String, ExperimentConfig>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_experiments(&text, base_dir)
}

/// Parses experiment configurations from XML text.
///
/// `base_dir` is the directory used to resolve relative tasks paths.
pub fn parse_experiments(
    xml: &str,
    base_dir: &Path,
) -> ConfigResult<BTreeMap<String, ExperimentConfig>> {
    let root = xml::parse_document(xml)?;
    if root.name != "experiments" {
        return Err(ConfigError::Xml(format!(
            "root element 'experiments' not found, got '{}'",
            root.name
        )));
    }

    let mut configs = BTreeMap::new();
    for experiment in root.children.iter().filter(|c| c.name == "experiment") {
        let name = experiment.attr("name").ok_or_else(|| {
            ConfigError::Validation("experiment missing 'name' attribute".to_string())
        })?;

        let tasks = experiment
            .child("tasks")
            .map(|t| t.text.trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ConfigError::Validation(format!("experiment '{name}' missing 'tasks' element"))
            })?;

        let tasks_path = Path::new(tasks);
        let tasks_csv = if tasks_path.is_relative() {
            base_dir.join(tasks_path)
        } else {
            tasks_path.to_path_buf()
        };

        let mut config = ExperimentConfig {
            hosts: BTreeMap::new(),
            tasks_csv,
        };

        for host in experiment.children.iter().filter(|c| c.name == "host") {
            let id = host.attr("id").ok_or_else(|| {
                ConfigError::Validation(format!(
                    "host missing 'id' attribute in experiment '{name}'"
                ))
            })?;
            let cpu_cores = host_field(host, id, "cpu_cores")?;
            let ram = host_field(host, id, "ram")?;

            let host_config = HostConfig { cpu_cores, ram };
            host_config.validate()?;

            if config.hosts.insert(id.to_string(), host_config).is_some() {
                return Err(ConfigError::Validation(format!(
                    "duplicate host id '{id}' in experiment '{name}'"
                )));
            }
        }

        if config.hosts.is_empty() {
            return Err(ConfigError::Validation(format!(
                "experiment '{name}' must have at least 1 host"
            )));
        }

        if configs.insert(name.to_string(), config).is_some() {
            return Err(ConfigError::Validation(format!(
                "duplicate experiment name '{name}'"
            )));
        }
    }

    Ok(configs)
}

/// Looks up an experiment by name.
///
/// An unknown name is a validation error listing the available experiments.
pub fn get_experiment<'a>(
    configs: &'a BTreeMap<String, ExperimentConfig>,
    name: &str,
) -> Result<&'a ExperimentConfig, SimError> {
    configs.get(name).ok_or_else(|| {
        let available: Vec<&str> = configs.keys().map(String::as_str).collect();
        SimError::Validation(format!(
            "unknown experiment '{}'. Available experiments: {}",
            name,
            available.join(", ")
        ))
    })
}

fn host_field(host: &xml::Element, id: &str, field: &str) -> ConfigResult<u64> {
    let elem = host.child(field).ok_or_else(|| {
        ConfigError::Validation(format!("missing {field} for {id}"))
    })?;
    let value: i64 = elem.text.trim().parse().map_err(|_| {
        ConfigError::Validation(format!("invalid {field} value for {id}"))
    })?;
    u64::try_from(value)
        .map_err(|_| ConfigError::Validation(format!("invalid {field} value for {id}")))
}

/// Minimal XML reader for the experiments schema.
mod xml {
    use super::{ConfigError, ConfigResult};

    /// A parsed element: name, attributes, children, and text content.
    #[derive(Debug, Default)]
    pub struct Element {
        pub name: String,
        pub attrs: Vec<(String, String)>,
        pub children: Vec<Element>,
        pub text: String,
    }

    impl Element {
        pub fn attr(&self, name: &str) -> Option<&str> {
            self.attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }

        pub fn child(&self, name: &str) -> Option<&Element> {
            self.children.iter().find(|c| c.name == name)
        }
    }

    struct Cursor<'a> {
        input: &'a [u8],
        pos: usize,
    }

    /// Parses a document and returns its single root element.
    pub fn parse_document(text: &str) -> ConfigResult<Element> {
        let mut cur = Cursor {
            input: text.as_bytes(),
            pos: 0,
        };
        cur.skip_misc()?;
        let root = cur.parse_element()?;
        cur.skip_misc()?;
        if !cur.at_end() {
            return Err(err("trailing content after root element"));
        }
        Ok(root)
    }

    fn err(msg: impl Into<String>) -> ConfigError {
        ConfigError::Xml(msg.into())
    }

    impl<'a> Cursor<'a> {
        fn at_end(&self) -> bool {
            self.pos >= self.input.len()
        }

        fn peek(&self) -> Option<u8> {
            self.input.get(self.pos).copied()
        }

        fn starts_with(&self, s: &str) -> bool {
            self.input[self.pos..].starts_with(s.as_bytes())
        }

        fn skip_whitespace(&mut self) {
            while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
                self.pos += 1;
            }
        }

        /// Skips whitespace, the prolog, and comments between elements.
        fn skip_misc(&mut self) -> ConfigResult<()> {
            loop {
                self.skip_whitespace();
                if self.starts_with("<?") {
                    self.skip_until("?>")?;
                } else if self.starts_with("<!--") {
                    self.skip_until("-->")?;
                } else {
                    return Ok(());
                }
            }
        }

        fn skip_until(&mut self, end: &str) -> ConfigResult<()> {
            while !self.at_end() {
                if self.starts_with(end) {
                    self.pos += end.len();
                    return Ok(());
                }
                self.pos += 1;
            }
            Err(err(format!("unterminated construct, expected '{end}'")))
        }

        fn read_name(&mut self) -> ConfigResult<String> {
            let start = self.pos;
            while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b':' || b == b'.')
            {
                self.pos += 1;
            }
            if self.pos == start {
                return Err(err("expected a name"));
            }
            Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
        }

        fn expect(&mut self, byte: u8) -> ConfigResult<()> {
            if self.peek() == Some(byte) {
                self.pos += 1;
                Ok(())
            } else {
                Err(err(format!("expected '{}'", byte as char)))
            }
        }

        fn parse_element(&mut self) -> ConfigResult<Element> {
            self.expect(b'<')?;
            let name = self.read_name()?;
            let mut element = Element {
                name,
                ..Element::default()
            };

            loop {
                self.skip_whitespace();
                match self.peek() {
                    Some(b'>') => {
                        self.pos += 1;
                        break;
                    }
                    Some(b'/') => {
                        self.pos += 1;
                        self.expect(b'>')?;
                        return Ok(element);
                    }
                    Some(_) => {
                        let key = self.read_name()?;
                        self.skip_whitespace();
                        self.expect(b'=')?;
                        self.skip_whitespace();
                        let quote = self
                            .peek()
                            .filter(|&b| b == b'"' || b == b'\'')
                            .ok_or_else(|| err("attribute value must be quoted"))?;
                        self.pos += 1;
                        let start = self.pos;
                        while self.peek().is_some_and(|b| b != quote) {
                            self.pos += 1;
                        }
                        if self.at_end() {
                            return Err(err("unterminated attribute value"));
                        }
                        let raw = String::from_utf8_lossy(&self.input[start..self.pos]);
                        self.pos += 1;
                        element.attrs.push((key, unescape(&raw)));
                    }
                    None => return Err(err(format!("unterminated tag '{}'", element.name))),
                }
            }

            // Content: text, comments, and child elements up to the close tag.
            loop {
                if self.at_end() {
                    return Err(err(format!("missing close tag for '{}'", element.name)));
                }
                if self.starts_with("</") {
                    self.pos += 2;
                    let close = self.read_name()?;
                    if close != element.name {
                        return Err(err(format!(
                            "mismatched close tag: expected '{}', got '{close}'",
                            element.name
                        )));
                    }
                    self.skip_whitespace();
                    self.expect(b'>')?;
                    return Ok(element);
                }
                if self.starts_with("<!--") {
                    self.skip_until("-->")?;
                    continue;
                }
                if self.peek() == Some(b'<') {
                    element.children.push(self.parse_element()?);
                    continue;
                }
                let start = self.pos;
                while self.peek().is_some_and(|b| b != b'<') {
                    self.pos += 1;
                }
                let raw = String::from_utf8_lossy(&self.input[start..self.pos]);
                element.text.push_str(&unescape(&raw));
            }
        }
    }

    fn unescape(text: &str) -> String {
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }
}
