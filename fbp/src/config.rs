use std::path::Path;

use common::file_format::{FileExtensionError, SerdeFormat};
use hashbrown::{HashMap, HashSet};
use serde::Deserialize;
use serde_yml::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No {0} tag specified.")]
    MissingNode(String),
    #[error("Content of {name} is not a valid {expected}.")]
    InvalidContent { name: String, expected: &'static str },
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Format(#[from] FileExtensionError),
    #[error("YAML config could not be parsed: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("JSON config could not be parsed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Declarative configuration tree: top-level nodes plus an `option` map.
///
/// Every lookup helper is read-only; consumers report what they used with
/// [`Config::mark_node_parsed`] / [`Config::mark_option_parsed`] so that
/// leftovers can be reported with [`Config::warn_unparsed`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, rename = "type")]
    algorithm_type: Option<String>,
    #[serde(default, rename = "option")]
    options: HashMap<String, Value>,
    #[serde(flatten)]
    nodes: HashMap<String, Value>,

    #[serde(skip)]
    parsed_nodes: HashSet<String>,
    #[serde(skip)]
    parsed_options: HashSet<String>,
}

impl Config {
    pub fn new(algorithm_type: &str) -> Self {
        Self {
            algorithm_type: Some(algorithm_type.to_string()),
            ..Default::default()
        }
    }

    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yml::from_str(yaml)?)
    }
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let format = SerdeFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        match format {
            SerdeFormat::Yaml => Self::from_yaml(&text),
            SerdeFormat::Json => Self::from_json(&text),
        }
    }

    pub fn algorithm_type(&self) -> Option<&str> {
        self.algorithm_type.as_deref()
    }

    pub fn set_node(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.nodes.insert(name.to_string(), value.into());
        self
    }
    pub fn set_option(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.options.insert(name.to_string(), value.into());
        self
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }
    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn content_str(&self, name: &str) -> ConfigResult<String> {
        match self.node(name)? {
            Value::String(text) => Ok(text.clone()),
            Value::Number(number) => Ok(number.to_string()),
            _ => Err(invalid(name, "string")),
        }
    }

    pub fn content_int(&self, name: &str) -> ConfigResult<i64> {
        value_as_int(self.node(name)?).ok_or_else(|| invalid(name, "integer"))
    }

    pub fn content_numerical(&self, name: &str) -> ConfigResult<f64> {
        value_as_float(self.node(name)?).ok_or_else(|| invalid(name, "number"))
    }

    pub fn option_bool(&self, name: &str, default: bool) -> ConfigResult<bool> {
        match self.options.get(name) {
            None => Ok(default),
            Some(value) => value_as_bool(value).ok_or_else(|| invalid(name, "boolean")),
        }
    }

    pub fn option_int(&self, name: &str, default: i64) -> ConfigResult<i64> {
        match self.options.get(name) {
            None => Ok(default),
            Some(value) => value_as_int(value).ok_or_else(|| invalid(name, "integer")),
        }
    }

    pub fn option_numerical(&self, name: &str, default: f64) -> ConfigResult<f64> {
        match self.options.get(name) {
            None => Ok(default),
            Some(value) => value_as_float(value).ok_or_else(|| invalid(name, "number")),
        }
    }

    pub fn mark_node_parsed(&mut self, name: &str) {
        self.parsed_nodes.insert(name.to_string());
    }
    pub fn mark_option_parsed(&mut self, name: &str) {
        self.parsed_options.insert(name.to_string());
    }

    pub fn is_node_parsed(&self, name: &str) -> bool {
        self.parsed_nodes.contains(name)
    }
    pub fn is_option_parsed(&self, name: &str) -> bool {
        self.parsed_options.contains(name)
    }

    pub fn unparsed_nodes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .nodes
            .keys()
            .filter(|name| !self.parsed_nodes.contains(*name))
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn unparsed_options(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .options
            .keys()
            .filter(|name| !self.parsed_options.contains(*name))
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    /// Logs every node and option nobody consumed. Returns `true` when the tree was fully used.
    pub fn warn_unparsed(&self, component: &str) -> bool {
        let nodes = self.unparsed_nodes();
        let options = self.unparsed_options();

        for name in nodes.iter() {
            warn!("{}: unused configuration node: {}", component, name);
        }
        for name in options.iter() {
            warn!("{}: unused configuration option: {}", component, name);
        }

        nodes.is_empty() && options.is_empty()
    }

    fn node(&self, name: &str) -> ConfigResult<&Value> {
        self.nodes
            .get(name)
            .ok_or_else(|| ConfigError::MissingNode(name.to_string()))
    }
}

fn invalid(name: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidContent {
        name: name.to_string(),
        expected,
    }
}

fn value_as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0),
        Value::String(text) => {
            let text = text.trim();
            Some(
                text.eq_ignore_ascii_case("yes")
                    || text.eq_ignore_ascii_case("true")
                    || text == "1",
            )
        }
        _ => None,
    }
}
