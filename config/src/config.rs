use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use util::HashMap;

use crate::parse::{parse, Item};

/// Section consulted when a key is missing from the section asked for.
pub const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config parameter [{section}] {key} is not defined")]
    Missing { section: String, key: String },
    #[error("config parameter [{section}] {key}: expected {wanted}, got \"{value}\"")]
    BadValue {
        section: String,
        key: String,
        wanted: &'static str,
        value: String,
    },
    #[error("config parameter [{section}] {key}: path \"{value}\" does not exist")]
    MissingPath {
        section: String,
        key: String,
        value: String,
    },
}

/// Merged view of one or more INI config files.
///
/// Lookups are scoped by section (by convention, a step name), falling back
/// to the `[DEFAULT]` section when the step section does not define the key.
/// Later files passed to `load` override earlier ones key-by-key.
#[derive(Debug, Default)]
pub struct Config {
    sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut cfg = Self::default();
        for path in paths {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            cfg.merge_str(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?;
        }
        log::debug!(
            "loaded {} config sections from {} file(s)",
            cfg.sections.len(),
            paths.len()
        );
        Ok(cfg)
    }

    /// Fold one file's items into the merged view.
    pub fn merge_str(&mut self, text: &str) -> Result<()> {
        let mut current: Option<String> = None;
        for item in parse(text)? {
            match item {
                Item::Section(name) => {
                    self.sections.entry(name.to_string()).or_default();
                    current = Some(name.to_string());
                }
                Item::Assignment(key, value) => match &current {
                    Some(section) => {
                        self.sections
                            .entry(section.clone())
                            .or_default()
                            .insert(key.to_string(), value.to_string());
                    }
                    None => bail!("key \"{}\" appears before any [section] header", key),
                },
            }
        }
        Ok(())
    }
}

// LOOKUPS //////////////////////////////////////////////

impl Config {
    /// Raw lookup with DEFAULT fallback; `Err` if neither scope defines the key.
    pub fn param(&self, section: &str, key: &str) -> Result<&str, Error> {
        self.param_opt(section, key).ok_or_else(|| Error::Missing {
            section: section.to_string(),
            key: key.to_string(),
        })
    }

    /// Raw lookup with DEFAULT fallback, `None` when absent.
    pub fn param_opt(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .or_else(|| self.sections.get(DEFAULT_SECTION).and_then(|s| s.get(key)))
            .map(String::as_str)
    }

    pub fn param_int(&self, section: &str, key: &str) -> Result<i64, Error> {
        let value = self.param(section, key)?;
        value
            .parse()
            .map_err(|_| self.bad_value(section, key, "an integer", value))
    }

    /// Integer strictly greater than zero.
    pub fn param_posint(&self, section: &str, key: &str) -> Result<u64, Error> {
        let value = self.param(section, key)?;
        match value.parse() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(self.bad_value(section, key, "a positive integer", value)),
        }
    }

    pub fn param_float(&self, section: &str, key: &str) -> Result<f64, Error> {
        let value = self.param(section, key)?;
        value
            .parse()
            .map_err(|_| self.bad_value(section, key, "a number", value))
    }

    pub fn param_bool(&self, section: &str, key: &str) -> Result<bool, Error> {
        let value = self.param(section, key)?;
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.bad_value(section, key, "a boolean", value)),
        }
    }

    /// Lookup that must name a path that exists at generation time.
    pub fn param_filepath(&self, section: &str, key: &str) -> Result<PathBuf, Error> {
        let value = self.param(section, key)?;
        if Path::new(value).exists() {
            Ok(PathBuf::from(value))
        } else {
            Err(Error::MissingPath {
                section: section.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Environment-module string for `module load`, from the `module_<name>` key.
    pub fn module(&self, section: &str, name: &str) -> Result<String, Error> {
        self.param(section, &format!("module_{}", name)).map(str::to_string)
    }

    fn bad_value(&self, section: &str, key: &str, wanted: &'static str, value: &str) -> Error {
        Error::BadValue {
            section: section.to_string(),
            key: key.to_string(),
            wanted,
            value: value.to_string(),
        }
    }
}
