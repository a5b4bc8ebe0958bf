// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Configuration of the libraries and of the analysis

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use fnv::FnvHashMap;
use subst::VariableMap;
use thiserror::Error;
use toml::{Table, Value};

use crate::data::*;

/// The name of the configuration file of a project
pub const CONFIG_FILE_NAME: &str = "vhdl_analyzer.toml";

/// The environment variable naming an additional configuration file
pub const CONFIG_ENV_VAR: &str = "VHDL_ANALYZER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

impl From<String> for ConfigError {
    fn from(message: String) -> ConfigError {
        ConfigError::Invalid(message)
    }
}

impl From<&str> for ConfigError {
    fn from(message: &str) -> ConfigError {
        ConfigError::Invalid(message.to_owned())
    }
}

/// What to do with assignments whose type compatibility cannot be decided statically
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UnsurePolicy {
    #[default]
    Ignore,
    Hint,
}

impl FromStr for UnsurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ignore" => UnsurePolicy::Ignore,
            "hint" => UnsurePolicy::Hint,
            other => return Err(other.to_string()),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Minimum time between the last edit and re-parsing a document
    pub debounce: Duration,
    pub deep_analysis: bool,
    /// Nesting limit of interpreted function calls
    pub max_call_depth: usize,
    pub unsure: UnsurePolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            debounce: Duration::from_millis(300),
            deep_analysis: true,
            max_call_depth: 10,
            unsure: UnsurePolicy::Ignore,
        }
    }
}

impl AnalysisConfig {
    fn from_table(table: &Table) -> Result<AnalysisConfig, ConfigError> {
        let mut config = AnalysisConfig::default();
        for (key, value) in table {
            match key.as_str() {
                "debounce_ms" => {
                    let millis = non_negative(key, value)?;
                    config.debounce = Duration::from_millis(millis as u64);
                }
                "deep_analysis" => {
                    config.deep_analysis = value
                        .as_bool()
                        .ok_or("deep_analysis must be a boolean")?;
                }
                "max_call_depth" => config.max_call_depth = non_negative(key, value)? as usize,
                "unsure" => {
                    config.unsure = value
                        .as_str()
                        .ok_or("unsure must be a string")?
                        .parse()
                        .map_err(|other| format!("Unsure policy '{other}' not valid"))?;
                }
                other => return Err(format!("Unknown analysis setting '{other}'").into()),
            }
        }
        Ok(config)
    }
}

fn non_negative(key: &str, value: &Value) -> Result<i64, ConfigError> {
    match value.as_integer() {
        Some(value) if value >= 0 => Ok(value),
        _ => Err(format!("{key} must be a non-negative integer").into()),
    }
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct Config {
    // A map from library name to file name
    libraries: FnvHashMap<String, LibraryConfig>,
    // Only set by files that have an [analysis] table
    analysis: Option<AnalysisConfig>,
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct LibraryConfig {
    name: String,
    patterns: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl LibraryConfig {
    /// Reads `name.files` and the optional `name.exclude` of the `[libraries]` table.
    /// Patterns are made relative to `parent`.
    fn from_toml(name: &str, value: &Value, parent: &Path) -> Result<LibraryConfig, ConfigError> {
        if name.eq_ignore_ascii_case("work") {
            return Err(format!(
                "The '{name}' library is not a valid library.\nHint: To use a library that contains all files, use a common name for all libraries, i.e., 'defaultlib'"
            )
            .into());
        }
        let patterns = |key: &str| -> Result<Vec<String>, ConfigError> {
            match value.get(key) {
                Some(Value::Array(array)) => resolve_patterns(array, parent),
                Some(_) => Err(format!("{key} of library {name} must be an array").into()),
                None => Ok(Vec::new()),
            }
        };
        if value.get("files").is_none() {
            return Err(format!("missing field files for library {name}").into());
        }
        Ok(LibraryConfig {
            name: name.to_lowercase(),
            patterns: patterns("files")?,
            exclude_patterns: patterns("exclude")?,
        })
    }

    /// The existing files matched by the patterns minus the excluded ones.
    /// Patterns that match nothing produce a warning message.
    pub fn file_names(&self, messages: &mut dyn MessageHandler) -> Vec<PathBuf> {
        let included = match_file_patterns(&self.patterns, messages);
        let exclude = match_file_patterns(&self.exclude_patterns, messages);
        included
            .into_iter()
            .filter(|file_name| !exclude.contains(file_name))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Config {
    pub fn from_str(string: &str, parent: &Path) -> Result<Config, ConfigError> {
        let config = string.parse::<Table>()?;
        let Some(Value::Table(libraries)) = config.get("libraries") else {
            return Err("libraries must be a table".into());
        };
        let libraries: FnvHashMap<String, LibraryConfig> = libraries
            .iter()
            .map(|(name, value)| -> Result<_, ConfigError> {
                let library = LibraryConfig::from_toml(name, value, parent)?;
                Ok((library.name.clone(), library))
            })
            .collect::<Result<_, ConfigError>>()?;

        let analysis = match config.get("analysis") {
            Some(Value::Table(analysis)) => Some(AnalysisConfig::from_table(analysis)?),
            Some(_) => return Err("analysis must be a table".into()),
            None => None,
        };

        Ok(Config {
            libraries,
            analysis,
        })
    }

    pub fn read_file_path(file_name: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(file_name).map_err(|source| ConfigError::Io {
            path: file_name.to_owned(),
            source,
        })?;
        let parent = file_name.parent().unwrap_or_else(|| Path::new(""));
        Config::from_str(&contents, parent)
    }

    pub fn get_library(&self, name: &str) -> Option<&LibraryConfig> {
        self.libraries.get(name)
    }

    /// Libraries sorted by name
    pub fn iter_libraries(&self) -> impl Iterator<Item = &LibraryConfig> {
        let mut libraries: Vec<&LibraryConfig> = self.libraries.values().collect();
        libraries.sort_by(|a, b| a.name.cmp(&b.name));
        libraries.into_iter()
    }

    pub fn analysis(&self) -> AnalysisConfig {
        self.analysis.clone().unwrap_or_default()
    }

    /// Append another config to self
    ///
    /// In case of conflict the appended config takes precedence
    pub fn append(&mut self, config: &Config, messages: &mut dyn MessageHandler) {
        for library in config.libraries.values() {
            if let Some(parent_library) = self.libraries.get_mut(&library.name) {
                *parent_library = library.clone();

                messages.push(Message::warning(format!(
                    "Re-defined library {}",
                    &library.name
                )));
            } else {
                self.libraries.insert(library.name.clone(), library.clone());
            }
        }
        if config.analysis.is_some() {
            self.analysis.clone_from(&config.analysis);
        }
    }

    /// Load configuration file from home folder
    fn load_home_config(&mut self, messages: &mut dyn MessageHandler) {
        if let Some(home_dir) = dirs::home_dir() {
            let file_name = home_dir.join(format!(".{CONFIG_FILE_NAME}"));

            if !file_name.exists() {
                return;
            }

            self.load_config(&file_name, "HOME folder", messages);
        }
    }

    /// Load configuration file from environment
    fn load_env_config(&mut self, env_name: &str, messages: &mut dyn MessageHandler) {
        if let Some(file_name) = std::env::var_os(env_name) {
            self.load_config(Path::new(&file_name), env_name, messages);
        };
    }

    /// Load and append configuration file
    pub fn load_config(&mut self, file_name: &Path, desc: &str, messages: &mut dyn MessageHandler) {
        match Config::read_file_path(file_name) {
            Ok(config) => {
                messages.push(Message::log(format!(
                    "Loaded {} configuration file: {}",
                    desc,
                    file_name.to_string_lossy()
                )));

                self.append(&config, messages);
            }
            Err(ref err) => {
                messages.push(Message::error(format!(
                    "Error while loading {desc} configuration file: {err}"
                )));
            }
        }
    }

    /// Load the configuration of the home folder and then the one named by the environment
    pub fn load_external_config(&mut self, messages: &mut dyn MessageHandler) {
        self.load_home_config(messages);
        self.load_env_config(CONFIG_ENV_VAR, messages);
    }
}

fn match_file_patterns(
    patterns: &[String],
    messages: &mut dyn MessageHandler,
) -> BTreeSet<PathBuf> {
    let mut result = BTreeSet::new();
    for pattern in patterns.iter() {
        let stripped_pattern = if cfg!(windows) {
            pattern.strip_prefix("\\\\?\\").unwrap_or(pattern.as_str())
        } else {
            pattern.as_str()
        };

        if is_literal(stripped_pattern) {
            let file_path = PathBuf::from(pattern);

            if file_path.exists() {
                result.insert(file_path);
            } else {
                messages.push(Message::warning(format!("File {pattern} does not exist")));
            }
            continue;
        }

        let paths = match glob::glob(stripped_pattern) {
            Ok(paths) => paths,
            Err(err) => {
                messages.push(Message::error(format!("Invalid pattern '{pattern}' {err}")));
                continue;
            }
        };
        let before = result.len();
        for file_path_or_error in paths {
            match file_path_or_error {
                Ok(file_path) => {
                    result.insert(file_path);
                }
                Err(err) => messages.push(Message::error(err.to_string())),
            }
        }
        if result.len() == before {
            messages.push(Message::warning(format!(
                "Pattern '{stripped_pattern}' did not match any file"
            )));
        }
    }
    result
}

/// Substitutes environment variables and joins the patterns to `parent`
fn resolve_patterns(patterns: &[Value], parent: &Path) -> Result<Vec<String>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| -> Result<String, ConfigError> {
            let pattern = pattern
                .as_str()
                .ok_or_else(|| format!("File pattern {pattern} is not a string"))?;
            let pattern = substitute_environment_variables(pattern, &subst::Env)?;
            let path = parent.join(pattern);
            path.to_str()
                .map(str::to_owned)
                .ok_or_else(|| format!("Could not convert {path:?} to string").into())
        })
        .collect()
}

fn substitute_environment_variables<'a, M>(s: &str, map: &'a M) -> Result<String, String>
where
    M: VariableMap<'a> + ?Sized,
    M::Value: AsRef<str>,
{
    if cfg!(windows) {
        substitute_percent_variables(s, map)
    } else {
        subst::substitute(s, map).map_err(|err| err.to_string())
    }
}

/// Substitutes `%NAME%` variables
fn substitute_percent_variables<'a, M>(s: &str, map: &'a M) -> Result<String, String>
where
    M: VariableMap<'a> + ?Sized,
    M::Value: AsRef<str>,
{
    let mut output = String::with_capacity(s.len());
    let mut parts = s.split('%');
    if let Some(first) = parts.next() {
        output.push_str(first);
    }
    loop {
        let Some(name) = parts.next() else {
            return Ok(output);
        };
        let Some(text) = parts.next() else {
            return Err("Unterminated variable".into());
        };
        match map.get(name) {
            Some(value) => output.push_str(value.as_ref()),
            None => return Err(format!("Variable '{name}' not found")),
        }
        output.push_str(text);
    }
}

/// Returns true if the pattern is a plain file name and not a glob pattern
fn is_literal(pattern: &str) -> bool {
    !pattern.chars().any(|chr| matches!(&chr, '?' | '*' | '['))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs::File;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Utility function to create an empty file in parent folder
    fn touch(parent: &Path, file_name: &str) -> PathBuf {
        let path = parent.join(file_name);
        File::create(&path).expect("Assume file can be created");
        path
    }

    fn abspaths(paths: &[PathBuf]) -> BTreeSet<PathBuf> {
        paths
            .iter()
            .map(|path| fs::canonicalize(path).unwrap())
            .collect()
    }

    #[test]
    fn test_is_literal() {
        assert!(is_literal("file.vhd"));
        assert!(!is_literal("file*.vhd"));
        assert!(!is_literal("file?.vhd"));
        assert!(!is_literal("file[ab].vhd"));
    }

    #[test]
    fn config_from_str() {
        let tempdir = tempfile::tempdir().unwrap();
        let parent = tempdir.path();

        let config = Config::from_str(
            "
[libraries]
lib2.files = ['pkg2.vhd']
Lib1.files = ['*.vhd']
Lib1.exclude = ['pkg2.vhd']
",
            parent,
        )
        .unwrap();
        let libraries: Vec<&str> = config.iter_libraries().map(|lib| lib.name()).collect();
        assert_eq!(libraries, &["lib1", "lib2"]);

        let pkg1_path = touch(parent, "pkg1.vhd");
        let pkg2_path = touch(parent, "pkg2.vhd");
        let ent_path = touch(parent, "ent.vhd");

        let mut messages = vec![];
        let lib1 = config.get_library("lib1").unwrap();
        let lib2 = config.get_library("lib2").unwrap();
        assert_eq!(
            abspaths(&lib1.file_names(&mut messages)),
            abspaths(&[pkg1_path, ent_path])
        );
        assert_eq!(
            abspaths(&lib2.file_names(&mut messages)),
            abspaths(&[pkg2_path])
        );
        assert_eq!(messages, vec![]);
        assert_eq!(config.analysis(), AnalysisConfig::default());
    }

    #[test]
    fn missing_files_are_reported() {
        let tempdir = tempfile::tempdir().unwrap();
        let config = Config::from_str(
            "
[libraries]
lib.files = ['missing.vhd', 'none/*.vhd']
",
            tempdir.path(),
        )
        .unwrap();
        let mut messages = vec![];
        let files = config.get_library("lib").unwrap().file_names(&mut messages);
        assert!(files.is_empty());
        assert_eq!(messages.len(), 2);
        assert!(messages
            .iter()
            .all(|message| message.message_type == MessageType::Warning));
    }

    #[test]
    fn analysis_settings() {
        let config = Config::from_str(
            "
[libraries]

[analysis]
debounce_ms = 50
deep_analysis = false
max_call_depth = 3
unsure = 'hint'
",
            Path::new(""),
        )
        .unwrap();
        assert_eq!(
            config.analysis(),
            AnalysisConfig {
                debounce: Duration::from_millis(50),
                deep_analysis: false,
                max_call_depth: 3,
                unsure: UnsurePolicy::Hint,
            }
        );
    }

    #[test]
    fn invalid_settings() {
        let parse = |code: &str| Config::from_str(code, Path::new(""));
        assert_matches!(
            parse("[libraries]\nwork.files = []"),
            Err(ConfigError::Invalid(_))
        );
        assert_matches!(
            parse("[libraries]\nlib.files = 'a.vhd'"),
            Err(ConfigError::Invalid(_))
        );
        assert_matches!(
            parse("[libraries]\n[analysis]\nunsure = 'maybe'"),
            Err(ConfigError::Invalid(_))
        );
        assert_matches!(
            parse("[libraries]\n[analysis]\ndebounce_ms = -1"),
            Err(ConfigError::Invalid(_))
        );
        assert_matches!(
            parse("[libraries]\n[analysis]\ncolor = 1"),
            Err(ConfigError::Invalid(_))
        );
        assert_matches!(parse("libraries = ["), Err(ConfigError::Toml(_)));
        assert_matches!(parse(""), Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn read_missing_file() {
        assert_matches!(
            Config::read_file_path(Path::new("/definitely/not/here.toml")),
            Err(ConfigError::Io { .. })
        );
    }

    #[test]
    fn test_append_config() {
        let config0 = Config::from_str(
            "
[libraries]
lib1.files = ['pkg1.vhd']
lib2.files = ['pkg2.vhd']

[analysis]
max_call_depth = 4
",
            Path::new("parent_folder0"),
        )
        .unwrap();

        let config1 = Config::from_str(
            "
[libraries]
lib2.files = ['ent.vhd']
lib3.files = ['pkg3.vhd']
",
            Path::new("parent_folder1"),
        )
        .unwrap();

        let mut merged = config0.clone();
        let mut messages = vec![];
        merged.append(&config1, &mut messages);
        assert_eq!(messages, vec![Message::warning("Re-defined library lib2")]);

        let names: Vec<&str> = merged.iter_libraries().map(|lib| lib.name()).collect();
        assert_eq!(names, &["lib1", "lib2", "lib3"]);
        assert_eq!(
            merged.get_library("lib2").unwrap().patterns,
            vec![Path::new("parent_folder1").join("ent.vhd").to_string_lossy().to_string()]
        );
        // Settings survive appending a file without an analysis table
        assert_eq!(merged.analysis().max_call_depth, 4);
    }

    #[test]
    fn test_substitute() {
        let mut map = HashMap::new();
        map.insert("A".to_owned(), "a".to_owned());
        map.insert("ABCD".to_owned(), "abcd".to_owned());

        assert_eq!(
            substitute_percent_variables("test%A%", &map),
            Ok("testa".into())
        );
        assert_eq!(
            substitute_percent_variables("%ABCD%/x", &map),
            Ok("abcd/x".into())
        );
        assert_eq!(
            substitute_percent_variables("%A%%A%", &map),
            Ok("aa".into())
        );
        assert_eq!(
            substitute_percent_variables("plain", &map),
            Ok("plain".into())
        );
        assert!(substitute_percent_variables("%A", &map).is_err());
        assert!(substitute_percent_variables("%B%", &map).is_err());

        if !cfg!(windows) {
            assert_eq!(
                substitute_environment_variables("$ABCD/file.vhd", &map),
                Ok("abcd/file.vhd".into())
            );
        }
    }
}
