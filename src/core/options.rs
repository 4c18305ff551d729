// src/core/options.rs

use crate::constants::{HELP_FLAG, INDENT, VERSION_FLAG, key_of};
use crate::core::property::PropertyTree;
use std::collections::HashSet;
use std::fmt::Write as _;
use thiserror::Error;

// --- DATA STRUCTS ---

/// Declarative description of one accepted command-line flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    flag: String,
    description: String,
    mandatory: bool,
    takes_value: bool,
    default_value: Option<String>,
}

impl OptionSpec {
    /// A flag that takes no argument, e.g. `-quiet`.
    pub fn no_param(flag: &str, description: &str, mandatory: bool) -> Self {
        Self {
            flag: flag.to_string(),
            description: description.to_string(),
            mandatory,
            takes_value: false,
            default_value: None,
        }
    }

    /// A flag followed by exactly one value, e.g. `-db reads.fa`.
    pub fn one_param(flag: &str, description: &str, mandatory: bool) -> Self {
        Self {
            takes_value: true,
            ..Self::no_param(flag, description, mandatory)
        }
    }

    /// Value injected when the (optional) flag is not given on the command line.
    pub fn with_default(mut self, default_value: &str) -> Self {
        self.default_value = Some(default_value.to_string());
        self
    }

    /// The flag as typed on the command line, e.g. `-nb-cores`.
    pub fn flag(&self) -> &str {
        &self.flag
    }

    /// The property key the flag is stored under: the flag without its dashes.
    pub fn key(&self) -> &str {
        key_of(&self.flag)
    }

    /// Text shown in the help listing.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether parsing fails when the flag is absent.
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Whether the next token is consumed as the value.
    pub fn takes_value(&self) -> bool {
        self.takes_value
    }

    /// Value injected when the flag is absent.
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }
}

/// A single command-line violation found by [`OptionsParser::parse`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// A token looks like a flag but is not registered.
    #[error("Unknown option '{0}'.")]
    UnknownOption(String),
    /// A value-taking flag ends the arguments.
    #[error("Option '{0}' expects a value but none was given.")]
    MissingValue(String),
    /// A mandatory flag never appeared.
    #[error("Mandatory option '{0}' is missing.")]
    MissingMandatoryOption(String),
}

/// Every violation found in one pass over the arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render_violations(.violations))]
pub struct ParseError {
    /// Violations in argument order, missing mandatory options last.
    pub violations: Vec<OptionError>,
}

fn render_violations(violations: &[OptionError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// What a successful parse produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The resolved options, one leaf per option at depth 1.
    Properties(PropertyTree),
    /// `-help` was given: the listing to display instead of running.
    Help(String),
    /// `-version` was given.
    Version,
}

// --- PARSER ---

/// Registry of [`OptionSpec`]s and the parser built on it.
///
/// The registry keeps registration order, which is also the order of the help
/// listing. Parsing is a pure function of the registry and the arguments.
#[derive(Debug, Clone)]
pub struct OptionsParser {
    name: String,
    specs: Vec<OptionSpec>,
}

impl OptionsParser {
    /// An empty registry for the tool `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            specs: Vec::new(),
        }
    }

    /// Registers `spec`. A spec with the same flag replaces the previous one
    /// in place, which lets a tool tighten a universal option (e.g. make `-db`
    /// mandatory) without changing the help order.
    pub fn add(&mut self, spec: OptionSpec) -> &mut Self {
        match self.specs.iter_mut().find(|s| s.flag == spec.flag) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
        self
    }

    /// Registered specs in registration order.
    pub fn specs(&self) -> &[OptionSpec] {
        &self.specs
    }

    /// The spec registered for `flag`.
    pub fn find(&self, flag: &str) -> Option<&OptionSpec> {
        self.specs.iter().find(|s| s.flag == flag)
    }

    /// Parses raw arguments (program name excluded) against the registry.
    ///
    /// # Logic:
    /// - Tokens are walked left to right. A registered flag is consumed; if it
    ///   takes a value, the next token is its value whatever it looks like.
    /// - `-help` stops the parse and yields the help listing.
    /// - Mandatory flags never seen are violations; optional value flags with a
    ///   default are injected at depth 1.
    /// - All violations are collected and reported together.
    pub fn parse<S: AsRef<str>>(&self, args: &[S]) -> Result<ParseOutcome, ParseError> {
        let mut tree = PropertyTree::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut violations = Vec::new();
        let tokens: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();
        let mut tokens = tokens.into_iter();

        while let Some(token) = tokens.next() {
            if token == HELP_FLAG {
                log::trace!("'{}' found, stopping the parse.", HELP_FLAG);
                return Ok(ParseOutcome::Help(self.help()));
            }

            let Some(spec) = self.find(token) else {
                violations.push(OptionError::UnknownOption(token.to_string()));
                continue;
            };

            if spec.flag == VERSION_FLAG {
                return Ok(ParseOutcome::Version);
            }

            seen.insert(spec.flag.as_str());
            if spec.takes_value {
                match tokens.next() {
                    Some(value) => {
                        log::trace!("Option {} = '{}'", spec.flag, value);
                        tree.add(1, spec.key(), value);
                    }
                    None => violations.push(OptionError::MissingValue(spec.flag.clone())),
                }
            } else {
                log::trace!("Option {} set", spec.flag);
                tree.add(1, spec.key(), "");
            }
        }

        for spec in &self.specs {
            if seen.contains(spec.flag.as_str()) {
                continue;
            }
            if spec.mandatory {
                violations.push(OptionError::MissingMandatoryOption(spec.flag.clone()));
            } else if spec.takes_value
                && let Some(default) = &spec.default_value
            {
                tree.add(1, spec.key(), default.as_str());
            }
        }

        if violations.is_empty() {
            Ok(ParseOutcome::Properties(tree))
        } else {
            Err(ParseError { violations })
        }
    }

    /// The option listing shown for `-help`, in registration order.
    pub fn help(&self) -> String {
        let width = self.specs.iter().map(|s| s.flag.len()).max().unwrap_or(0);
        let mut text = format!("[{} options]\n", self.name);
        for spec in &self.specs {
            let arity = if spec.takes_value { "(1 arg)" } else { "(0 arg)" };
            let mut line = format!(
                "{}{:<width$} {} :    {}",
                INDENT,
                spec.flag,
                arity,
                spec.description,
                width = width
            );
            if spec.mandatory {
                line.push_str("  [mandatory]");
            } else if let Some(default) = &spec.default_value {
                let _ = write!(line, "  [default '{}']", default);
            }
            text.push_str(&line);
            text.push('\n');
        }
        text
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    fn to_cli_params(params: &[&str]) -> Vec<String> {
        params.iter().map(|s| s.to_string()).collect()
    }

    fn sample_parser() -> OptionsParser {
        let mut parser = OptionsParser::new("sample");
        parser
            .add(OptionSpec::one_param("-nb-cores", "number of cores", false).with_default("0"))
            .add(OptionSpec::no_param("-quiet", "quiet execution", false))
            .add(OptionSpec::one_param("-prefix", "prefix for temp files", false))
            .add(OptionSpec::one_param("-db", "databank uri", true))
            .add(OptionSpec::no_param(HELP_FLAG, "display help", false));
        parser
    }

    fn properties(outcome: ParseOutcome) -> PropertyTree {
        match outcome {
            ParseOutcome::Properties(tree) => tree,
            other => panic!("expected properties, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_mandatory_option_is_named() {
        let params = to_cli_params(&["-nb-cores", "0", "-quiet"]);
        let err = sample_parser().parse(&params).unwrap_err();

        assert_eq!(
            err.violations,
            vec![OptionError::MissingMandatoryOption("-db".to_string())]
        );
        assert!(err.to_string().contains("-db"));
    }

    #[test]
    fn test_successful_parse_resolves_every_option() {
        let params = to_cli_params(&["-nb-cores", "0", "-quiet", "-db", "reads.fa"]);
        let tree = properties(sample_parser().parse(&params).unwrap());

        assert_eq!(tree.get_int("nb-cores").unwrap(), 0);
        assert!(tree.contains("quiet"));
        assert_eq!(tree.get_str("db").unwrap(), "reads.fa");
        // No default is registered for -prefix, so nothing is injected.
        assert!(!tree.contains("prefix"));
    }

    #[test]
    fn test_default_is_injected_for_unseen_option() {
        let params = to_cli_params(&["-db", "reads.fa"]);
        let tree = properties(sample_parser().parse(&params).unwrap());

        assert_eq!(tree.get_str("nb-cores").unwrap(), "0");
        assert!(tree.entries().iter().all(|p| p.depth() == 1));
    }

    #[test]
    fn test_all_violations_are_aggregated() {
        let params = to_cli_params(&["-bogus", "-quiet", "-other", "-prefix"]);
        let err = sample_parser().parse(&params).unwrap_err();

        assert_eq!(
            err.violations,
            vec![
                OptionError::UnknownOption("-bogus".to_string()),
                OptionError::UnknownOption("-other".to_string()),
                OptionError::MissingValue("-prefix".to_string()),
                OptionError::MissingMandatoryOption("-db".to_string()),
            ]
        );
        assert_eq!(err.to_string().lines().count(), 4);
    }

    #[test]
    fn test_value_is_taken_verbatim_even_if_it_looks_like_a_flag() {
        let params = to_cli_params(&["-db", "-quiet"]);
        let tree = properties(sample_parser().parse(&params).unwrap());

        assert_eq!(tree.get_str("db").unwrap(), "-quiet");
        assert!(!tree.contains("quiet"));
    }

    #[test]
    fn test_help_short_circuits_parsing() {
        let params = to_cli_params(&["-bogus", "-help", "-db"]);
        let outcome = sample_parser().parse(&params).unwrap();

        let ParseOutcome::Help(text) = outcome else {
            panic!("expected help");
        };
        assert!(text.starts_with("[sample options]"));
        let nb_cores = text.find("-nb-cores").unwrap();
        let db = text.find("-db").unwrap();
        assert!(nb_cores < db);
        assert!(text.contains("[default '0']"));
        assert!(text.contains("[mandatory]"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = sample_parser();
        let params = to_cli_params(&["-quiet", "-db", "reads.fa", "-nb-cores", "3"]);

        let first = parser.parse(&params).unwrap();
        let second = parser.parse(&params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_repeated_flag_keeps_first_value_for_lookup() {
        let params = to_cli_params(&["-db", "a.fa", "-db", "b.fa"]);
        let tree = properties(sample_parser().parse(&params).unwrap());
        assert_eq!(tree.get_str("db").unwrap(), "a.fa");
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_add_replaces_spec_in_place() {
        let mut parser = sample_parser();
        parser.add(OptionSpec::one_param("-db", "databank uri", false));

        assert_eq!(parser.specs().len(), 5);
        assert_eq!(parser.specs()[3].flag(), "-db");
        assert!(!parser.specs()[3].is_mandatory());
        assert!(parser.parse(&to_cli_params(&[])).is_ok());
    }

    #[test]
    fn test_version_flag_needs_registration() {
        let mut parser = sample_parser();
        let params = to_cli_params(&["-version"]);
        assert!(parser.parse(&params).is_err());

        parser.add(OptionSpec::no_param(VERSION_FLAG, "display version", false));
        assert_eq!(parser.parse(&params).unwrap(), ParseOutcome::Version);
    }
}
