//! Attribute-declaration repair for near-ARFF files.
//!
//! Real NSL-KDD exports often declare columns as `numeric`, `string` or
//! `real` in lower or mixed case, or leave nominal columns without an enumeration. [`AttributeRepairer`]
//! rewrites those declarations from the tables in [`super::schema`] before
//! handing the text to the strict parser.

use super::parser::{parse_strict, split_attribute_name};
use super::schema::{TYPE_ALIASES, enumeration, nominal_domain_for};
use super::{ArffError, ParsedDataset};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use tracing::debug;

static ATTRIBUTE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*@attribute\s+(.+)$").expect("Invalid regex: attribute line"));

/// Rewrites attribute declarations using the NSL-KDD repair tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeRepairer;

impl AttributeRepairer {
    pub fn new() -> Self {
        Self
    }

    /// Repair a single line. Non-attribute lines are returned unchanged.
    pub fn repair_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let Some(captures) = ATTRIBUTE_LINE.captures(line) else {
            return Cow::Borrowed(line);
        };
        let Some((name, declared)) = split_attribute_name(&captures[1]) else {
            return Cow::Borrowed(line);
        };

        let canonical = match nominal_domain_for(&name) {
            Some(values) => enumeration(values),
            None => match alias_for(declared) {
                Some(keyword) => keyword.to_string(),
                None => return Cow::Borrowed(line),
            },
        };

        if canonical == declared {
            return Cow::Borrowed(line);
        }

        debug!(attribute = %name, from = %declared, to = %canonical, "Repaired attribute declaration");
        Cow::Owned(format!("@ATTRIBUTE {} {}", quote_name(&name), canonical))
    }

    /// Drop blank lines and repair every attribute declaration.
    pub fn repair(&self, text: &str) -> String {
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| self.repair_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Repair attribute declarations, then parse strictly.
pub fn parse_permissive(text: &str) -> Result<ParsedDataset, ArffError> {
    let repaired = AttributeRepairer::new().repair(text);
    parse_strict(&repaired)
}

fn alias_for(declared: &str) -> Option<&'static str> {
    let lower = declared.trim().to_ascii_lowercase();
    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, keyword)| *keyword)
}

fn quote_name(name: &str) -> Cow<'_, str> {
    if name.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"' || c == '{') {
        Cow::Owned(format!("'{}'", name.replace('\'', "\\'")))
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_aliases_are_rewritten() {
        let repairer = AttributeRepairer::new();
        assert_eq!(
            repairer.repair_line("@attribute note string"),
            "@ATTRIBUTE note STRING"
        );
        assert_eq!(
            repairer.repair_line("@attribute duration real"),
            "@ATTRIBUTE duration NUMERIC"
        );
        assert_eq!(
            repairer.repair_line("@ATTRIBUTE 'src bytes' integer"),
            "@ATTRIBUTE 'src bytes' NUMERIC"
        );
    }

    #[test]
    fn test_numeric_keyword_in_any_case() {
        let repairer = AttributeRepairer::new();
        assert_eq!(
            repairer.repair_line("@attribute duration numeric"),
            "@ATTRIBUTE duration NUMERIC"
        );
        assert_eq!(
            repairer.repair_line("@attribute duration Numeric"),
            "@ATTRIBUTE duration NUMERIC"
        );
        assert_eq!(
            repairer.repair_line("@attribute note String"),
            "@ATTRIBUTE note STRING"
        );
    }

    #[test]
    fn test_known_columns_get_canonical_enumeration() {
        let repairer = AttributeRepairer::new();
        assert_eq!(
            repairer.repair_line("@attribute protocol_type string"),
            "@ATTRIBUTE protocol_type {tcp,udp,icmp}"
        );
        // Declared enumerations are replaced as well.
        assert_eq!(
            repairer.repair_line("@attribute 'land' {'0'}"),
            "@ATTRIBUTE land {0,1}"
        );
    }

    #[test]
    fn test_other_lines_untouched() {
        let repairer = AttributeRepairer::new();
        assert!(matches!(repairer.repair_line("0,tcp,SF"), Cow::Borrowed(_)));
        assert!(matches!(
            repairer.repair_line("@ATTRIBUTE duration NUMERIC"),
            Cow::Borrowed(_)
        ));
        assert!(matches!(
            repairer.repair_line("@ATTRIBUTE protocol_type {tcp,udp,icmp}"),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_repair_drops_blank_lines() {
        let repaired = AttributeRepairer::new().repair("@relation r\n\n   \n@data\n");
        assert_eq!(repaired, "@relation r\n@data");
    }

    #[test]
    fn test_parse_permissive_recovers_lowercase_types() {
        let text = "@relation r\n@attribute duration real\n@attribute protocol_type string\n\
                    @data\n0,tcp\n2,udp\n";
        assert!(parse_strict(text).is_err());

        let parsed = parse_permissive(text).unwrap();
        assert_eq!(parsed.frame.shape(), (2, 2));
        assert_eq!(
            parsed.frame.column("duration").unwrap().dtype(),
            &DataType::Float64
        );
        assert_eq!(
            parsed.attributes[1].kind.to_string(),
            "{tcp,udp,icmp}".to_string()
        );
    }
}
