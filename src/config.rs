use anyhow::{Result, anyhow};
use serde::Deserialize;

use crate::model::OutputShape;

/// Order in which the numeric parts of a date such as `1/2/2020` are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    MonthDayYear,
    DayMonthYear,
    YearMonthDay,
}

/// Culture used for translation-time date literal checks. Passed in
/// explicitly, never read from the process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CultureContext {
    pub name: String,
    pub date_order: DateOrder,
}

impl Default for CultureContext {
    fn default() -> Self {
        Self {
            name: "en-US".to_string(),
            date_order: DateOrder::MonthDayYear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Host-provided globals (such as `WScript`) that count as declared.
    pub external_references: Vec<String>,
    pub output_shape: OutputShape,
    pub culture: CultureContext,
    /// Indent unit repeated per depth level by the C# writer.
    pub indent: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            external_references: vec!["WScript".to_string()],
            output_shape: OutputShape::FullProgram,
            culture: CultureContext::default(),
            indent: "    ".to_string(),
        }
    }
}

impl TranslatorConfig {
    pub fn is_external_reference(&self, name: &str) -> bool {
        self.external_references
            .iter()
            .any(|r| r.eq_ignore_ascii_case(name))
    }
}

/// Parse a JSON config file; absent fields take their defaults.
///
/// ```json
/// { "external_references": ["WScript", "Response"], "output_shape": "body_only" }
/// ```
pub fn load_from_json(json: &str) -> Result<TranslatorConfig> {
    let config: TranslatorConfig =
        serde_json::from_str(json).map_err(|e| anyhow!("Failed to parse config JSON: {}", e))?;

    let mut seen: Vec<String> = Vec::new();
    for (i, name) in config.external_references.iter().enumerate() {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("external reference {} is empty", i));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(anyhow!("external reference `{name}` is not a valid name"));
        }
        let lower = trimmed.to_ascii_lowercase();
        if seen.contains(&lower) {
            return Err(anyhow!("external reference `{name}` is listed twice"));
        }
        seen.push(lower);
    }
    if config.indent.chars().any(|c| !matches!(c, ' ' | '\t')) {
        return Err(anyhow!("indent may only contain spaces and tabs"));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = load_from_json(r#"{ "output_shape": "body_only" }"#).unwrap();
        assert_eq!(config.output_shape, OutputShape::BodyOnly);
        assert_eq!(config.external_references, vec!["WScript".to_string()]);
        assert_eq!(config.culture.date_order, DateOrder::MonthDayYear);
        assert_eq!(config.indent, "    ");
    }

    #[test]
    fn test_invalid_configs() {
        let test_cases = vec![
            r#"{ "external_references": [""] }"#,
            r#"{ "external_references": ["WScript", "wscript"] }"#,
            r#"{ "external_references": ["Bad Name"] }"#,
            r#"{ "indent": "--" }"#,
            r#"{ "output_shape": "sideways" }"#,
            "not json",
        ];
        for json in test_cases {
            assert!(load_from_json(json).is_err(), "{json}");
        }
    }

    #[test]
    fn test_culture_section() {
        let json = r#"{ "culture": { "name": "en-GB", "date_order": "day_month_year" } }"#;
        let config = load_from_json(json).unwrap();
        assert_eq!(config.culture.name, "en-GB");
        assert_eq!(config.culture.date_order, DateOrder::DayMonthYear);
        assert!(config.is_external_reference("wscript"));
    }
}
