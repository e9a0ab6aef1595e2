use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::ResultExt;

/// How the extracted value is printed.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    /// Strings as they are, anything else as compact JSON.
    #[default]
    Raw,
    Json,
    Yaml,
}

serde_plain::derive_fromstr_from_deserialize!(OutputFormat);
serde_plain::derive_display_from_serialize!(OutputFormat);

impl OutputFormat {
    pub(crate) fn render(&self, value: &Value) -> Result<String> {
        match self {
            OutputFormat::Raw => Ok(match value {
                Value::String(s) => s.to_owned(),
                other => other.to_string(),
            }),
            OutputFormat::Json => serde_json::to_string(value).context(error::JsonSerializeSnafu),
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(value).context(error::YamlSerializeSnafu)?;
                // Drop the document marker so a scalar prints on its own line.
                let body = yaml.strip_prefix("---").unwrap_or(&yaml);
                Ok(body
                    .trim_start_matches(|c| c == ' ' || c == '\n')
                    .trim_end()
                    .to_string())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::OutputFormat;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn raw_prints_strings_unquoted() {
        let format = OutputFormat::default();
        assert_eq!(format.render(&json!("queens")).unwrap(), "queens");
        assert_eq!(format.render(&json!(8774)).unwrap(), "8774");
        assert_eq!(
            format.render(&json!({"enabled": true})).unwrap(),
            r#"{"enabled":true}"#
        );
    }

    #[test]
    fn json_quotes_strings() {
        assert_eq!(
            OutputFormat::Json.render(&json!("queens")).unwrap(),
            r#""queens""#
        );
    }

    #[test]
    fn yaml_has_no_document_marker() {
        assert_eq!(
            OutputFormat::Yaml.render(&json!({"port": 8774})).unwrap(),
            "port: 8774"
        );
        assert_eq!(OutputFormat::Yaml.render(&json!("queens")).unwrap(), "queens");
    }

    #[test]
    fn formats_parse_from_lowercase() {
        assert_eq!(OutputFormat::from_str("yaml").unwrap(), OutputFormat::Yaml);
        assert!(OutputFormat::from_str("toml").is_err());
    }
}
