use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// One entry of the token list: which contract to refresh and the logo shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    pub address: String,
    pub logo_url: String,
}

impl TokenConfig {
    pub fn new(address: impl Into<String>, logo_url: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            logo_url: logo_url.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read token configuration {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("token configuration is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("token configuration must be a list of {{address, logoUrl}} entries")]
    NotASequence,

    #[error("token configuration entry {index} is invalid: {reason}")]
    InvalidEntry { index: usize, reason: String },

    #[error("token configuration is empty")]
    Empty,
}

pub fn load_token_configs(path: impl AsRef<Path>) -> Result<Vec<TokenConfig>, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_token_configs(&contents)
}

/// Parses the YAML list by hand so that a wrong shape is reported per entry
/// instead of as a generic deserialization error.
pub fn parse_token_configs(yaml: &str) -> Result<Vec<TokenConfig>, ConfigError> {
    let document: Value = serde_yaml::from_str(yaml)?;

    let entries = match document {
        Value::Null => return Err(ConfigError::Empty),
        Value::Sequence(entries) => entries,
        _ => return Err(ConfigError::NotASequence),
    };

    let configs = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    validate_token_configs(&configs)?;
    Ok(configs)
}

fn parse_entry(index: usize, entry: &Value) -> Result<TokenConfig, ConfigError> {
    if !entry.is_mapping() {
        return Err(ConfigError::InvalidEntry {
            index,
            reason: "expected a mapping".to_string(),
        });
    }

    let field = |name: &str| -> Result<String, ConfigError> {
        match entry.get(name) {
            Some(Value::String(value)) => Ok(value.clone()),
            Some(_) => Err(ConfigError::InvalidEntry {
                index,
                reason: format!("`{name}` must be a string"),
            }),
            None => Err(ConfigError::InvalidEntry {
                index,
                reason: format!("missing `{name}`"),
            }),
        }
    };

    Ok(TokenConfig {
        address: field("address")?,
        logo_url: field("logoUrl")?,
    })
}

pub fn validate_token_configs(configs: &[TokenConfig]) -> Result<(), ConfigError> {
    if configs.is_empty() {
        return Err(ConfigError::Empty);
    }

    let mut seen = HashSet::with_capacity(configs.len());
    for (index, config) in configs.iter().enumerate() {
        let address = config.address.trim();
        if address.is_empty() {
            return Err(ConfigError::InvalidEntry {
                index,
                reason: "`address` must not be empty".to_string(),
            });
        }
        // addresses differing only in case name the same contract
        if !seen.insert(address.to_ascii_lowercase()) {
            return Err(ConfigError::InvalidEntry {
                index,
                reason: format!("duplicate address {address}"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_list() {
        let yaml = r#"
- address: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
  logoUrl: "https://example.com/weth.png"
- address: "0x6B175474E89094C44Da98b954EedeAC495271d0F"
  logoUrl: ""
"#;
        let configs = parse_token_configs(yaml).unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(
            configs[0],
            TokenConfig::new(
                "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
                "https://example.com/weth.png"
            )
        );
        assert_eq!(configs[1].logo_url, "");
    }

    #[test]
    fn rejects_empty_documents_and_lists() {
        assert!(matches!(parse_token_configs(""), Err(ConfigError::Empty)));
        assert!(matches!(parse_token_configs("[]"), Err(ConfigError::Empty)));
    }

    #[test]
    fn rejects_non_sequence_document() {
        let yaml = "address: 0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2\nlogoUrl: x";
        assert!(matches!(
            parse_token_configs(yaml),
            Err(ConfigError::NotASequence)
        ));
    }

    #[test]
    fn reports_offending_entry() {
        let yaml = r#"
- address: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
  logoUrl: "a"
- address: "0x6B175474E89094C44Da98b954EedeAC495271d0F"
"#;
        match parse_token_configs(yaml) {
            Err(ConfigError::InvalidEntry { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("logoUrl"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_string_and_blank_addresses() {
        let numeric = "- address: 42\n  logoUrl: a\n";
        assert!(matches!(
            parse_token_configs(numeric),
            Err(ConfigError::InvalidEntry { index: 0, .. })
        ));

        let blank = "- address: \"  \"\n  logoUrl: a\n";
        assert!(matches!(
            parse_token_configs(blank),
            Err(ConfigError::InvalidEntry { index: 0, .. })
        ));

        let scalar = "- just-a-string\n";
        assert!(matches!(
            parse_token_configs(scalar),
            Err(ConfigError::InvalidEntry { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_addresses_repeated_in_another_case() {
        let configs = vec![
            TokenConfig::new("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", "a"),
            TokenConfig::new("0x6B175474E89094C44Da98b954EedeAC495271d0F", "b"),
            TokenConfig::new("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", "c"),
        ];
        match validate_token_configs(&configs) {
            Err(ConfigError::InvalidEntry { index, reason }) => {
                assert_eq!(index, 2);
                assert!(reason.contains("duplicate"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_token_configs("does/not/exist/tokens.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
