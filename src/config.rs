use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::classify::{DEFAULT_ORACLE_BASE, DEFAULT_ORACLE_MODEL};
use crate::domain::TaxonId;
use crate::ena::DEFAULT_ENA_BASE;
use crate::error::PathogenError;
use crate::rdf::DEFAULT_SKOLEM_AUTHORITY;
use crate::template::DEFAULT_DISEASE_BASE;
use crate::uniprot::DEFAULT_UNIPROT_BASE;

pub const DEFAULT_CONFIG_FILE: &str = "pathogen-rdf.json";
pub const DEFAULT_TEMPLATE: &str = "data/Pathogen_schemav2.json";
pub const DEFAULT_OUTPUT_DIR: &str = "data/output";
pub const DEFAULT_ROW_LIMIT: usize = 10;
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub taxa: Vec<TaxonEntry>,
    #[serde(default)]
    pub row_limit: Option<usize>,
    #[serde(default)]
    pub template: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub skolem_authority: Option<String>,
    #[serde(default)]
    pub disease_base: Option<String>,
    #[serde(default)]
    pub oracle: Option<OracleConfig>,
    #[serde(default)]
    pub ena_base: Option<String>,
    #[serde(default)]
    pub uniprot_base: Option<String>,
}

/// Taxa may be listed as JSON numbers or strings.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TaxonEntry {
    Numeric(u64),
    Text(String),
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOracle {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
}

impl ResolvedOracle {
    /// API key from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub taxa: Vec<TaxonId>,
    pub row_limit: usize,
    pub template: PathBuf,
    pub output_dir: PathBuf,
    pub skolem_authority: String,
    pub disease_base: String,
    pub oracle: ResolvedOracle,
    pub ena_base: String,
    pub uniprot_base: String,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub taxa: Vec<String>,
    pub row_limit: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path` (or `pathogen-rdf.json`) and applies `overrides`.
    ///
    /// Without an explicit path, a missing default file is only an error when
    /// no taxon is given on the command line.
    pub fn resolve(
        path: Option<&str>,
        overrides: Overrides,
    ) -> Result<ResolvedConfig, PathogenError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            if overrides.taxa.is_empty() {
                return Err(PathogenError::MissingConfig);
            }
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| PathogenError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| PathogenError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: Overrides,
    ) -> Result<ResolvedConfig, PathogenError> {
        let taxa = if overrides.taxa.is_empty() {
            config
                .taxa
                .into_iter()
                .map(|entry| match entry {
                    TaxonEntry::Numeric(value) => Ok(TaxonId::from(value)),
                    TaxonEntry::Text(value) => value.parse(),
                })
                .collect::<Result<Vec<_>, PathogenError>>()?
        } else {
            overrides
                .taxa
                .iter()
                .map(|value| value.parse())
                .collect::<Result<Vec<_>, PathogenError>>()?
        };

        let row_limit = overrides
            .row_limit
            .or(config.row_limit)
            .unwrap_or(DEFAULT_ROW_LIMIT);
        if row_limit == 0 {
            return Err(PathogenError::ConfigParse(
                "row_limit must be at least 1".to_string(),
            ));
        }

        let oracle = config.oracle.unwrap_or_default();
        let oracle = ResolvedOracle {
            base_url: oracle
                .base_url
                .unwrap_or_else(|| DEFAULT_ORACLE_BASE.to_string()),
            model: oracle
                .model
                .unwrap_or_else(|| DEFAULT_ORACLE_MODEL.to_string()),
            api_key_env: oracle
                .api_key_env
                .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
        };

        Ok(ResolvedConfig {
            taxa,
            row_limit,
            template: config
                .template
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE)),
            output_dir: overrides
                .output_dir
                .or(config.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            skolem_authority: config
                .skolem_authority
                .unwrap_or_else(|| DEFAULT_SKOLEM_AUTHORITY.to_string()),
            disease_base: config
                .disease_base
                .unwrap_or_else(|| DEFAULT_DISEASE_BASE.to_string()),
            oracle,
            ena_base: config
                .ena_base
                .unwrap_or_else(|| DEFAULT_ENA_BASE.to_string()),
            uniprot_base: config
                .uniprot_base
                .unwrap_or_else(|| DEFAULT_UNIPROT_BASE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_shorthand() {
        let config = Config {
            taxa: vec![
                TaxonEntry::Numeric(10244),
                TaxonEntry::Text(" 2697049 ".to_string()),
            ],
            ..Config::default()
        };

        let resolved = ConfigLoader::resolve_config(config, Overrides::default()).unwrap();
        assert_eq!(resolved.taxa.len(), 2);
        assert_eq!(resolved.taxa[1].as_str(), "2697049");
        assert_eq!(resolved.row_limit, DEFAULT_ROW_LIMIT);
        assert_eq!(resolved.template, PathBuf::from(DEFAULT_TEMPLATE));
        assert_eq!(resolved.oracle.model, DEFAULT_ORACLE_MODEL);
    }

    #[test]
    fn overrides_win() {
        let config = Config {
            taxa: vec![TaxonEntry::Numeric(1)],
            row_limit: Some(5),
            ..Config::default()
        };
        let overrides = Overrides {
            taxa: vec!["10244".to_string()],
            row_limit: Some(2),
            output_dir: Some(PathBuf::from("out")),
        };
        let resolved = ConfigLoader::resolve_config(config, overrides).unwrap();
        assert_eq!(resolved.taxa, vec![TaxonId::from(10244)]);
        assert_eq!(resolved.row_limit, 2);
        assert_eq!(resolved.output_dir, PathBuf::from("out"));
    }
}
