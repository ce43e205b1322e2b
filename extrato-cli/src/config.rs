use anyhow::{Context, Result};
use extrato_export::SheetOptions;
use extrato_ingest::ParserOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{ensure_extrato_home, extrato_home};

/// `config.toml`:
///
/// ```toml
/// [parser]
/// extra_noise_markers = ["fale conosco"]
/// two_digit_year_base = 2000
///
/// [[parser.custom_tiers]]
/// name = "debit_flag"
/// pattern = '^(?P<date>\d{2}-\d{2}-\d{4})\s+(?P<desc>.+?)\s+(?P<value>\d+,\d{2})\s+D$'
///
/// [output]
/// format = "xlsx"          # or "csv"
/// delimiter = ";"
/// include_balance = "auto"
/// include_operation_id = "auto"
/// currency_prefix = "R$ "
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parser: ParserOptions,
    pub output: SheetOptions,
}

pub fn config_path() -> Result<PathBuf> {
    Ok(extrato_home()?.join("config.toml"))
}

/// Load `path`, or the default location when `None`. A missing file at the
/// default location means defaults; an explicit path must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = config_path()?;
            if !p.exists() {
                return Ok(Config::default());
            }
            p
        }
    };
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn save_config(cfg: &Config) -> Result<PathBuf> {
    let p = ensure_extrato_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let written = save_config(&Config::default())?;
    println!("Wrote {}", written.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use extrato_export::{ColumnPolicy, SheetFormat};

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = parse_config(
            r#"
[output]
include_balance = "never"
"#,
        )
        .unwrap();
        assert_eq!(cfg.output.include_balance, ColumnPolicy::Never);
        assert_eq!(cfg.output.delimiter, ';');
        assert_eq!(cfg.output.format, SheetFormat::Xlsx);
        assert_eq!(cfg.parser, ParserOptions::default());
    }

    #[test]
    fn test_custom_tiers_and_markers() {
        let cfg = parse_config(
            r#"
[parser]
extra_noise_markers = ["fale conosco"]
two_digit_year_base = 1900

[[parser.custom_tiers]]
name = "debit_flag"
pattern = '^(?P<date>\d{2}-\d{2}-\d{4})\s+(?P<desc>.+?)\s+(?P<value>\d+,\d{2})\s+D$'
"#,
        )
        .unwrap();
        assert_eq!(cfg.parser.extra_noise_markers, vec!["fale conosco"]);
        assert_eq!(cfg.parser.two_digit_year_base, 1900);
        assert_eq!(cfg.parser.custom_tiers.len(), 1);
        assert!(!cfg.parser.custom_tiers[0].needs_date_context);
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(parse_config(&s).unwrap(), Config::default());
    }

    #[test]
    fn test_csv_format() {
        let cfg = parse_config("[output]\nformat = \"csv\"\n").unwrap();
        assert_eq!(cfg.output.format.extension(), "csv");
    }

    #[test]
    fn test_unknown_policy_is_an_error() {
        assert!(parse_config("[output]\ninclude_balance = \"sometimes\"\n").is_err());
    }
}
