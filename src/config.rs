use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "NOVEL";
pub const DEFAULT_OUTPUT: &str = "book.pdf";
pub const DEFAULT_WKHTMLTOPDF: &str = "wkhtmltopdf";

/// Settings from `NOVEL_*` environment variables; CLI flags are layered on top in `main`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub output: PathBuf,
    pub wkhtmltopdf: PathBuf,
    pub max_pages: Option<u32>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn from_source(env: Environment) -> Result<Self> {
        Config::builder()
            .set_default("output", DEFAULT_OUTPUT)?
            .set_default("wkhtmltopdf", DEFAULT_WKHTMLTOPDF)?
            .add_source(env)
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn apply_overrides(
        mut self,
        output: Option<PathBuf>,
        wkhtmltopdf: Option<PathBuf>,
        max_pages: Option<u32>,
    ) -> Self {
        if let Some(output) = output {
            self.output = output;
        }
        if let Some(wkhtmltopdf) = wkhtmltopdf {
            self.wkhtmltopdf = wkhtmltopdf;
        }
        if max_pages.is_some() {
            self.max_pages = max_pages;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(map))
    }

    #[test]
    fn defaults_without_env() {
        let s = Settings::from_source(env(&[])).unwrap();
        assert_eq!(s.output, PathBuf::from("book.pdf"));
        assert_eq!(s.wkhtmltopdf, PathBuf::from("wkhtmltopdf"));
        assert_eq!(s.max_pages, None);
    }

    #[test]
    fn env_values_are_read() {
        let s = Settings::from_source(env(&[
            ("NOVEL_OUTPUT", "story.html"),
            ("NOVEL_WKHTMLTOPDF", "/opt/wk/bin/wkhtmltopdf"),
            ("NOVEL_MAX_PAGES", "40"),
        ]))
        .unwrap();
        assert_eq!(s.output, PathBuf::from("story.html"));
        assert_eq!(s.wkhtmltopdf, PathBuf::from("/opt/wk/bin/wkhtmltopdf"));
        assert_eq!(s.max_pages, Some(40));
    }

    #[test]
    fn bad_page_limit_is_rejected() {
        assert!(Settings::from_source(env(&[("NOVEL_MAX_PAGES", "lots")])).is_err());
    }

    #[test]
    fn cli_overrides_env() {
        let s = Settings::from_source(env(&[("NOVEL_OUTPUT", "env.pdf"), ("NOVEL_MAX_PAGES", "5")]))
            .unwrap()
            .apply_overrides(Some("cli.txt".into()), None, None);
        assert_eq!(s.output, PathBuf::from("cli.txt"));
        assert_eq!(s.wkhtmltopdf, PathBuf::from("wkhtmltopdf"));
        assert_eq!(s.max_pages, Some(5));
    }
}
