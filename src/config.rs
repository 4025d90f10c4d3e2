use std::{net::SocketAddr, path::PathBuf};

use anyhow::{bail, Context as _};
use clap::ArgMatches;

use crate::i18n;

/// Paths and site settings shared by `build` and `serve`.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub content_dir: PathBuf,
    pub out_dir: PathBuf,
    pub public_dir: PathBuf,
    pub template_dir: PathBuf,

    pub site_name: String,
    pub site_url: String,
    pub language: String,
}

#[derive(Debug, Clone)]
pub(crate) struct ServeConfig {
    pub listen: SocketAddr,
    pub webhook_secret: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> anyhow::Result<Self> {
        let path = |name: &str| -> PathBuf {
            matches
                .get_one::<PathBuf>(name)
                .cloned()
                .unwrap_or_default()
        };
        let string = |name: &str| -> String {
            matches
                .get_one::<String>(name)
                .cloned()
                .unwrap_or_default()
        };

        let config = Self {
            content_dir: path("content_dir"),
            out_dir: path("out_dir"),
            public_dir: path("public_dir"),
            template_dir: path("template_dir"),
            site_name: string("site_name"),
            site_url: string("site_url").trim_end_matches('/').to_string(),
            language: string("language").to_lowercase(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.content_dir.exists() {
            std::fs::create_dir_all(&self.content_dir)
                .with_context(|| format!("creating {:?}", self.content_dir))?;
        }
        if !self.content_dir.is_dir() {
            bail!("content_dir must be a directory.");
        }
        if self.out_dir.exists() && !self.out_dir.is_dir() {
            bail!("if out_dir exists, it must be directory.");
        }
        if !self.public_dir.is_dir() {
            bail!("public_dir must be a directory.");
        }
        if !self.template_dir.is_dir() {
            bail!("template_dir must be a directory.");
        }
        if i18n::find_language(&self.language).is_none() {
            bail!("unsupported language: {}", self.language);
        }
        Ok(())
    }
}

impl ServeConfig {
    pub fn from_matches(matches: &ArgMatches) -> anyhow::Result<Self> {
        let listen = *matches
            .get_one::<SocketAddr>("listen")
            .context("listen address is required")?;
        let webhook_secret = matches
            .get_one::<String>("webhook_secret")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let Some(webhook_secret) = webhook_secret else {
            bail!("a webhook secret is required (--webhook-secret or WEBHOOK_SECRET).");
        };
        let admin_password = matches
            .get_one::<String>("admin_password")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| webhook_secret.clone());

        Ok(Self {
            listen,
            webhook_secret,
            admin_password,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};

    use super::Config;

    /// A config rooted in `root` that uses the templates shipped with the crate.
    pub(crate) fn config_in(root: &Path) -> Config {
        let public_dir = root.join("public");
        std::fs::create_dir_all(&public_dir).unwrap();
        std::fs::write(public_dir.join("robots.txt"), "User-agent: *\n").unwrap();
        Config {
            content_dir: root.join("content"),
            out_dir: root.join("out"),
            public_dir,
            template_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates"),
            site_name: "Football Feed Club".to_string(),
            site_url: "https://example.test".to_string(),
            language: "en".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_creates_content_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = testing::config_in(dir.path());
        config.validate().unwrap();
        assert!(config.content_dir.is_dir());
    }

    #[test]
    fn validate_rejects_unknown_language() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = testing::config_in(dir.path());
        config.language = "xx".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_file_as_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = testing::config_in(dir.path());
        std::fs::write(&config.out_dir, "not a dir").unwrap();
        assert!(config.validate().is_err());
    }
}
