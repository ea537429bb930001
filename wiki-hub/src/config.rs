//! Runtime configuration read from the environment.

use crate::api::CookiePolicy;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use wiki_hub_core::relocation::{MoveOptions, StorageLayout};

#[derive(Clone, Debug)]
pub struct Config {
    pub root_dir: PathBuf,
    pub documents_dir: String,
    pub users_file: PathBuf,
    pub allow_insecure_cookies: bool,
    pub session_max_age_secs: u64,
    pub remember_me_max_age_secs: u64,
    pub cross_device_copy: bool,
    pub bind: String,
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow!("{key}: expected a boolean, got {other:?}")),
    }
}

fn with_root<'a>(
    root: Option<&'a Path>,
    lookup: impl Fn(&str) -> Option<String> + 'a,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |key: &str| match root {
        Some(root) if key == "WIKI_ROOT_DIR" => Some(root.to_string_lossy().into_owned()),
        _ => lookup(key),
    }
}

impl Config {
    /// Read the process environment. A `root` given on the command line
    /// stands in for `WIKI_ROOT_DIR`, so an explicit `WIKI_USERS_FILE`
    /// still wins over the derived `<root>/users.json`.
    pub fn from_env(root: Option<&Path>) -> Result<Self> {
        Self::from_lookup(with_root(root, |key| std::env::var(key).ok()))
    }

    /// Build from an arbitrary key lookup so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let root_dir = PathBuf::from(lookup("WIKI_ROOT_DIR").unwrap_or_else(|| "data".to_string()));
        let users_file = lookup("WIKI_USERS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| root_dir.join("users.json"));
        let flag = |key: &str| -> Result<bool> {
            lookup(key).map_or(Ok(false), |raw| parse_bool(key, &raw))
        };
        let secs = |key: &str, default: u64| -> Result<u64> {
            lookup(key).map_or(Ok(default), |raw| {
                raw.trim()
                    .parse()
                    .with_context(|| format!("{key}: expected seconds, got {raw:?}"))
            })
        };
        Ok(Self {
            documents_dir: lookup("WIKI_DOCUMENTS_DIR").unwrap_or_else(|| "documents".to_string()),
            users_file,
            allow_insecure_cookies: flag("WIKI_ALLOW_INSECURE_COOKIES")?,
            session_max_age_secs: secs("WIKI_SESSION_MAX_AGE_SECS", 24 * 3600)?,
            remember_me_max_age_secs: secs("WIKI_REMEMBER_ME_MAX_AGE_SECS", 30 * 24 * 3600)?,
            cross_device_copy: flag("WIKI_CROSS_DEVICE_COPY")?,
            bind: lookup("WIKI_BIND").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
            root_dir,
        })
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(self.root_dir.clone(), self.documents_dir.clone())
    }

    pub fn move_options(&self) -> MoveOptions {
        MoveOptions {
            cross_device_copy: self.cross_device_copy,
        }
    }

    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy {
            secure: !self.allow_insecure_cookies,
            max_age_secs: self.session_max_age_secs,
            remember_me_max_age_secs: self.remember_me_max_age_secs,
        }
    }
}
