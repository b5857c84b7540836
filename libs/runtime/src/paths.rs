use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Directory created under the user's home when `server.home_dir` is empty.
pub const DEFAULT_HOME_SUBDIR: &str = ".apps-catalog";

/// Resolve the configured home directory into an absolute path.
///
/// - empty: `$HOME/.apps-catalog` (`%APPDATA%/.apps-catalog` on Windows)
/// - `~` or `~/x`: expanded against the user's home
/// - relative paths: joined with the current working directory
///
/// The directory is created when `create` is set.
pub fn resolve_home_dir(raw: &str, create: bool) -> Result<PathBuf> {
    let raw = raw.trim();
    let resolved = if raw.is_empty() {
        platform_base()?.join(DEFAULT_HOME_SUBDIR)
    } else if raw == "~" {
        user_home()?
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        user_home()?.join(rest)
    } else {
        let p = Path::new(raw);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            std::env::current_dir()
                .context("cannot read current directory")?
                .join(p)
        }
    };

    if create {
        std::fs::create_dir_all(&resolved)
            .with_context(|| format!("cannot create home dir '{}'", resolved.display()))?;
    }
    Ok(resolved)
}

fn user_home() -> Result<PathBuf> {
    match dirs::home_dir() {
        Some(h) => Ok(h),
        None => bail!("cannot determine the user's home directory"),
    }
}

#[cfg(windows)]
fn platform_base() -> Result<PathBuf> {
    match dirs::config_dir() {
        Some(d) => Ok(d),
        None => bail!("cannot determine %APPDATA%"),
    }
}

#[cfg(not(windows))]
fn platform_base() -> Result<PathBuf> {
    user_home()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_paths_are_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("a/b");
        let got = resolve_home_dir(target.to_str().unwrap(), true).unwrap();
        assert_eq!(got, target);
        assert!(target.is_dir());
    }

    #[test]
    fn tilde_expands_to_user_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let got = resolve_home_dir("~/.apps-catalog-test", false).unwrap();
        assert_eq!(got, home.join(".apps-catalog-test"));
    }

    #[test]
    fn empty_uses_default_subdir() {
        if dirs::home_dir().is_none() {
            return;
        }
        let got = resolve_home_dir("", false).unwrap();
        assert!(got.ends_with(DEFAULT_HOME_SUBDIR));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let got = resolve_home_dir("some/rel", false).unwrap();
        assert!(got.is_absolute());
        assert!(got.ends_with("some/rel"));
    }
}
