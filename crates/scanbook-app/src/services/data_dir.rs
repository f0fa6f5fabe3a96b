// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::PathBuf;

use scanbook_core::error::Result;

/// Overrides every other location when set.
pub const DATA_DIR_ENV: &str = "SCANBOOK_DATA_DIR";

/// Return the application data directory, creating it if needed.
pub fn data_dir() -> Result<PathBuf> {
    let dir = resolve(|key| std::env::var(key).ok());
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// `$SCANBOOK_DATA_DIR`, else `$XDG_DATA_HOME/scanbook`, else
/// `$HOME/.local/share/scanbook`, else a directory under the system temp dir.
fn resolve(var: impl Fn(&str) -> Option<String>) -> PathBuf {
    let set = |key: &str| var(key).filter(|value| !value.is_empty());

    if let Some(dir) = set(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = set("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join("scanbook");
    }
    if let Some(home) = set("HOME") {
        return PathBuf::from(home).join(".local").join("share").join("scanbook");
    }
    std::env::temp_dir().join("scanbook")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn explicit_override_wins() {
        let dir = resolve(env(&[
            ("SCANBOOK_DATA_DIR", "/srv/scanbook"),
            ("XDG_DATA_HOME", "/xdg"),
            ("HOME", "/home/reader"),
        ]));
        assert_eq!(dir, PathBuf::from("/srv/scanbook"));
    }

    #[test]
    fn xdg_then_home() {
        assert_eq!(
            resolve(env(&[("XDG_DATA_HOME", "/xdg"), ("HOME", "/home/reader")])),
            PathBuf::from("/xdg/scanbook")
        );
        assert_eq!(
            resolve(env(&[("XDG_DATA_HOME", ""), ("HOME", "/home/reader")])),
            PathBuf::from("/home/reader/.local/share/scanbook")
        );
    }

    #[test]
    fn falls_back_to_temp() {
        assert_eq!(resolve(env(&[])), std::env::temp_dir().join("scanbook"));
    }
}
