use std::ffi::OsStr;

/// Directory names starting with this prefix are never descended into.
pub const HIDDEN_PREFIX: &str = ".";

/// Interpreter used for build step command lines.
pub const BUILD_SHELL: &str = "/bin/sh";

/// True when a directory entry name marks it as hidden.
///
/// Only the final path component is checked; callers pass entry names, not
/// full paths, so a watch root nested under a hidden directory still counts.
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with(HIDDEN_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_prefixed_names_are_hidden() {
        for name in [".git", ".idea", ".", "..", ".env.d"] {
            assert!(is_hidden(OsStr::new(name)), "{name} should be hidden");
        }
    }

    #[test]
    fn plain_names_are_visible() {
        for name in ["src", "target", "a.b", "node_modules", "dir."] {
            assert!(!is_hidden(OsStr::new(name)), "{name} should be visible");
        }
    }

    #[test]
    fn empty_name_is_visible() {
        assert!(!is_hidden(OsStr::new("")));
    }
}
