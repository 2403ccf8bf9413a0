// Server binary resolution
// Explicit override first, PATH second. The override always wins so a
// test run can pin an exact build of the server under test.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Resolve a server executable.
///
/// `override_var` names an environment variable carrying an explicit
/// path (tilde-expanded). When it is unset or empty the PATH is
/// scanned for `name`. Returns `None` when neither yields an
/// executable file.
pub fn resolve_executable(name: &str, override_var: &str) -> Option<PathBuf> {
    if let Ok(value) = std::env::var(override_var) {
        if !value.is_empty() {
            let expanded = shellexpand::tilde(&value).into_owned();
            let path = PathBuf::from(expanded);
            if is_executable(&path) {
                return Some(path);
            }
            warn!(
                var = %override_var,
                path = %path.display(),
                "Configured binary override is not an executable file"
            );
            return None;
        }
    }

    search_path(name)
}

fn search_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.is_file()
        && path
            .metadata()
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn finds_a_standard_binary_on_path() {
        let resolved = resolve_executable("sh", "TESTBED_RESOLVE_TEST_UNSET");
        assert!(resolved.is_some());
        assert!(resolved.unwrap().ends_with("sh"));
    }

    #[test]
    fn a_bad_override_does_not_fall_back() {
        std::env::set_var("TESTBED_RESOLVE_TEST_BAD", "/nonexistent/never-here");
        assert!(resolve_executable("sh", "TESTBED_RESOLVE_TEST_BAD").is_none());
        std::env::remove_var("TESTBED_RESOLVE_TEST_BAD");
    }

    #[test]
    fn a_missing_binary_resolves_to_none() {
        assert!(
            resolve_executable("testbed-no-such-server", "TESTBED_RESOLVE_TEST_UNSET").is_none()
        );
    }
}
