use std::path::{Component, Path, PathBuf};

const SCRIPT_SUFFIX: &str = ".js";

/// Returns `true` if `name` looks like a script we are willing to run.
///
/// The name must consist of ASCII letters, digits, `.`, `_`, `-` and `/`,
/// end in `.js` with at least one character before it, and must not contain `..` anywhere.
pub fn is_safe_script_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(SCRIPT_SUFFIX) else {
        return false;
    };
    !stem.is_empty()
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
}

/// Join `name` onto `root` and normalize lexically.
///
/// Root and `.` components of `name` are dropped so the result always stays below `root`;
/// `..` never reaches this point because [`is_safe_script_name`] rejects it.
pub fn resolve_script_path(root: &Path, name: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for component in Path::new(name).components() {
        if let Component::Normal(part) = component {
            path.push(part);
        }
    }
    path
}
