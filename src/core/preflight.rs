//! Safety checks that run before any remote side effect.

use std::env;
use std::path::Path;

use crate::error::{Error, Result};

/// Invoking user, as the login environment reports it.
pub fn current_user() -> String {
    env::var("USER")
        .or_else(|_| env::var("LOGNAME"))
        .unwrap_or_default()
}

/// Promotions only run as the designated operator account.
pub fn check_operator(expected: &str, actual: &str) -> Result<()> {
    if actual == expected {
        return Ok(());
    }
    Err(Error::permission_denied(expected, actual))
}

/// Refuse to run from inside the tree that is about to be rewritten.
/// Rsync deleting the directory under the running process is not a
/// failure mode worth debugging twice.
pub fn ensure_outside_tree(cwd: &Path, code_root: &Path) -> Result<()> {
    if cwd.starts_with(code_root) {
        return Err(Error::unsafe_working_dir(
            cwd.display().to_string(),
            code_root.display().to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::path::PathBuf;

    #[test]
    fn operator_match_passes() {
        assert!(check_operator("deploy", "deploy").is_ok());
    }

    #[test]
    fn operator_mismatch_is_denied() {
        let err = check_operator("deploy", "alice").unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(err.details["expected"], "deploy");
        assert_eq!(err.details["actual"], "alice");
    }

    #[test]
    fn cwd_inside_tree_is_unsafe() {
        let root = PathBuf::from("/var/www/test1/web");
        let cwd = PathBuf::from("/var/www/test1/web/modules");
        let err = ensure_outside_tree(&cwd, &root).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsafeWorkingDir);
    }

    #[test]
    fn tree_root_itself_is_unsafe() {
        let root = PathBuf::from("/var/www/test1/web");
        assert!(ensure_outside_tree(&root, &root).is_err());
    }

    #[test]
    fn sibling_path_is_fine() {
        let root = PathBuf::from("/var/www/test1/web");
        let cwd = PathBuf::from("/home/deploy");
        assert!(ensure_outside_tree(&cwd, &root).is_ok());
    }

    #[test]
    fn similar_prefix_is_not_inside() {
        let root = PathBuf::from("/var/www/test1/web");
        let cwd = PathBuf::from("/var/www/test1/webfiles");
        assert!(ensure_outside_tree(&cwd, &root).is_ok());
    }
}
