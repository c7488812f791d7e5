use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[error("unable to resolve home directory")]
pub struct HomeDirError;

/// Expands a leading `~/` against the user's home directory. Other paths are
/// returned unchanged.
pub fn expand_home(path: &str) -> Result<PathBuf, HomeDirError> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().ok_or(HomeDirError)?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_are_untouched() {
        assert_eq!(
            expand_home("/etc/antenna-switch.json").unwrap(),
            PathBuf::from("/etc/antenna-switch.json")
        );
        assert_eq!(expand_home("ticcmd").unwrap(), PathBuf::from("ticcmd"));
        assert_eq!(expand_home("a/~/b").unwrap(), PathBuf::from("a/~/b"));
    }

    #[test]
    fn tilde_prefix_uses_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };

        assert_eq!(
            expand_home("~/.antenna-switch.json").unwrap(),
            home.join(".antenna-switch.json")
        );
    }
}
