//! External tool lookup.

use std::path::PathBuf;

/// Resolves `program` through `PATH`.
///
/// Falls back to the name as given, so a missing tool surfaces as a launch
/// error naming the program rather than a lookup error here.
pub fn resolve_program(program: &str) -> PathBuf {
    match which::which(program) {
        Ok(path) => {
            log::debug!("Found {} at: {}", program, path.display());
            path
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}. Launching as given.", program, e);
            PathBuf::from(program)
        }
    }
}

/// Short display name of a program (file name without directories).
pub fn short_name(program: &str) -> &str {
    program
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_drop_directories() {
        assert_eq!(short_name("/home/ubuntu/apps/AppImageKit/AppImageAssistant"), "AppImageAssistant");
        assert_eq!(short_name("C:\\tools\\kSignCMD.exe"), "kSignCMD.exe");
        assert_eq!(short_name("mktorrent"), "mktorrent");
    }
}
