//! Authenticode signing of the installer.

use crate::bundler::tool::{OutcomeInterpreter, ToolCommand, ToolOutcome};
use crate::error::Result;
use crate::session::Session;
use crate::settings::{Arch, ProductSettings, ToolSettings};
use std::fmt;
use std::path::Path;

/// The signing tool prints nothing on success apart from certificate
/// expiry warnings.
const SIGN_OUTCOME: OutcomeInterpreter = OutcomeInterpreter::Silent {
    benign: &["will expire"],
};

/// Signing key file and its password, given on the command line.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    key: String,
    password: String,
}

impl SigningKey {
    /// Creates a signing key.
    pub fn new(key: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            password: password.into(),
        }
    }

    /// Key file for `arch`: 64-bit builds use `<key>x64`.
    pub fn key_file(&self, arch: Arch) -> String {
        format!("{}{}", self.key, arch.only_64_bit_marker())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("key", &self.key)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Signs `installer` in place with `kSignCMD`.
pub async fn sign_installer(
    tools: &ToolSettings,
    product: &ProductSettings,
    key: &SigningKey,
    arch: Arch,
    installer: &Path,
    session: &mut Session,
) -> Result<ToolOutcome> {
    let output = ToolCommand::new(tools.ksign.as_str())
        .args(["/f".to_string(), key.key_file(arch)])
        .args(["/p", key.password.as_str()])
        .args(["/d", product.product_name.as_str()])
        .args(["/du", product.homepage.as_str()])
        .path_arg(installer)
        .run(session)
        .await?;
    Ok(SIGN_OUTCOME.interpret(&output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_file_carries_arch_marker() {
        let key = SigningKey::new("C:\\keys\\openshot", "hunter2");
        assert_eq!(key.key_file(Arch::X86_64), "C:\\keys\\openshotx64");
        assert_eq!(key.key_file(Arch::X86), "C:\\keys\\openshot");
    }

    #[test]
    fn debug_hides_password() {
        let key = SigningKey::new("openshot", "hunter2");
        let debug = format!("{key:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("redacted"));
    }
}
