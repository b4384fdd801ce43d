//! Command line argument parsing and validation.
//!
//! The build server is driven by CI with a short positional list:
//!
//! ```text
//! build-server [CHAT_TOKEN] [SIGNING_KEY SIGNING_PASSWORD] [HOSTING_USER HOSTING_PASSWORD] [IS_32BIT] [BRANCH]
//! ```
//!
//! Credential pairs must be given both or neither. Empty strings count as
//! absent so CI can pass unset variables positionally. There are no flags,
//! so values starting with `-` are taken as given.

use crate::bundler::SigningKey;
use crate::context::DEFAULT_BRANCH;
use crate::error::{CliError, Result};
use crate::settings::Arch;
use clap::Parser;
use std::ffi::OsString;

/// Packages, publishes and announces one platform's installer.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "build-server",
    about = "Packages, publishes and announces one platform's installer",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Args {
    /// Chat service API token for build notifications
    #[arg(value_name = "CHAT_TOKEN", allow_hyphen_values = true)]
    pub chat_token: Option<String>,

    /// Signing key file (Windows); `x64` is appended for 64-bit builds
    #[arg(value_name = "SIGNING_KEY", allow_hyphen_values = true)]
    pub signing_key: Option<String>,

    /// Password of the signing key
    #[arg(value_name = "SIGNING_PASSWORD", allow_hyphen_values = true)]
    pub signing_password: Option<String>,

    /// Code hosting user
    #[arg(value_name = "HOSTING_USER", allow_hyphen_values = true)]
    pub hosting_user: Option<String>,

    /// Code hosting password or token
    #[arg(value_name = "HOSTING_PASSWORD", allow_hyphen_values = true)]
    pub hosting_password: Option<String>,

    /// `True` to build the 32-bit Windows installer
    #[arg(value_name = "IS_32BIT", allow_hyphen_values = true)]
    pub windows_32bit: Option<String>,

    /// Branch being built
    #[arg(value_name = "BRANCH", default_value = DEFAULT_BRANCH, allow_hyphen_values = true)]
    pub branch: String,
}

impl Args {
    /// Parses arguments, mapping clap's errors into [`CliError`].
    pub fn try_parse_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|e| {
            CliError::InvalidArguments {
                reason: e.to_string().trim().to_string(),
            }
            .into()
        })
    }

    /// Checks that credential pairs are complete.
    pub fn validate(&self) -> Result<()> {
        check_pair(
            &self.signing_key,
            &self.signing_password,
            "SIGNING_KEY",
            "SIGNING_PASSWORD",
        )?;
        check_pair(
            &self.hosting_user,
            &self.hosting_password,
            "HOSTING_USER",
            "HOSTING_PASSWORD",
        )?;
        if self.branch.trim().is_empty() {
            return Err(CliError::InvalidArguments {
                reason: "BRANCH cannot be empty".into(),
            }
            .into());
        }
        Ok(())
    }

    /// Chat token, if given.
    pub fn chat_token(&self) -> Option<&str> {
        present(&self.chat_token)
    }

    /// Signing credentials, if both were given.
    pub fn signing_key(&self) -> Option<SigningKey> {
        Some(SigningKey::new(
            present(&self.signing_key)?,
            present(&self.signing_password)?,
        ))
    }

    /// Hosting user and password, if both were given.
    pub fn hosting_credentials(&self) -> Option<(&str, &str)> {
        Some((present(&self.hosting_user)?, present(&self.hosting_password)?))
    }

    /// Requested installer architecture. Only the literal `True` selects 32-bit.
    pub fn arch(&self) -> Arch {
        Arch::from_32bit_flag(self.windows_32bit.as_deref() == Some("True"))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn check_pair(
    first: &Option<String>,
    second: &Option<String>,
    first_name: &'static str,
    second_name: &'static str,
) -> Result<()> {
    if present(first).is_some() != present(second).is_some() {
        return Err(CliError::IncompletePair {
            first: first_name,
            second: second_name,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_args(std::iter::once("build-server").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_arguments_defaults_to_develop() {
        let args = parse(&[]);
        assert_eq!(args.branch, "develop");
        assert!(args.chat_token().is_none());
        assert!(args.validate().is_ok());
        assert_eq!(args.arch(), Arch::X86_64);
    }

    #[test]
    fn full_argument_list() {
        let args = parse(&["tok", "key", "pw", "bot", "secret", "True", "release-3.2"]);
        assert!(args.validate().is_ok());
        assert_eq!(args.chat_token(), Some("tok"));
        assert_eq!(args.signing_key(), Some(SigningKey::new("key", "pw")));
        assert_eq!(args.hosting_credentials(), Some(("bot", "secret")));
        assert_eq!(args.arch(), Arch::X86);
        assert_eq!(args.branch, "release-3.2");
    }

    #[test]
    fn lone_signing_key_is_rejected() {
        let err = parse(&["tok", "key"]).validate().unwrap_err();
        assert!(err.to_string().contains("both or neither"));
    }

    #[test]
    fn empty_pairs_count_as_absent() {
        let args = parse(&["tok", "", "", "", "", "False", "feature/x"]);
        assert!(args.validate().is_ok());
        assert!(args.signing_key().is_none());
        assert!(args.hosting_credentials().is_none());
        assert_eq!(args.arch(), Arch::X86_64);
    }

    #[test]
    fn secrets_may_start_with_a_hyphen() {
        let args = parse(&["-tok", "key", "-Xs3cr3t", "bot", "--pw"]);
        assert!(args.validate().is_ok());
        assert_eq!(args.chat_token(), Some("-tok"));
        assert_eq!(args.signing_key(), Some(SigningKey::new("key", "-Xs3cr3t")));
        assert_eq!(args.hosting_credentials(), Some(("bot", "--pw")));
        assert_eq!(args.branch, "develop");
    }

    #[test]
    fn too_many_arguments() {
        let result = Args::try_parse_args(["build-server", "1", "2", "3", "4", "5", "6", "7", "8"]);
        assert!(result.is_err());
    }
}
