//! Product metadata stamped into installers and peer files.

use serde::Deserialize;

/// Product metadata.
///
/// Used by the Windows version stamp, the code-signing description and the
/// peer-distribution comment.
///
/// # Examples
///
/// ```no_run
/// use build_server::settings::ProductSettings;
///
/// let product = ProductSettings {
///     product_name: "MyApp".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProductSettings {
    /// Product name displayed to users.
    pub product_name: String,

    /// Prefix of every build name, e.g. `OpenShot` in `OpenShot-v3.1.1-x86_64.dmg`.
    pub artifact_prefix: String,

    /// Publisher written into the executable's version resource.
    pub company_name: String,

    /// Copyright line written into the executable's version resource.
    pub copyright: String,

    /// Homepage passed to the signing tool.
    pub homepage: String,

    /// File name of the frozen launcher executable (Windows).
    pub launcher_exe: String,
}

impl Default for ProductSettings {
    fn default() -> Self {
        Self {
            product_name: "OpenShot Video Editor".into(),
            artifact_prefix: "OpenShot".into(),
            company_name: "OpenShot Studios, LLC".into(),
            copyright: "Copyright (c) 2008-2024 OpenShot Studios, LLC".into(),
            homepage: "http://www.openshot.org".into(),
            launcher_exe: "openshot-qt.exe".into(),
        }
    }
}
