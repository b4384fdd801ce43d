//! CPU architecture of the produced installer.

/// CPU architecture for the frozen build and its installer.
///
/// Only the Windows build distinguishes 32-bit output; Linux and macOS
/// installers are always 64-bit.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    X86_64,
    /// x86 / i686 (32-bit)
    X86,
}

impl Arch {
    /// Maps the 32-bit CLI flag to an architecture.
    pub fn from_32bit_flag(is_32bit: bool) -> Self {
        if is_32bit { Arch::X86 } else { Arch::X86_64 }
    }

    /// Architecture part of artifact names (`x86_64` or `x86`).
    pub fn suffix(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::X86 => "x86",
        }
    }

    /// MSYS2 prefix holding the matching toolchain (`mingw64` or `mingw32`).
    pub fn mingw_prefix(self) -> &'static str {
        match self {
            Arch::X86_64 => "mingw64",
            Arch::X86 => "mingw32",
        }
    }

    /// Marker passed to the installer compiler and appended to the signing
    /// key name: `x64` for 64-bit builds, empty otherwise.
    pub fn only_64_bit_marker(self) -> &'static str {
        match self {
            Arch::X86_64 => "x64",
            Arch::X86 => "",
        }
    }
}
