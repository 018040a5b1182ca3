//! Platform detection and release-asset name matching
//!
//! Provider binaries are published per `(os, arch)` with names following
//! either the hyphenated (`darwin-arm64`) or underscored (`darwin_arm64`)
//! convention, with or without an executable suffix. Detection uses
//! compile-time `cfg!` checks.

/// Operating system component of a provider identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Darwin,
    Windows,
}

impl Os {
    /// Detect the current operating system
    #[inline]
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::Darwin
        } else {
            Os::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Windows => "windows",
        }
    }

    /// Executable suffix for this OS (`.exe` on Windows)
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Os::Windows => ".exe",
            _ => "",
        }
    }
}

/// CPU architecture component of a provider identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Amd64,
    Arm64,
    X86,
}

impl Arch {
    /// Detect the current architecture
    #[inline]
    pub fn current() -> Self {
        if cfg!(target_arch = "aarch64") {
            Arch::Arm64
        } else if cfg!(target_arch = "x86") {
            Arch::X86
        } else {
            Arch::Amd64
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::X86 => "386",
        }
    }

    /// Alternate spellings seen in release asset names
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Arch::Amd64 => &["amd64", "x86_64", "x64"],
            Arch::Arm64 => &["arm64", "aarch64"],
            Arch::X86 => &["386", "i386", "x86"],
        }
    }
}

/// The `(os, arch)` tuple assets are published for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    pub fn current() -> Self {
        Self {
            os: Os::current(),
            arch: Arch::current(),
        }
    }

    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// `linux-amd64` style directory name under the cache root
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.os.as_str(), self.arch.as_str())
    }

    /// Does a release asset name target this platform?
    ///
    /// Accepts `os-arch` and `os_arch` spellings anywhere in the name, with
    /// or without a trailing `.exe`, and the common architecture aliases
    /// (`x86_64` for amd64, `aarch64` for arm64).
    pub fn matches_asset(&self, asset_name: &str) -> bool {
        let lowered = asset_name.to_ascii_lowercase();
        let name = lowered.strip_suffix(".exe").unwrap_or(&lowered);
        let os = self.os.as_str();
        self.arch.aliases().iter().any(|arch| {
            contains_token(name, &format!("{os}-{arch}"))
                || contains_token(name, &format!("{os}_{arch}"))
        })
    }
}

/// Substring match that refuses to match a token inside a wider
/// architecture word, so `x86` does not match `x86_64` or `x86-64`.
fn contains_token(name: &str, token: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = name[start..].find(token) {
        let end = start + pos + token.len();
        let rest = &name[end..];
        let boundary = match rest.as_bytes().first() {
            None => true,
            Some(b) if b.is_ascii_alphanumeric() => false,
            _ => !(rest.starts_with("_64") || rest.starts_with("-64")),
        };
        if boundary {
            return true;
        }
        start += pos + 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_hyphen_and_underscore_spellings() {
        let p = Platform::new(Os::Darwin, Arch::Arm64);
        assert!(p.matches_asset("provider-darwin-arm64"));
        assert!(p.matches_asset("provider_darwin_arm64"));
        assert!(p.matches_asset("prov-0.1.0-darwin-aarch64"));
        assert!(!p.matches_asset("provider-linux-arm64"));
        assert!(!p.matches_asset("provider-darwin-amd64"));
    }

    #[test]
    fn matches_with_exe_suffix() {
        let p = Platform::new(Os::Windows, Arch::Amd64);
        assert!(p.matches_asset("provider-windows-amd64.exe"));
        assert!(p.matches_asset("provider_windows_x86_64.exe"));
        assert!(p.matches_asset("provider-windows-amd64"));
    }

    #[test]
    fn case_insensitive() {
        let p = Platform::new(Os::Linux, Arch::Amd64);
        assert!(p.matches_asset("Provider-Linux-AMD64"));
    }

    #[test]
    fn x86_does_not_match_inside_x86_64() {
        let p = Platform::new(Os::Windows, Arch::X86);
        assert!(!p.matches_asset("provider_windows_x86_64.exe"));
        assert!(p.matches_asset("provider_windows_x86.exe"));
        assert!(p.matches_asset("provider-windows-386"));
    }

    #[test]
    fn dir_name_is_os_dash_arch() {
        assert_eq!(Platform::new(Os::Linux, Arch::Amd64).dir_name(), "linux-amd64");
        assert_eq!(Platform::new(Os::Windows, Arch::X86).dir_name(), "windows-386");
    }
}
