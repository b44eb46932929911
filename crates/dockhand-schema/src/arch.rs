/// CPU architecture of the target host, in Debian naming.
///
/// Docker publishes packages per architecture, and the apt source line
/// carries the architecture explicitly, so the prober must classify the
/// kernel's machine string into one of these buckets. Anything it does not
/// recognize becomes [`Architecture::Unknown`]; planning refuses to touch
/// such a host.
///
/// # Example
///
/// ```
/// use dockhand_schema::Architecture;
///
/// assert_eq!(Architecture::from_machine("x86_64"), Architecture::Amd64);
/// assert_eq!(Architecture::from_machine("mips"), Architecture::Unknown);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// 64-bit x86 (`x86_64`).
    Amd64,
    /// 64-bit ARM (`aarch64`).
    Arm64,
    /// 32-bit ARM with hardware float (`armv7l`).
    Armhf,
    /// 32-bit ARM, soft float (`armv6l`, older Raspberry Pi boards).
    Armel,
    /// Anything else. Never installed to.
    #[default]
    Unknown,
}

impl Architecture {
    /// Classify a kernel machine string (`uname -m`) or a Debian arch name.
    pub fn from_machine(machine: &str) -> Self {
        match machine.trim().to_lowercase().as_str() {
            "x86_64" | "amd64" => Self::Amd64,
            "aarch64" | "arm64" | "aarch64_be" => Self::Arm64,
            "armv7l" | "armv7" | "armhf" => Self::Armhf,
            "armv6l" | "armel" => Self::Armel,
            _ => Self::Unknown,
        }
    }

    /// Debian architecture name, as used in apt source lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::Armhf => "armhf",
            Self::Armel => "armel",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `true` unless the architecture is [`Architecture::Unknown`].
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_aliases() {
        assert_eq!(Architecture::from_machine("x86_64"), Architecture::Amd64);
        assert_eq!(Architecture::from_machine("aarch64"), Architecture::Arm64);
        assert_eq!(Architecture::from_machine("armv7l"), Architecture::Armhf);
        assert_eq!(Architecture::from_machine("armv6l"), Architecture::Armel);
        assert_eq!(Architecture::from_machine("AMD64\n"), Architecture::Amd64);
    }

    #[test]
    fn test_unrecognized_machine_is_unknown() {
        for machine in ["mips", "riscv64", "i686", ""] {
            assert_eq!(Architecture::from_machine(machine), Architecture::Unknown);
        }
        assert!(!Architecture::Unknown.is_known());
    }
}
