use std::borrow::Cow;
use std::path::PathBuf;

/// Options controlling how the library is located, negotiated and probed.
#[derive(Clone, Debug)]
pub struct Opts {
    /// Path or soname handed to the dynamic loader.
    pub library: PathBuf,

    /// First major version tried during negotiation.
    pub newest_major: u8,

    /// Last major version tried during negotiation.
    pub oldest_major: u8,

    /// Scope qualifier appended to event names when
    /// [`probe`][crate::count::EventSet::probe] falls back to named additions.
    pub qualifier: Qualifier,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            library: PathBuf::from("libpapi.so"),
            newest_major: 6,
            oldest_major: 3,
            qualifier: Qualifier::default(),
        }
    }
}

/// Scope qualifier for named event additions.
///
/// Components other than the default CPU one (e.g. `perf_event_uncore`) only
/// accept events that are pinned to a CPU or package, which libpfm4 spells as a
/// `:cpu=N` or `:package=N` suffix. Not every library build understands these,
/// so this is a knob rather than a constant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Qualifier {
    /// No qualified fallback.
    None,

    /// `:cpu=N`
    Cpu(u32),

    /// `:package=N`
    Package(u32),

    /// Verbatim suffix, e.g. `":cpu=0:u=1"`.
    Custom(String),
}

impl Default for Qualifier {
    fn default() -> Self {
        Self::Cpu(1)
    }
}

impl Qualifier {
    pub fn suffix(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::None => None,
            Self::Cpu(n) => Some(format!(":cpu={}", n).into()),
            Self::Package(n) => Some(format!(":package={}", n).into()),
            Self::Custom(s) => Some(Cow::Borrowed(s)),
        }
    }

    /// Appends the qualifier to `name`, or `None` if there is nothing to append.
    pub fn apply(&self, name: &str) -> Option<String> {
        self.suffix().map(|suffix| format!("{}{}", name, suffix))
    }
}
