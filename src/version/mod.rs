
use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::config::Opts;
use crate::error::{Error, Result};
use crate::ffi::Native;

/// Library version, packed as `major.minor.revision.increment` with one byte
/// per field, most significant first.
///
/// The packed form is exactly what `PAPI_library_init` accepts and returns,
/// so ordering versions is ordering their packed values.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version(u32);

impl Version {
    pub const fn new(major: u8, minor: u8, revision: u8, increment: u8) -> Self {
        Self(
            (major as u32) << 24 | (minor as u32) << 16 | (revision as u32) << 8 | increment as u32,
        )
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u32 {
        self.0
    }

    pub const fn major(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn minor(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn revision(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn increment(&self) -> u8 {
        self.0 as u8
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major(),
            self.minor(),
            self.revision(),
            self.increment()
        )
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({})", self)
    }
}

macro_rules! v {
    ($major:expr, $minor:expr) => {
        $crate::version::Version::new($major, $minor, 0, 0)
    };
    ($major:expr, $minor:expr, $revision:expr) => {
        $crate::version::Version::new($major, $minor, $revision, 0)
    };
}
pub(crate) use v;

/// Every candidate tuple, newest first.
///
/// Old releases have no way to ask for the installed version, the only thing
/// `PAPI_library_init` does is to echo the requested version back when it
/// matches the one it was built as. Each field stays in `0..=9`, which covers
/// every release ever published.
pub(crate) fn candidates(newest_major: u8, oldest_major: u8) -> impl Iterator<Item = Version> {
    (oldest_major..=newest_major).rev().flat_map(|major| {
        (0..=9u8).rev().flat_map(move |minor| {
            (0..=9u8).rev().flat_map(move |revision| {
                (0..=9u8)
                    .rev()
                    .map(move |increment| Version::new(major, minor, revision, increment))
            })
        })
    })
}

/// Finds the installed library version by trial initialization.
///
/// The first candidate that the library echoes back verbatim wins.
pub fn resolve(native: &dyn Native, opts: &Opts) -> Result<Version> {
    for version in candidates(opts.newest_major, opts.oldest_major) {
        let requested = version.raw() as i32;
        if native.library_init(requested) == requested {
            log::debug!("negotiated libpapi {}", version);
            return Ok(version);
        }
    }
    Err(Error::VersionNotFound)
}

/// Negotiates through `cache`, holding its lock for the whole search.
///
/// A cached version costs a single `PAPI_library_init` call. When the library
/// refuses it (a different library was loaded since), the search runs again
/// and the cache is replaced.
pub(crate) fn negotiate(
    native: &dyn Native,
    opts: &Opts,
    cache: &Mutex<Option<Version>>,
) -> Result<Version> {
    let mut cached = cache.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(version) = *cached {
        let requested = version.raw() as i32;
        if native.library_init(requested) == requested {
            return Ok(version);
        }
        log::debug!("cached libpapi {} refused, searching again", version);
    }
    let version = resolve(native, opts)?;
    *cached = Some(version);
    Ok(version)
}
