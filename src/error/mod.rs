
use std::ffi::NulError;
use std::fmt;

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::version::{v, Version};

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds reported by the library.
///
/// The numeric code behind each kind depends on the library version,
/// see [`ErrorTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    InvalidArgument,
    OutOfMemory,
    SystemError,
    /// Named `PAPI_ESBSTR` before 5.0.
    SubstrateError,
    /// Named `PAPI_ECMP` since 5.0.
    ComponentError,
    CounterLost,
    InternalBug,
    EventNotFound,
    EventConflict,
    NotRunning,
    AlreadyRunning,
    EventStateError,
    NotAPreset,
    NoCounterHardware,
    MiscError,
    PermissionDenied,
    NotInitialized,
    ComponentNotFound,
    OperationNotSupported,
    NotImplemented,
    BufferError,
    InvalidDomain,
    InvalidAttribute,
    InvalidCount,
    InvalidCombination,
    ComponentDisabled,
    /// A negative code this crate does not know about.
    Unknown(i32),
}

impl ErrorKind {
    /// Symbolic name as spelled in `papi.h`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "PAPI_EINVAL",
            Self::OutOfMemory => "PAPI_ENOMEM",
            Self::SystemError => "PAPI_ESYS",
            Self::SubstrateError => "PAPI_ESBSTR",
            Self::ComponentError => "PAPI_ECMP",
            Self::CounterLost => "PAPI_ECLOST",
            Self::InternalBug => "PAPI_EBUG",
            Self::EventNotFound => "PAPI_ENOEVNT",
            Self::EventConflict => "PAPI_ECNFLCT",
            Self::NotRunning => "PAPI_ENOTRUN",
            Self::AlreadyRunning => "PAPI_EISRUN",
            Self::EventStateError => "PAPI_ENOEVST",
            Self::NotAPreset => "PAPI_ENOTPRESET",
            Self::NoCounterHardware => "PAPI_ENOCNTR",
            Self::MiscError => "PAPI_EMISC",
            Self::PermissionDenied => "PAPI_EPERM",
            Self::NotInitialized => "PAPI_ENOINIT",
            Self::ComponentNotFound => "PAPI_ENOCMP",
            Self::OperationNotSupported => "PAPI_ENOSUPP",
            Self::NotImplemented => "PAPI_ENOIMPL",
            Self::BufferError => "PAPI_EBUF",
            Self::InvalidDomain => "PAPI_EINVAL_DOM",
            Self::InvalidAttribute => "PAPI_EATTR",
            Self::InvalidCount => "PAPI_ECOUNT",
            Self::InvalidCombination => "PAPI_ECOMBO",
            Self::ComponentDisabled => "PAPI_ECMP_DISABLED",
            Self::Unknown(_) => "PAPI_UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "unknown error code {}", code),
            _ => f.write_str(self.name()),
        }
    }
}

struct Row {
    code: i32,
    kind: ErrorKind,
    since: Option<Version>,
    before: Option<Version>,
}

macro_rules! row {
    ($code:literal, $kind:ident) => {
        row!($code, $kind, None, None)
    };
    ($code:literal, $kind:ident, $since:expr, $before:expr) => {
        Row {
            code: $code,
            kind: ErrorKind::$kind,
            since: $since,
            before: $before,
        }
    };
}

// Codes down to -16 are stable. Below that, the 4.x series shuffled codes
// around before settling in 4.1.
#[rustfmt::skip]
const ROWS: [Row; 29] = [
    row!( -1, InvalidArgument),
    row!( -2, OutOfMemory),
    row!( -3, SystemError),
    row!( -4, SubstrateError,        None,                 Some(v!(5, 0))),
    row!( -4, ComponentError,        Some(v!(5, 0)),       None),
    row!( -5, CounterLost),
    row!( -6, InternalBug),
    row!( -7, EventNotFound),
    row!( -8, EventConflict),
    row!( -9, NotRunning),
    row!(-10, AlreadyRunning),
    row!(-11, EventStateError),
    row!(-12, NotAPreset),
    row!(-13, NoCounterHardware),
    row!(-14, MiscError),
    row!(-15, PermissionDenied),
    row!(-16, NotInitialized),
    row!(-17, BufferError,           None,                 Some(v!(4, 1))),
    row!(-17, ComponentNotFound,     Some(v!(4, 1)),       None),
    row!(-18, InvalidDomain,         None,                 Some(v!(4, 1))),
    row!(-18, OperationNotSupported, Some(v!(4, 1)),       None),
    row!(-19, ComponentNotFound,     Some(v!(4, 0)),       Some(v!(4, 1))),
    row!(-19, NotImplemented,        Some(v!(4, 1)),       None),
    row!(-20, BufferError,           Some(v!(4, 1)),       None),
    row!(-21, InvalidDomain,         Some(v!(4, 1)),       None),
    row!(-22, InvalidAttribute,      Some(v!(4, 2)),       None),
    row!(-23, InvalidCount,          Some(v!(4, 2)),       None),
    row!(-24, InvalidCombination,    Some(v!(4, 2)),       None),
    row!(-25, ComponentDisabled,     Some(v!(5, 7)),       None),
];

/// Code-to-kind mapping for one library version.
#[derive(Clone, Debug)]
pub struct ErrorTable {
    entries: ArrayVec<(i32, ErrorKind), { ROWS.len() }>,
}

impl ErrorTable {
    pub fn new(version: Version) -> Self {
        let entries = ROWS
            .iter()
            .filter(|row| row.since.map_or(true, |since| version >= since))
            .filter(|row| row.before.map_or(true, |before| version < before))
            .map(|row| (row.code, row.kind))
            .collect();
        Self { entries }
    }

    /// Entries ordered from `-1` downwards.
    pub fn entries(&self) -> &[(i32, ErrorKind)] {
        &self.entries
    }

    /// Maps a negative status to its kind.
    ///
    /// Callers must filter out non-negative statuses first, those are
    /// successes and have no kind.
    pub fn classify(&self, code: i32) -> ErrorKind {
        debug_assert!(code < 0, "classifying success status {}", code);
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, kind)| *kind)
            .unwrap_or(ErrorKind::Unknown(code))
    }

    pub fn check(&self, status: i32) -> Result<i32> {
        if status >= 0 {
            Ok(status)
        } else {
            Err(Error::Papi {
                kind: self.classify(status),
                code: status,
            })
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} ({code})")]
    Papi { kind: ErrorKind, code: i32 },
    #[error("no supported libpapi version found")]
    VersionNotFound,
    #[error("failed to load libpapi: {0}")]
    Load(String),
    #[error("expected {expected} values, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("invalid event name: {0}")]
    Name(#[from] NulError),
    #[error("membership of a running event set cannot change")]
    Running,
    #[error("component {0} is not in the catalog")]
    NoComponent(i32),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Papi { kind, .. } => *kind,
            Self::VersionNotFound => ErrorKind::NotInitialized,
            Self::Load(_) => ErrorKind::SystemError,
            Self::Length { .. } | Self::Name(_) => ErrorKind::InvalidArgument,
            Self::Running => ErrorKind::AlreadyRunning,
            Self::NoComponent(_) => ErrorKind::ComponentNotFound,
        }
    }

    /// Raw status for errors the library reported itself.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Papi { code, .. } => Some(*code),
            _ => None,
        }
    }
}
