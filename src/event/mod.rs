use std::fmt;
use std::sync::Arc;

use crate::layout::Record;

mod catalog;
mod component;

pub use catalog::*;
pub use component::*;

/// Set in the code of every preset event.
pub const PRESET_MASK: u32 = 0x8000_0000;
/// Set in the code of every native event.
pub const NATIVE_MASK: u32 = 0x4000_0000;
pub const PRESET_AND_MASK: u32 = 0x7FFF_FFFF;
pub const NATIVE_AND_MASK: u32 = 0xBFFF_FFFF;

/// Decoded `PAPI_event_info_t`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventInfo {
    pub code: u32,
    pub symbol: String,
    pub short_descr: String,
    pub long_descr: String,
    /// Since 5.0.
    pub component: Option<i32>,
    /// Since 5.0.
    pub units: Option<String>,
}

impl EventInfo {
    pub(crate) fn decode(record: Record<'_>) -> Option<Self> {
        Some(Self {
            code: record.uint("event_code")?,
            symbol: record.string("symbol")?,
            short_descr: record.string("short_descr")?,
            long_descr: record.string("long_descr")?,
            component: record.int("component_index"),
            units: record.string("units").filter(|s| !s.is_empty()),
        })
    }

    pub fn is_preset(&self) -> bool {
        self.code & PRESET_MASK != 0
    }

    pub fn is_native(&self) -> bool {
        self.code & NATIVE_MASK != 0
    }

    /// Symbol without its `component::` prefix.
    pub fn base_name(&self) -> &str {
        match self.symbol.rfind("::") {
            Some(pos) => &self.symbol[pos + 2..],
            None => &self.symbol,
        }
    }
}

/// A unit mask refining a native event.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mask {
    pub info: EventInfo,
}

/// A countable event, preset or native.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub info: EventInfo,
    /// Unit masks in catalog order, empty for presets and for native events
    /// without masks.
    pub masks: Vec<Mask>,
}

impl Event {
    pub fn code(&self) -> u32 {
        self.info.code
    }

    pub fn symbol(&self) -> &str {
        &self.info.symbol
    }

    /// Renders the symbol, optionally followed by the long description and
    /// one line pair per unit mask: the mask's suffix, then the part of its
    /// description after `masks:`.
    pub fn describe(&self, descriptions: bool, masks: bool) -> String {
        let mut s = self.info.symbol.clone();
        if descriptions {
            s.push_str("\n  ");
            s.push_str(&self.info.long_descr);
        }
        if masks && !self.masks.is_empty() {
            let base = self.info.base_name();
            let lines: Vec<_> = self
                .masks
                .iter()
                .map(|m| {
                    let descr = &m.info.long_descr;
                    let descr = match descr.rfind("masks:") {
                        Some(pos) => &descr[pos + "masks:".len()..],
                        None => descr,
                    };
                    let suffix = match m.info.symbol.strip_prefix(&self.info.symbol) {
                        Some(suffix) => suffix.to_owned(),
                        None => m.info.symbol.replace(base, ""),
                    };
                    format!("{}\n      {}", suffix, descr)
                })
                .collect();
            s.push_str("\n    ");
            s.push_str(&lines.join("\n    "));
        }
        s
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info.symbol)
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info.symbol)
    }
}

/// Anything that identifies an event by numeric code.
pub trait AsCode {
    fn as_code(&self) -> u32;
}

impl AsCode for u32 {
    fn as_code(&self) -> u32 {
        *self
    }
}

impl AsCode for Event {
    fn as_code(&self) -> u32 {
        self.info.code
    }
}

impl AsCode for Mask {
    fn as_code(&self) -> u32 {
        self.info.code
    }
}

impl<T: AsCode + ?Sized> AsCode for &T {
    fn as_code(&self) -> u32 {
        (**self).as_code()
    }
}

impl<T: AsCode + ?Sized> AsCode for Arc<T> {
    fn as_code(&self) -> u32 {
        (**self).as_code()
    }
}
