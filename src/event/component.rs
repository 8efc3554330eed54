use std::sync::Arc;

use super::Event;
use crate::layout::Record;

/// A measurement subsystem: CPU core counters, uncore, GPU, network...
#[derive(Clone, Debug)]
pub struct Component {
    /// Index assigned by the library, 0 for the implicit pre-4.0 substrate.
    pub index: i32,
    pub name: String,
    /// Since 5.0.
    pub short_name: Option<String>,
    /// Since 5.0.
    pub description: Option<String>,
    pub version: String,
    pub support_version: String,
    pub kernel_version: String,

    pub num_cntrs: i32,
    pub num_mpx_cntrs: i32,
    pub num_preset_events: i32,
    pub num_native_events: i32,

    pub default_domain: i32,
    pub available_domains: i32,
    pub default_granularity: i32,
    pub available_granularities: i32,

    pub(crate) presets: Option<Arc<[Arc<Event>]>>,
    pub(crate) native: Vec<Arc<Event>>,
}

impl Component {
    pub(crate) fn decode(record: Record<'_>, index: i32) -> Option<Self> {
        Some(Self {
            index,
            name: record.string("name")?,
            short_name: record.string("short_name"),
            description: record.string("description"),
            version: record.string("version")?,
            support_version: record.string("support_version")?,
            kernel_version: record.string("kernel_version")?,
            num_cntrs: record.int("num_cntrs")?,
            num_mpx_cntrs: record.int("num_mpx_cntrs")?,
            num_preset_events: record.int("num_preset_events")?,
            num_native_events: record.int("num_native_events")?,
            default_domain: record.int("default_domain")?,
            available_domains: record.int("available_domains")?,
            default_granularity: record.int("default_granularity")?,
            available_granularities: record.int("available_granularities")?,
            presets: None,
            native: vec![],
        })
    }

    /// Preset events, only attached to component 0.
    pub fn presets(&self) -> Option<&[Arc<Event>]> {
        self.presets.as_deref()
    }

    /// Native events in enumeration order.
    pub fn native(&self) -> &[Arc<Event>] {
        &self.native
    }
}

/// A component the library reports as unusable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disabled {
    pub index: i32,
    pub name: String,
    pub reason: String,
}
