use std::collections::HashMap;
use std::sync::Arc;

use super::{Component, Disabled, Event, EventInfo, Mask, NATIVE_MASK, PRESET_MASK};
use crate::error::Result;
use crate::ffi::{Modifier, OK};
use crate::layout::{Discovery, Enumeration, Record};
use crate::Papi;

/// Steps an enumeration cursor, yielding the code after every successful
/// step. The first failing step ends the walk, that is how the library
/// signals the end of a list.
struct Walk<'p> {
    papi: &'p Papi,
    code: u32,
    first: Option<Modifier>,
    next: Modifier,
    // `None` walks through `PAPI_enum_event`.
    cidx: Option<i32>,
    done: bool,
}

impl<'p> Walk<'p> {
    fn new(papi: &'p Papi, seed: u32, first: Modifier, next: Modifier, cidx: Option<i32>) -> Self {
        Self {
            papi,
            code: seed,
            first: Some(first),
            next,
            cidx,
            done: false,
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.done {
            return None;
        }
        let modifier = self.first.take().unwrap_or(self.next);
        let native = self.papi.native();
        let status = match self.cidx {
            Some(cidx) => native.enum_cmp_event(&mut self.code, modifier, cidx),
            None => native.enum_event(&mut self.code, modifier),
        };
        self.done = status != OK;
        (!self.done).then_some(self.code)
    }
}

/// Everything countable on this machine, discovered once.
///
/// The catalog never changes after [`discover`][Self::discover] returns and
/// can be shared freely between threads.
#[derive(Clone, Debug)]
pub struct Catalog {
    presets: Arc<[Arc<Event>]>,
    components: Vec<Component>,
    disabled: Vec<Disabled>,
    by_code: HashMap<u32, Arc<Event>>,
    by_index: HashMap<i32, usize>,
}

impl Catalog {
    pub fn discover(papi: &Papi) -> Result<Self> {
        let presets: Arc<[Arc<Event>]> = discover_presets(papi).into();
        let (mut components, disabled) = discover_components(papi)?;

        for component in &mut components {
            if component.index == 0 {
                component.presets = Some(Arc::clone(&presets));
            }
            component.native = discover_native(papi, component.index);
        }

        let by_code = presets
            .iter()
            .chain(components.iter().flat_map(|c| &c.native))
            .map(|e| (e.code(), Arc::clone(e)))
            .collect();
        let by_index = components
            .iter()
            .enumerate()
            .map(|(i, c)| (c.index, i))
            .collect();

        log::debug!(
            "catalog: {} presets, {} components ({} disabled)",
            presets.len(),
            components.len(),
            disabled.len()
        );

        Ok(Self {
            presets,
            components,
            disabled,
            by_code,
            by_index,
        })
    }

    /// Preset events in enumeration order.
    pub fn presets(&self) -> &[Arc<Event>] {
        &self.presets
    }

    /// Enabled components in index order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, index: i32) -> Option<&Component> {
        self.by_index.get(&index).map(|i| &self.components[*i])
    }

    /// Components skipped because the library reported them disabled.
    pub fn disabled(&self) -> &[Disabled] {
        &self.disabled
    }

    /// Looks up a preset or native event by code. Unit masks are not indexed.
    pub fn event(&self, code: u32) -> Option<&Arc<Event>> {
        self.by_code.get(&code)
    }

    /// Looks up a preset by symbol, the `PAPI_` prefix is optional.
    pub fn preset(&self, name: &str) -> Option<&Arc<Event>> {
        self.presets.iter().find(|e| {
            let symbol = e.symbol();
            symbol == name || symbol.strip_prefix("PAPI_") == Some(name)
        })
    }
}

fn event_info(papi: &Papi, code: u32) -> Option<EventInfo> {
    let layout = &papi.layouts().event;
    let mut buf = layout.zeroed();
    let status = papi.native().event_info(code, &mut buf);
    if status != OK {
        log::warn!("skipping unreadable event {:#x}: {}", code, status);
        return None;
    }
    EventInfo::decode(Record::new(layout, &buf))
}

fn discover_presets(papi: &Papi) -> Vec<Arc<Event>> {
    let cursor = papi.layouts().cursor;
    Walk::new(papi, PRESET_MASK, cursor.first, cursor.next_preset, None)
        .filter_map(|code| event_info(papi, code))
        .map(|info| {
            Arc::new(Event {
                info,
                masks: vec![],
            })
        })
        .collect()
}

fn enumeration_cidx(papi: &Papi, cidx: i32) -> Option<i32> {
    match papi.layouts().enumeration {
        Enumeration::PerComponent => Some(cidx),
        Enumeration::Global => None,
    }
}

fn discover_masks(papi: &Papi, code: u32, cidx: i32) -> Vec<Mask> {
    let umasks = papi.layouts().cursor.umasks;
    Walk::new(papi, code, umasks, umasks, enumeration_cidx(papi, cidx))
        .filter_map(|code| event_info(papi, code))
        .map(|info| Mask { info })
        .collect()
}

fn discover_native(papi: &Papi, cidx: i32) -> Vec<Arc<Event>> {
    let cursor = papi.layouts().cursor;
    let walk = Walk::new(
        papi,
        NATIVE_MASK,
        cursor.first,
        cursor.next_native,
        enumeration_cidx(papi, cidx),
    );
    walk.filter_map(|code| event_info(papi, code))
        .map(|info| {
            let masks = discover_masks(papi, info.code, cidx);
            Arc::new(Event { info, masks })
        })
        .collect()
}

fn discover_components(papi: &Papi) -> Result<(Vec<Component>, Vec<Disabled>)> {
    let layouts = papi.layouts();
    let native = papi.native();
    let layout = &layouts.component;
    let mut buf = layout.zeroed();

    if layouts.discovery == Discovery::Substrate {
        papi.check(native.substrate_info(&mut buf))?;
        let component = Component::decode(Record::new(layout, &buf), 0);
        return Ok((component.into_iter().collect(), vec![]));
    }

    let count = papi.check(native.num_components())?;
    let mut components = vec![];
    let mut disabled = vec![];

    for cidx in 0..count {
        if native.component_info(cidx, &mut buf) != OK {
            log::warn!("no descriptor for component {}", cidx);
            continue;
        }
        let record = Record::new(layout, &buf);

        if layouts.has_disabled_flag() && record.int("disabled").unwrap_or(0) != 0 {
            let name = record.string("name").unwrap_or_default();
            let reason = record.string("disabled_reason").unwrap_or_default();
            log::info!("component {} ({}) disabled: {}", cidx, name, reason);
            disabled.push(Disabled {
                index: cidx,
                name,
                reason,
            });
            continue;
        }

        match Component::decode(record, cidx) {
            Some(component) => components.push(component),
            None => log::warn!("skipping undecodable component {}", cidx),
        }
    }

    Ok((components, disabled))
}
