use std::collections::{HashMap, HashSet};
use std::ffi::CStr;
use std::sync::Mutex;

use libc::c_ulong;

use super::{Modifier, Native, ThreadIdFn, OK, PAPI_NULL};
use crate::event::PRESET_MASK;
use crate::layout::{Layout, Layouts, Placed, Ty, COMPONENTS_SINCE};
use crate::version::Version;

const EINVAL: i32 = -1;
const ENOEVNT: i32 = -7;
const ECNFLCT: i32 = -8;
const ENOTRUN: i32 = -9;
const EISRUN: i32 = -10;
const ENOEVST: i32 = -11;
const EMISC: i32 = -14;
const ENOCMP: i32 = -17;

#[derive(Clone, Debug)]
pub(crate) struct MockEvent {
    pub code: u32,
    pub symbol: String,
    pub descr: String,
    pub masks: Vec<MockEvent>,
}

#[derive(Clone, Debug)]
pub(crate) struct MockComponent {
    pub name: String,
    pub disabled: Option<String>,
    pub natives: Vec<MockEvent>,
}

#[derive(Debug, Default)]
struct Set {
    members: Vec<(u32, Option<String>)>,
    running: bool,
    component: Option<i32>,
    reads: i64,
}

#[derive(Debug, Default)]
struct State {
    tried: Vec<u32>,
    sets: HashMap<i32, Set>,
    next: i32,
    attempts: Vec<String>,
}

/// In-memory stand-in for `libpapi`.
///
/// Counter values are the low 16 bits of the member's code, so tests can tell
/// which member a value belongs to.
#[derive(Debug)]
pub(crate) struct Mock {
    version: Version,
    layouts: Layouts,
    presets: Vec<MockEvent>,
    components: Vec<MockComponent>,
    unreadable: HashSet<u32>,
    reject: HashSet<u32>,
    sticky: HashSet<u32>,
    names: HashSet<String>,
    expand: HashMap<u32, u32>,
    reorder: bool,
    unlistable: bool,
    deltas: Vec<i64>,
    threads: Vec<c_ulong>,
    state: Mutex<State>,
}

fn put_int(layout: &Layout, buf: &mut [u8], name: &str, value: i32) {
    if let Some(field) = layout.field(name) {
        buf[field.offset..field.offset + 4].copy_from_slice(&value.to_ne_bytes());
    }
}

fn put_str(layout: &Layout, buf: &mut [u8], name: &str, value: &str) {
    if let Some(Placed {
        ty: Ty::Chars(len),
        offset,
        ..
    }) = layout.field(name)
    {
        let n = value.len().min(len - 1);
        buf[*offset..offset + n].copy_from_slice(&value.as_bytes()[..n]);
    }
}

impl Mock {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            layouts: Layouts::resolve(version),
            presets: vec![],
            components: vec![],
            unreadable: HashSet::new(),
            reject: HashSet::new(),
            sticky: HashSet::new(),
            names: HashSet::new(),
            expand: HashMap::new(),
            reorder: false,
            unlistable: false,
            deltas: vec![],
            threads: vec![],
            state: Mutex::new(State {
                next: 7,
                ..Default::default()
            }),
        }
    }

    pub fn preset(mut self, code: u32, symbol: &str) -> Self {
        self.presets.push(MockEvent {
            code,
            symbol: symbol.into(),
            descr: format!("{} description", symbol),
            masks: vec![],
        });
        self
    }

    pub fn component(mut self, name: &str) -> Self {
        self.components.push(MockComponent {
            name: name.into(),
            disabled: None,
            natives: vec![],
        });
        self
    }

    pub fn disabled_component(mut self, name: &str, reason: &str) -> Self {
        self.components.push(MockComponent {
            name: name.into(),
            disabled: Some(reason.into()),
            natives: vec![],
        });
        self
    }

    /// Adds a native event with unit masks to the last component.
    pub fn native(mut self, code: u32, symbol: &str, masks: &[(u32, &str)]) -> Self {
        let event = MockEvent {
            code,
            symbol: symbol.into(),
            descr: format!("{} description, masks:{}", symbol, masks.len()),
            masks: masks
                .iter()
                .map(|(code, symbol)| MockEvent {
                    code: *code,
                    symbol: (*symbol).into(),
                    descr: format!("{} masks:mask {}", symbol, code & 0xff),
                    masks: vec![],
                })
                .collect(),
        };
        self.components
            .last_mut()
            .expect("native event without component")
            .natives
            .push(event);
        self
    }

    pub fn unreadable(mut self, code: u32) -> Self {
        self.unreadable.insert(code);
        self
    }

    pub fn reject(mut self, codes: &[u32]) -> Self {
        self.reject.extend(codes);
        self
    }

    /// Adding `code` fails but leaves it in the set.
    pub fn sticky(mut self, code: u32) -> Self {
        self.sticky.insert(code);
        self
    }

    /// Names accepted by `add_named_event` regardless of the catalog.
    pub fn accept_name(mut self, name: &str) -> Self {
        self.names.insert(name.into());
        self
    }

    /// Adding `code` also adds `extra`.
    pub fn expand(mut self, code: u32, extra: u32) -> Self {
        self.expand.insert(code, extra);
        self
    }

    /// Members are listed newest first.
    pub fn reorder(mut self) -> Self {
        self.reorder = true;
        self
    }

    /// Listing members fails while the set has any.
    pub fn unlistable(mut self) -> Self {
        self.unlistable = true;
        self
    }

    pub fn deltas(mut self, deltas: &[i64]) -> Self {
        self.deltas = deltas.to_vec();
        self
    }

    pub fn threads(mut self, ids: &[c_ulong]) -> Self {
        self.threads = ids.to_vec();
        self
    }

    pub fn tried(&self) -> Vec<u32> {
        self.state.lock().unwrap().tried.clone()
    }

    /// Every add attempt, successful or not, in order.
    pub fn attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().attempts.clone()
    }

    pub fn members(&self, handle: i32) -> Vec<u32> {
        let state = self.state.lock().unwrap();
        state.sets[&handle].members.iter().map(|m| m.0).collect()
    }

    pub fn live_sets(&self) -> usize {
        self.state.lock().unwrap().sets.len()
    }

    fn find(&self, code: u32) -> Option<(&MockEvent, Option<i32>)> {
        if let Some(e) = self.presets.iter().find(|e| e.code == code) {
            return Some((e, None));
        }
        for (cidx, c) in self.components.iter().enumerate() {
            for e in &c.natives {
                if e.code == code {
                    return Some((e, Some(cidx as i32)));
                }
                if let Some(m) = e.masks.iter().find(|m| m.code == code) {
                    return Some((m, Some(cidx as i32)));
                }
            }
        }
        None
    }

    fn write_component(&self, cidx: usize, buf: &mut [u8]) -> i32 {
        let Some(c) = self.components.get(cidx) else {
            return EINVAL;
        };
        let layout = &self.layouts.component;
        buf.fill(0);
        put_str(layout, buf, "name", &c.name);
        put_str(layout, buf, "short_name", &c.name);
        put_str(layout, buf, "version", "1.0");
        put_int(layout, buf, "CmpIdx", cidx as i32);
        put_int(layout, buf, "num_cntrs", 4);
        put_int(layout, buf, "num_native_events", c.natives.len() as i32);
        put_int(layout, buf, "available_domains", 0xf);
        if let Some(reason) = &c.disabled {
            put_int(layout, buf, "disabled", 1);
            put_str(layout, buf, "disabled_reason", reason);
        }
        OK
    }

    fn step(&self, code: &mut u32, modifier: Modifier, cidx: i32) -> i32 {
        let next_of = |list: &[MockEvent], code: u32| {
            let pos = list.iter().position(|e| e.code == code)?;
            list.get(pos + 1).map(|e| e.code)
        };

        if *code & PRESET_MASK != 0 {
            let next = match modifier {
                Modifier::EnumFirst => self.presets.first().map(|e| e.code),
                Modifier::PresetEnumAvail => next_of(&self.presets, *code),
                _ => None,
            };
            return match next {
                Some(next) => {
                    *code = next;
                    OK
                }
                None => ENOEVNT,
            };
        }

        let Some(c) = self.components.get(cidx as usize) else {
            return ENOCMP;
        };
        let next = match modifier {
            Modifier::EnumFirst => c.natives.first().map(|e| e.code),
            Modifier::EnumEvents => next_of(&c.natives, *code),
            Modifier::NtvEnumUmasks => c.natives.iter().find_map(|e| {
                if e.code == *code {
                    e.masks.first().map(|m| m.code)
                } else {
                    next_of(&e.masks, *code)
                }
            }),
            _ => None,
        };
        match next {
            Some(next) => {
                *code = next;
                OK
            }
            None => ENOEVNT,
        }
    }

    fn value(&self, code: u32) -> i64 {
        (code & 0xffff) as i64
    }

    fn values(&self, handle: i32, values: &mut [i64], running: Option<bool>) -> i32 {
        let mut state = self.state.lock().unwrap();
        let Some(set) = state.sets.get_mut(&handle) else {
            return ENOEVST;
        };
        if !set.running {
            return ENOTRUN;
        }
        for (value, (code, _)) in values.iter_mut().zip(&set.members) {
            *value = self.value(*code);
        }
        set.reads += 1;
        if let Some(running) = running {
            set.running = running;
        }
        OK
    }

    fn add_member(&self, handle: i32, code: u32, name: Option<String>) -> i32 {
        let mut state = self.state.lock().unwrap();
        state
            .attempts
            .push(name.clone().unwrap_or_else(|| format!("{:#x}", code)));
        let reorder = self.reorder;
        let Some(set) = state.sets.get_mut(&handle) else {
            return ENOEVST;
        };
        if set.running {
            return EISRUN;
        }
        if set.members.iter().any(|m| m.0 == code) {
            return ECNFLCT;
        }
        let mut push = |member: (u32, Option<String>)| match reorder {
            true => set.members.insert(0, member),
            false => set.members.push(member),
        };

        if self.sticky.contains(&code) {
            push((code, name));
            return ECNFLCT;
        }
        if self.reject.contains(&code) {
            return ECNFLCT;
        }
        push((code, name));
        if let Some(extra) = self.expand.get(&code) {
            push((*extra, None));
        }
        OK
    }

    fn remove_member(&self, handle: i32, pred: impl Fn(&(u32, Option<String>)) -> bool) -> i32 {
        let mut state = self.state.lock().unwrap();
        let Some(set) = state.sets.get_mut(&handle) else {
            return ENOEVST;
        };
        if set.running {
            return EISRUN;
        }
        match set.members.iter().position(pred) {
            Some(pos) => {
                set.members.remove(pos);
                OK
            }
            None => ENOEVNT,
        }
    }
}

impl Native for Mock {
    fn library_init(&self, version: i32) -> i32 {
        self.state.lock().unwrap().tried.push(version as u32);
        match version as u32 == self.version.raw() {
            true => version,
            false => EINVAL,
        }
    }

    fn shutdown(&self) {}

    fn num_components(&self) -> i32 {
        self.components.len() as i32
    }

    fn component_info(&self, cidx: i32, buf: &mut [u8]) -> i32 {
        self.write_component(cidx as usize, buf)
    }

    fn substrate_info(&self, buf: &mut [u8]) -> i32 {
        self.write_component(0, buf)
    }

    fn enum_event(&self, code: &mut u32, modifier: Modifier) -> i32 {
        self.step(code, modifier, 0)
    }

    fn enum_cmp_event(&self, code: &mut u32, modifier: Modifier, cidx: i32) -> i32 {
        self.step(code, modifier, cidx)
    }

    fn event_info(&self, code: u32, buf: &mut [u8]) -> i32 {
        if self.unreadable.contains(&code) {
            return ENOEVNT;
        }
        let Some((event, cidx)) = self.find(code) else {
            return ENOEVNT;
        };
        let layout = &self.layouts.event;
        buf.fill(0);
        put_int(layout, buf, "event_code", code as i32);
        put_str(layout, buf, "symbol", &event.symbol);
        put_str(layout, buf, "short_descr", &event.symbol);
        put_str(layout, buf, "long_descr", &event.descr);
        put_int(layout, buf, "component_index", cidx.unwrap_or(0));
        OK
    }

    fn create_eventset(&self, handle: &mut i32) -> i32 {
        if *handle != PAPI_NULL {
            return EINVAL;
        }
        let mut state = self.state.lock().unwrap();
        let next = state.next;
        state.next += 1;
        state.sets.insert(next, Set::default());
        *handle = next;
        OK
    }

    fn cleanup_eventset(&self, handle: i32) -> i32 {
        let mut state = self.state.lock().unwrap();
        match state.sets.get_mut(&handle) {
            Some(set) if set.running => EISRUN,
            Some(set) => {
                set.members.clear();
                OK
            }
            None => ENOEVST,
        }
    }

    fn destroy_eventset(&self, handle: &mut i32) -> i32 {
        let mut state = self.state.lock().unwrap();
        match state.sets.get(handle) {
            Some(set) if !set.members.is_empty() => EINVAL,
            Some(_) => {
                state.sets.remove(handle);
                *handle = PAPI_NULL;
                OK
            }
            None => ENOEVST,
        }
    }

    fn assign_eventset_component(&self, handle: i32, cidx: i32) -> i32 {
        if cidx < 0 || cidx as usize >= self.components.len() {
            return ENOCMP;
        }
        let mut state = self.state.lock().unwrap();
        match state.sets.get_mut(&handle) {
            Some(set) => {
                set.component = Some(cidx);
                OK
            }
            None => ENOEVST,
        }
    }

    fn eventset_component(&self, handle: i32) -> i32 {
        // Missing entry point.
        if self.version < COMPONENTS_SINCE {
            return EMISC;
        }
        let state = self.state.lock().unwrap();
        match state.sets.get(&handle) {
            Some(set) => set.component.unwrap_or(ENOCMP),
            None => ENOEVST,
        }
    }

    fn add_event(&self, handle: i32, code: u32) -> i32 {
        if self.find(code).is_none() {
            self.state.lock().unwrap().attempts.push(format!("{:#x}", code));
            return ENOEVNT;
        }
        self.add_member(handle, code, None)
    }

    fn add_named_event(&self, handle: i32, name: &CStr) -> i32 {
        let name = name.to_string_lossy().into_owned();
        if self.names.contains(&name) {
            // Synthetic code, distinct per name.
            let hash = name
                .bytes()
                .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32));
            let code = 0x4800_0000 | (hash & 0xffff);
            return self.add_member(handle, code, Some(name));
        }
        let found = self
            .presets
            .iter()
            .chain(self.components.iter().flat_map(|c| &c.natives))
            .find(|e| e.symbol == name)
            .map(|e| e.code);
        match found {
            Some(code) => self.add_member(handle, code, Some(name)),
            None => {
                self.state.lock().unwrap().attempts.push(name);
                ENOEVNT
            }
        }
    }

    fn remove_event(&self, handle: i32, code: u32) -> i32 {
        self.remove_member(handle, |m| m.0 == code)
    }

    fn remove_named_event(&self, handle: i32, name: &CStr) -> i32 {
        let name = name.to_string_lossy();
        self.remove_member(handle, |m| m.1.as_deref() == Some(&*name))
    }

    fn num_events(&self, handle: i32) -> i32 {
        let state = self.state.lock().unwrap();
        match state.sets.get(&handle) {
            Some(set) => set.members.len() as i32,
            None => ENOEVST,
        }
    }

    fn list_events(&self, handle: i32, codes: &mut [i32], len: &mut i32) -> i32 {
        let state = self.state.lock().unwrap();
        let Some(set) = state.sets.get(&handle) else {
            return ENOEVST;
        };
        if self.unlistable && !set.members.is_empty() {
            return EINVAL;
        }
        let n = (*len as usize).min(codes.len());
        for (slot, (code, _)) in codes[..n].iter_mut().zip(&set.members) {
            *slot = *code as i32;
        }
        *len = set.members.len() as i32;
        OK
    }

    fn start(&self, handle: i32) -> i32 {
        let mut state = self.state.lock().unwrap();
        match state.sets.get_mut(&handle) {
            Some(set) if set.running => EISRUN,
            Some(set) if set.members.is_empty() => EINVAL,
            Some(set) => {
                set.running = true;
                OK
            }
            None => ENOEVST,
        }
    }

    fn stop(&self, handle: i32, values: &mut [i64]) -> i32 {
        self.values(handle, values, Some(false))
    }

    fn read(&self, handle: i32, values: &mut [i64]) -> i32 {
        self.values(handle, values, None)
    }

    fn read_ts(&self, handle: i32, values: &mut [i64], cycles: &mut i64) -> i32 {
        let status = self.values(handle, values, None);
        if status == OK {
            *cycles = 1_000_000 + self.state.lock().unwrap().sets[&handle].reads;
        }
        status
    }

    fn accum(&self, handle: i32, values: &mut [i64]) -> i32 {
        let state = self.state.lock().unwrap();
        let Some(set) = state.sets.get(&handle) else {
            return ENOEVST;
        };
        if !set.running {
            return ENOTRUN;
        }
        for (i, (value, (code, _))) in values.iter_mut().zip(&set.members).enumerate() {
            *value += self.deltas.get(i).copied().unwrap_or(self.value(*code));
        }
        OK
    }

    fn thread_init(&self, _id_fn: ThreadIdFn) -> i32 {
        OK
    }

    fn register_thread(&self) -> i32 {
        OK
    }

    fn unregister_thread(&self) -> i32 {
        OK
    }

    fn list_threads(&self, ids: Option<&mut [c_ulong]>, count: &mut i32) -> i32 {
        if let Some(ids) = ids {
            for (slot, id) in ids.iter_mut().zip(&self.threads) {
                *slot = *id;
            }
        }
        *count = self.threads.len() as i32;
        OK
    }
}
