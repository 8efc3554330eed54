
mod table;

use std::ffi::CStr;

use arrayvec::ArrayVec;

pub use table::{COMPONENT_INFO, EVENT_INFO};

use crate::ffi::{read_at, Modifier};
use crate::version::{v, Version};

/// C type of a record field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Int,
    UInt,
    /// `char[N]`
    Chars(usize),
    /// `int[N]`
    Ints(usize),
    /// `void *[N]`
    Ptrs(usize),
}

impl Ty {
    pub fn size(&self) -> usize {
        match self {
            Self::Int | Self::UInt => size_of::<i32>(),
            Self::Chars(n) => *n,
            Self::Ints(n) => n * size_of::<i32>(),
            Self::Ptrs(n) => n * size_of::<*const ()>(),
        }
    }

    pub fn align(&self) -> usize {
        match self {
            Self::Int | Self::UInt | Self::Ints(_) => align_of::<i32>(),
            Self::Chars(_) => 1,
            Self::Ptrs(_) => align_of::<*const ()>(),
        }
    }
}

/// Versions a field exists in: `since..before`, either end open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub since: Option<Version>,
    pub before: Option<Version>,
}

pub const ALL: Span = Span {
    since: None,
    before: None,
};

pub const fn since(version: Version) -> Span {
    Span {
        since: Some(version),
        before: None,
    }
}

pub const fn before(version: Version) -> Span {
    Span {
        since: None,
        before: Some(version),
    }
}

pub const fn between(since: Version, before: Version) -> Span {
    Span {
        since: Some(since),
        before: Some(before),
    }
}

impl Span {
    pub fn contains(&self, version: Version) -> bool {
        self.since.map_or(true, |since| version >= since)
            && self.before.map_or(true, |before| version < before)
    }
}

/// One row of a layout table.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    pub span: Span,
    pub name: &'static str,
    pub ty: Ty,
}

impl Field {
    pub const fn new(span: Span, name: &'static str, ty: Ty) -> Self {
        Self { span, name, ty }
    }
}

/// A field with its resolved byte offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placed {
    pub name: &'static str,
    pub ty: Ty,
    pub offset: usize,
}

const MAX_FIELDS: usize = 32;

/// Concrete C struct layout for one library version.
#[derive(Clone, Debug)]
pub struct Layout {
    fields: ArrayVec<Placed, MAX_FIELDS>,
    size: usize,
}

impl Layout {
    /// Lays out the rows of `table` present in `version` with C struct rules.
    pub fn resolve(table: &[Field], version: Version) -> Self {
        let mut fields = ArrayVec::new();
        let mut offset: usize = 0;
        let mut align: usize = 1;

        for field in table.iter().filter(|f| f.span.contains(version)) {
            let a = field.ty.align();
            offset = offset.next_multiple_of(a);
            align = align.max(a);
            fields.push(Placed {
                name: field.name,
                ty: field.ty,
                offset,
            });
            offset += field.ty.size();
        }

        Self {
            fields,
            size: offset.next_multiple_of(align),
        }
    }

    /// `sizeof` the struct, trailing padding included.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn fields(&self) -> &[Placed] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Placed> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn zeroed(&self) -> Vec<u8> {
        vec![0; self.size]
    }
}

/// Read-only view of a raw record through its layout.
///
/// Getters return `None` for fields the layout does not have, so callers
/// never need to know which version they run against.
#[derive(Clone, Copy)]
pub struct Record<'a> {
    layout: &'a Layout,
    buf: &'a [u8],
}

impl<'a> Record<'a> {
    pub fn new(layout: &'a Layout, buf: &'a [u8]) -> Self {
        Self { layout, buf }
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.layout.field(name)? {
            Placed {
                ty: Ty::Int | Ty::UInt,
                offset,
                ..
            } => read_at(self.buf, *offset),
            _ => None,
        }
    }

    pub fn uint(&self, name: &str) -> Option<u32> {
        self.int(name).map(|n| n as u32)
    }

    pub fn string(&self, name: &str) -> Option<String> {
        match self.layout.field(name)? {
            Placed {
                ty: Ty::Chars(len),
                offset,
                ..
            } => {
                let bytes = self.buf.get(*offset..offset + len)?;
                // A full buffer has no terminator, take it whole.
                let s = match CStr::from_bytes_until_nul(bytes) {
                    Ok(s) => s.to_string_lossy(),
                    Err(_) => String::from_utf8_lossy(bytes),
                };
                Some(s.into_owned())
            }
            _ => None,
        }
    }
}

/// How components are discovered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Discovery {
    /// One implicit component described by `PAPI_get_substrate_info`.
    Substrate,
    /// `PAPI_num_components` descriptors from `PAPI_get_component_info`.
    Components,
}

/// How native events are enumerated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Enumeration {
    /// `PAPI_enum_event`, implicitly on component 0.
    Global,
    /// `PAPI_enum_cmp_event` with an explicit component index.
    PerComponent,
}

/// Cursor commands used by catalog discovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub first: Modifier,
    pub next_preset: Modifier,
    pub next_native: Modifier,
    pub umasks: Modifier,
}

/// Component API threshold: component enumeration and `PAPI_enum_cmp_event`.
pub const COMPONENTS_SINCE: Version = v!(4, 0);

/// Everything version dependent about talking to the library.
#[derive(Clone, Debug)]
pub struct Layouts {
    pub version: Version,
    pub component: Layout,
    pub event: Layout,
    pub discovery: Discovery,
    pub enumeration: Enumeration,
    pub cursor: Cursor,
}

impl Layouts {
    pub fn resolve(version: Version) -> Self {
        let components = version >= COMPONENTS_SINCE;
        Self {
            version,
            component: Layout::resolve(&COMPONENT_INFO, version),
            event: Layout::resolve(&EVENT_INFO, version),
            discovery: match components {
                true => Discovery::Components,
                false => Discovery::Substrate,
            },
            enumeration: match components {
                true => Enumeration::PerComponent,
                false => Enumeration::Global,
            },
            cursor: Cursor {
                first: Modifier::EnumFirst,
                next_preset: Modifier::PresetEnumAvail,
                next_native: Modifier::EnumEvents,
                umasks: Modifier::NtvEnumUmasks,
            },
        }
    }

    /// Whether component descriptors carry the `disabled` flag.
    pub fn has_disabled_flag(&self) -> bool {
        self.component.has("disabled")
    }
}
