use std::ffi::CStr;

use libc::c_ulong;

pub mod libpapi;
#[cfg(test)]
pub(crate) mod mock;

pub const OK: i32 = 0;
pub const PAPI_NULL: i32 = -1;

pub const MIN_STR_LEN: usize = 64;
pub const MAX_STR_LEN: usize = 128;
pub const MAX_STR_LEN2: usize = 256;
pub const HUGE_STR_LEN: usize = 1024;
pub const MAX_INFO_TERMS: usize = 12;
pub const PMU_MAX: usize = 40;

/// Cursor commands for `PAPI_enum_event` and `PAPI_enum_cmp_event`.
///
/// The discriminants are the C enum values, which have not moved in any
/// supported release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum Modifier {
    EnumEvents = 0,
    EnumFirst,
    PresetEnumAvail,
    PresetEnumMsc,
    PresetEnumIns,
    PresetEnumIdl,
    PresetEnumBr,
    PresetEnumCnd,
    PresetEnumMem,
    PresetEnumCach,
    PresetEnumL1,
    PresetEnumL2,
    PresetEnumL3,
    PresetEnumTlb,
    PresetEnumFp,
    NtvEnumUmasks,
    NtvEnumUmaskCombos,
    NtvEnumIarr,
    NtvEnumDarr,
    NtvEnumOpcm,
    NtvEnumIear,
    NtvEnumDear,
    NtvEnumGroups,
}

/// Signature of the thread id callback taken by `PAPI_thread_init`.
pub type ThreadIdFn = unsafe extern "C" fn() -> c_ulong;

/// The library entry points this crate drives.
///
/// Every method maps onto one C function and returns its raw status,
/// interpretation is left to [`ErrorTable`][crate::error::ErrorTable].
/// Record getters copy the C struct into `buf`, whose length comes from the
/// [resolved layout][crate::layout::Layouts].
pub trait Native: Send + Sync {
    fn library_init(&self, version: i32) -> i32;
    fn shutdown(&self);

    fn num_components(&self) -> i32;
    fn component_info(&self, cidx: i32, buf: &mut [u8]) -> i32;
    fn substrate_info(&self, buf: &mut [u8]) -> i32;

    fn enum_event(&self, code: &mut u32, modifier: Modifier) -> i32;
    fn enum_cmp_event(&self, code: &mut u32, modifier: Modifier, cidx: i32) -> i32;
    fn event_info(&self, code: u32, buf: &mut [u8]) -> i32;

    fn create_eventset(&self, handle: &mut i32) -> i32;
    fn cleanup_eventset(&self, handle: i32) -> i32;
    fn destroy_eventset(&self, handle: &mut i32) -> i32;
    fn assign_eventset_component(&self, handle: i32, cidx: i32) -> i32;
    fn eventset_component(&self, handle: i32) -> i32;

    fn add_event(&self, handle: i32, code: u32) -> i32;
    fn add_named_event(&self, handle: i32, name: &CStr) -> i32;
    fn remove_event(&self, handle: i32, code: u32) -> i32;
    fn remove_named_event(&self, handle: i32, name: &CStr) -> i32;
    fn num_events(&self, handle: i32) -> i32;
    fn list_events(&self, handle: i32, codes: &mut [i32], len: &mut i32) -> i32;

    fn start(&self, handle: i32) -> i32;
    fn stop(&self, handle: i32, values: &mut [i64]) -> i32;
    fn read(&self, handle: i32, values: &mut [i64]) -> i32;
    fn read_ts(&self, handle: i32, values: &mut [i64], cycles: &mut i64) -> i32;
    fn accum(&self, handle: i32, values: &mut [i64]) -> i32;

    fn thread_init(&self, id_fn: ThreadIdFn) -> i32;
    fn register_thread(&self) -> i32;
    fn unregister_thread(&self) -> i32;
    /// With `ids` absent only the count is written back.
    fn list_threads(&self, ids: Option<&mut [c_ulong]>, count: &mut i32) -> i32;
}

// Reads a `T` at `offset`, the C side gives no alignment guarantees
// for records copied into byte buffers.
#[inline]
pub(crate) fn read_at<T: Copy>(buf: &[u8], offset: usize) -> Option<T> {
    let bytes = buf.get(offset..offset.checked_add(size_of::<T>())?)?;
    Some(unsafe { (bytes.as_ptr() as *const T).read_unaligned() })
}
