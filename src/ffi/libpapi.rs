#![allow(non_snake_case)]

use std::ffi::CStr;
use std::path::Path;
use std::ptr;

use dlopen2::wrapper::{Container, WrapperApi};
use libc::{c_char, c_int, c_longlong, c_ulong, c_void};

use super::{Modifier, Native, ThreadIdFn, OK};
use crate::error::{Error, Result};

// `PAPI_EMISC`, the one generic failure code every release agrees on.
// Returned when the loaded library lacks an entry point.
const MISSING: i32 = -14;
const NULL_RECORD: i32 = -1;

#[derive(WrapperApi)]
struct Api {
    PAPI_library_init: unsafe extern "C" fn(version: c_int) -> c_int,
    PAPI_shutdown: unsafe extern "C" fn(),

    // Since 4.0.
    PAPI_num_components: Option<unsafe extern "C" fn() -> c_int>,
    PAPI_get_component_info: Option<unsafe extern "C" fn(cidx: c_int) -> *const c_void>,
    PAPI_enum_cmp_event:
        Option<unsafe extern "C" fn(code: *mut c_int, modifier: c_int, cidx: c_int) -> c_int>,
    // Before 4.0.
    PAPI_get_substrate_info: Option<unsafe extern "C" fn() -> *const c_void>,

    PAPI_enum_event: unsafe extern "C" fn(code: *mut c_int, modifier: c_int) -> c_int,
    PAPI_get_event_info: unsafe extern "C" fn(code: c_int, info: *mut c_void) -> c_int,

    PAPI_create_eventset: unsafe extern "C" fn(handle: *mut c_int) -> c_int,
    PAPI_cleanup_eventset: unsafe extern "C" fn(handle: c_int) -> c_int,
    PAPI_destroy_eventset: unsafe extern "C" fn(handle: *mut c_int) -> c_int,
    PAPI_assign_eventset_component:
        Option<unsafe extern "C" fn(handle: c_int, cidx: c_int) -> c_int>,
    PAPI_get_eventset_component: Option<unsafe extern "C" fn(handle: c_int) -> c_int>,

    PAPI_add_event: unsafe extern "C" fn(handle: c_int, code: c_int) -> c_int,
    PAPI_add_named_event: Option<unsafe extern "C" fn(handle: c_int, name: *const c_char) -> c_int>,
    PAPI_remove_event: unsafe extern "C" fn(handle: c_int, code: c_int) -> c_int,
    PAPI_remove_named_event:
        Option<unsafe extern "C" fn(handle: c_int, name: *const c_char) -> c_int>,
    PAPI_num_events: unsafe extern "C" fn(handle: c_int) -> c_int,
    PAPI_list_events:
        unsafe extern "C" fn(handle: c_int, codes: *mut c_int, len: *mut c_int) -> c_int,

    PAPI_start: unsafe extern "C" fn(handle: c_int) -> c_int,
    PAPI_stop: unsafe extern "C" fn(handle: c_int, values: *mut c_longlong) -> c_int,
    PAPI_read: unsafe extern "C" fn(handle: c_int, values: *mut c_longlong) -> c_int,
    PAPI_read_ts: Option<
        unsafe extern "C" fn(handle: c_int, values: *mut c_longlong, cycles: *mut c_longlong) -> c_int,
    >,
    PAPI_accum: unsafe extern "C" fn(handle: c_int, values: *mut c_longlong) -> c_int,

    PAPI_thread_init: unsafe extern "C" fn(id_fn: ThreadIdFn) -> c_int,
    PAPI_register_thread: unsafe extern "C" fn() -> c_int,
    PAPI_unregister_thread: unsafe extern "C" fn() -> c_int,
    PAPI_list_threads: unsafe extern "C" fn(ids: *mut c_ulong, count: *mut c_int) -> c_int,
}

/// The system `libpapi`, loaded at runtime.
///
/// Entry points that only exist in some releases are resolved lazily, calling
/// one the loaded library lacks reports `PAPI_EMISC`.
pub struct LibPapi {
    api: Container<Api>,
}

impl LibPapi {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        // Loading runs the library's constructors, nothing more.
        let api = unsafe { Container::<Api>::load(path.as_os_str()) }
            .map_err(|e| Error::Load(format!("{}: {}", path.display(), e)))?;
        Ok(Self { api })
    }
}

// The record getters hand out pointers into library-owned static storage,
// we copy exactly `buf.len()` bytes, which is the size of the layout
// resolved for this very library.
unsafe fn copy_record(src: *const c_void, buf: &mut [u8]) -> i32 {
    if src.is_null() {
        return NULL_RECORD;
    }
    ptr::copy_nonoverlapping(src as *const u8, buf.as_mut_ptr(), buf.len());
    OK
}

impl Native for LibPapi {
    fn library_init(&self, version: i32) -> i32 {
        unsafe { (self.api.PAPI_library_init)(version) }
    }

    fn shutdown(&self) {
        unsafe { (self.api.PAPI_shutdown)() }
    }

    fn num_components(&self) -> i32 {
        match self.api.PAPI_num_components {
            Some(f) => unsafe { f() },
            None => 1,
        }
    }

    fn component_info(&self, cidx: i32, buf: &mut [u8]) -> i32 {
        match self.api.PAPI_get_component_info {
            Some(f) => unsafe { copy_record(f(cidx), buf) },
            None => MISSING,
        }
    }

    fn substrate_info(&self, buf: &mut [u8]) -> i32 {
        match self.api.PAPI_get_substrate_info {
            Some(f) => unsafe { copy_record(f(), buf) },
            None => MISSING,
        }
    }

    fn enum_event(&self, code: &mut u32, modifier: Modifier) -> i32 {
        let code = code as *mut u32 as *mut c_int;
        unsafe { (self.api.PAPI_enum_event)(code, modifier as c_int) }
    }

    fn enum_cmp_event(&self, code: &mut u32, modifier: Modifier, cidx: i32) -> i32 {
        let code = code as *mut u32 as *mut c_int;
        match self.api.PAPI_enum_cmp_event {
            Some(f) => unsafe { f(code, modifier as c_int, cidx) },
            None => MISSING,
        }
    }

    fn event_info(&self, code: u32, buf: &mut [u8]) -> i32 {
        unsafe { (self.api.PAPI_get_event_info)(code as c_int, buf.as_mut_ptr() as *mut c_void) }
    }

    fn create_eventset(&self, handle: &mut i32) -> i32 {
        unsafe { (self.api.PAPI_create_eventset)(handle) }
    }

    fn cleanup_eventset(&self, handle: i32) -> i32 {
        unsafe { (self.api.PAPI_cleanup_eventset)(handle) }
    }

    fn destroy_eventset(&self, handle: &mut i32) -> i32 {
        unsafe { (self.api.PAPI_destroy_eventset)(handle) }
    }

    fn assign_eventset_component(&self, handle: i32, cidx: i32) -> i32 {
        match self.api.PAPI_assign_eventset_component {
            Some(f) => unsafe { f(handle, cidx) },
            None => MISSING,
        }
    }

    fn eventset_component(&self, handle: i32) -> i32 {
        match self.api.PAPI_get_eventset_component {
            Some(f) => unsafe { f(handle) },
            None => MISSING,
        }
    }

    fn add_event(&self, handle: i32, code: u32) -> i32 {
        unsafe { (self.api.PAPI_add_event)(handle, code as c_int) }
    }

    fn add_named_event(&self, handle: i32, name: &CStr) -> i32 {
        match self.api.PAPI_add_named_event {
            Some(f) => unsafe { f(handle, name.as_ptr()) },
            None => MISSING,
        }
    }

    fn remove_event(&self, handle: i32, code: u32) -> i32 {
        unsafe { (self.api.PAPI_remove_event)(handle, code as c_int) }
    }

    fn remove_named_event(&self, handle: i32, name: &CStr) -> i32 {
        match self.api.PAPI_remove_named_event {
            Some(f) => unsafe { f(handle, name.as_ptr()) },
            None => MISSING,
        }
    }

    fn num_events(&self, handle: i32) -> i32 {
        unsafe { (self.api.PAPI_num_events)(handle) }
    }

    fn list_events(&self, handle: i32, codes: &mut [i32], len: &mut i32) -> i32 {
        // The library writes at most `*len` codes.
        *len = (*len).min(codes.len() as i32);
        unsafe { (self.api.PAPI_list_events)(handle, codes.as_mut_ptr(), len) }
    }

    fn start(&self, handle: i32) -> i32 {
        unsafe { (self.api.PAPI_start)(handle) }
    }

    fn stop(&self, handle: i32, values: &mut [i64]) -> i32 {
        unsafe { (self.api.PAPI_stop)(handle, values.as_mut_ptr()) }
    }

    fn read(&self, handle: i32, values: &mut [i64]) -> i32 {
        unsafe { (self.api.PAPI_read)(handle, values.as_mut_ptr()) }
    }

    fn read_ts(&self, handle: i32, values: &mut [i64], cycles: &mut i64) -> i32 {
        match self.api.PAPI_read_ts {
            Some(f) => unsafe { f(handle, values.as_mut_ptr(), cycles) },
            None => MISSING,
        }
    }

    fn accum(&self, handle: i32, values: &mut [i64]) -> i32 {
        unsafe { (self.api.PAPI_accum)(handle, values.as_mut_ptr()) }
    }

    fn thread_init(&self, id_fn: ThreadIdFn) -> i32 {
        unsafe { (self.api.PAPI_thread_init)(id_fn) }
    }

    fn register_thread(&self) -> i32 {
        unsafe { (self.api.PAPI_register_thread)() }
    }

    fn unregister_thread(&self) -> i32 {
        unsafe { (self.api.PAPI_unregister_thread)() }
    }

    fn list_threads(&self, ids: Option<&mut [c_ulong]>, count: &mut i32) -> i32 {
        let ids = match ids {
            Some(ids) => {
                *count = (*count).min(ids.len() as i32);
                ids.as_mut_ptr()
            }
            None => ptr::null_mut(),
        };
        unsafe { (self.api.PAPI_list_threads)(ids, count) }
    }
}

// Value buffers are `long long` on the C side.
const _: () = assert!(size_of::<c_longlong>() == size_of::<i64>());
