//! Runtime-negotiated bindings for the PAPI hardware counter library.
//!
//! `libpapi` changed its struct layouts, error codes and discovery entry
//! points many times over its releases. This crate loads whatever version is
//! installed, finds out which one it is, and talks to it with the matching
//! layouts.
//!
//! ## Example
//!
//! Count retired instructions for the (inefficient) fibonacci calculation.
//!
//! ```rust,no_run
//! use papi_dyn::config::Opts;
//! use papi_dyn::count::EventSet;
//! use papi_dyn::event::Catalog;
//! use papi_dyn::Papi;
//!
//! let papi = Papi::init(Opts::default()).unwrap();
//! let catalog = Catalog::discover(&papi).unwrap();
//!
//! let instrs = catalog.preset("TOT_INS").unwrap();
//! let mut set = EventSet::new(&papi).unwrap();
//! set.add([instrs]).unwrap();
//!
//! set.start().unwrap();
//! fn fib(n: usize) -> usize {
//!     match n {
//!         0 => 0,
//!         1 => 1,
//!         n => fib(n - 1) + fib(n - 2),
//!     }
//! }
//! std::hint::black_box(fib(30));
//! let values = set.stop().unwrap();
//!
//! println!("{} instructions retired", values[0]);
//! set.destroy().unwrap();
//! ```
//!
//! ## Library compatibility
//!
//! Any release from 3.0 up to 6.x is supported. The version is negotiated
//! once per process; see [`Opts`] to narrow the search.

pub mod config;
pub mod count;
pub mod error;
pub mod event;
pub mod ffi;
pub mod layout;
mod thread;
pub mod version;

use std::sync::{Arc, Mutex};

use crate::config::Opts;
use crate::error::{ErrorTable, Result};
use crate::ffi::libpapi::LibPapi;
use crate::ffi::Native;
use crate::layout::Layouts;
use crate::version::Version;

static VERSION: Mutex<Option<Version>> = Mutex::new(None);

/// An initialized library together with everything derived from its version.
///
/// Not `Clone`: event sets borrow the context they were created from, share
/// it through an `Arc` if several owners are needed.
pub struct Papi {
    native: Arc<dyn Native>,
    version: Version,
    layouts: Layouts,
    errors: ErrorTable,
    opts: Opts,
}

impl Papi {
    /// Loads `opts.library` and negotiates its version.
    ///
    /// The version search runs on the first call only, later calls reuse the
    /// negotiated version and merely initialize the library again. Concurrent
    /// first calls wait for a single search.
    pub fn init(opts: Opts) -> Result<Self> {
        let native: Arc<dyn Native> = Arc::new(LibPapi::open(&opts.library)?);
        let version = version::negotiate(native.as_ref(), &opts, &VERSION)?;
        Ok(Self::new(native, version, opts))
    }

    /// Negotiates with an arbitrary [`Native`] implementation.
    ///
    /// Unlike [`init`][Self::init] this always runs the version search.
    pub fn with_native(native: Arc<dyn Native>, opts: Opts) -> Result<Self> {
        let version = version::resolve(native.as_ref(), &opts)?;
        Ok(Self::new(native, version, opts))
    }

    fn new(native: Arc<dyn Native>, version: Version, opts: Opts) -> Self {
        Self {
            native,
            version,
            layouts: Layouts::resolve(version),
            errors: ErrorTable::new(version),
            opts,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn layouts(&self) -> &Layouts {
        &self.layouts
    }

    pub fn errors(&self) -> &ErrorTable {
        &self.errors
    }

    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    pub fn native(&self) -> &dyn Native {
        self.native.as_ref()
    }

    /// Classifies `status`, returning it unchanged when non-negative.
    pub fn check(&self, status: i32) -> Result<i32> {
        self.errors.check(status)
    }

    /// Releases every library resource.
    ///
    /// Event sets borrow their `Papi`, so none can outlive the shutdown:
    ///
    /// ```rust,compile_fail
    /// use papi_dyn::config::Opts;
    /// use papi_dyn::count::EventSet;
    /// use papi_dyn::Papi;
    ///
    /// let papi = Papi::init(Opts::default()).unwrap();
    /// let set = EventSet::new(&papi).unwrap();
    /// papi.shutdown();
    /// drop(set);
    /// ```
    pub fn shutdown(self) {
        self.native.shutdown();
    }
}
