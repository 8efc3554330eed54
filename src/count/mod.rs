use std::ffi::CString;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::event::{AsCode, Catalog, Component, Event};
use crate::ffi::PAPI_NULL;
use crate::Papi;

mod probe;

/// Where an [`EventSet`] is in its measurement cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Created,
    Running,
    Stopped,
}

/// A group of counters started, stopped and read together.
///
/// Membership can only change while the set is not running. The member
/// count is always the one the library reports, never a local tally, since
/// the library may merge or expand events on its own.
///
/// There is no internal locking: the library keeps per-set state of its
/// own, so drive each set from one thread at a time.
pub struct EventSet<'p> {
    pub(crate) papi: &'p Papi,
    pub(crate) handle: i32,
    size: usize,
    state: State,
}

impl<'p> EventSet<'p> {
    pub fn new(papi: &'p Papi) -> Result<Self> {
        let mut handle = PAPI_NULL;
        papi.check(papi.native().create_eventset(&mut handle))?;
        Ok(Self {
            papi,
            handle,
            size: 0,
            state: State::Created,
        })
    }

    /// Opaque handle the library knows this set by.
    pub fn handle(&self) -> i32 {
        self.handle
    }

    /// Number of members, as last reported by the library.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Binds the set to `component`. Must happen before adding native events
    /// of any component other than the default one.
    pub fn assign_component(&mut self, component: &Component) -> Result<()> {
        let native = self.papi.native();
        self.papi
            .check(native.assign_eventset_component(self.handle, component.index))?;
        Ok(())
    }

    /// Index of the component this set is bound to.
    pub fn component(&self) -> Result<i32> {
        self.papi
            .check(self.papi.native().eventset_component(self.handle))
    }

    /// Adds events by code, stopping at the first one the library rejects.
    ///
    /// Members added before the rejection stay in the set.
    pub fn add<I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsCode,
    {
        self.mutate(|papi, handle| {
            for event in events {
                papi.check(papi.native().add_event(handle, event.as_code()))?;
            }
            Ok(())
        })
    }

    /// Adds events by name, e.g. `perf::L2_RQSTS:MISS:cpu=0`.
    pub fn add_named<I>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.mutate(|papi, handle| {
            for name in names {
                let name = CString::new(name.as_ref())?;
                papi.check(papi.native().add_named_event(handle, &name))?;
            }
            Ok(())
        })
    }

    pub fn remove<I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsCode,
    {
        self.mutate(|papi, handle| {
            for event in events {
                papi.check(papi.native().remove_event(handle, event.as_code()))?;
            }
            Ok(())
        })
    }

    pub fn remove_named<I>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.mutate(|papi, handle| {
            for name in names {
                let name = CString::new(name.as_ref())?;
                papi.check(papi.native().remove_named_event(handle, &name))?;
            }
            Ok(())
        })
    }

    /// Removes every member at once.
    pub fn cleanup(&mut self) -> Result<()> {
        self.mutate(|papi, handle| {
            papi.check(papi.native().cleanup_eventset(handle))?;
            Ok(())
        })
    }

    // Runs a membership change, then refreshes `size` whether it failed or not.
    fn mutate<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&Papi, i32) -> Result<()>,
    {
        if self.state == State::Running {
            return Err(Error::Running);
        }
        let result = f(self.papi, self.handle);
        let refreshed = self.refresh();
        result.and(refreshed)
    }

    pub(crate) fn refresh(&mut self) -> Result<()> {
        let n = self
            .papi
            .check(self.papi.native().num_events(self.handle))?;
        self.size = n as usize;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.papi.check(self.papi.native().start(self.handle))?;
        self.state = State::Running;
        Ok(())
    }

    /// Stops counting and returns the final values, one per member in the
    /// order the library lists them.
    pub fn stop(&mut self) -> Result<Vec<i64>> {
        let mut values = vec![0; self.size];
        self.papi
            .check(self.papi.native().stop(self.handle, &mut values))?;
        self.state = State::Stopped;
        Ok(values)
    }

    /// Current values without stopping.
    pub fn read(&self) -> Result<Vec<i64>> {
        let mut values = vec![0; self.size];
        self.papi
            .check(self.papi.native().read(self.handle, &mut values))?;
        Ok(values)
    }

    /// Current values and the cycle count sampled in the same call.
    pub fn read_ts(&self) -> Result<(Vec<i64>, i64)> {
        let mut values = vec![0; self.size];
        let mut cycles = 0;
        let native = self.papi.native();
        self.papi
            .check(native.read_ts(self.handle, &mut values, &mut cycles))?;
        Ok((values, cycles))
    }

    /// Adds the counts since the last read into `values` and resets the
    /// counters. `values` must hold exactly one slot per member.
    pub fn accumulate<'v>(&self, values: &'v mut [i64]) -> Result<&'v [i64]> {
        if values.len() != self.size {
            return Err(Error::Length {
                expected: self.size,
                actual: values.len(),
            });
        }
        self.papi.check(self.papi.native().accum(self.handle, values))?;
        Ok(values)
    }

    /// Member codes in library order.
    pub fn codes(&self) -> Result<Vec<u32>> {
        let native = self.papi.native();
        let n = self.papi.check(native.num_events(self.handle))?;
        let mut codes = vec![0; n as usize];
        let mut len = n;
        self.papi
            .check(native.list_events(self.handle, &mut codes, &mut len))?;
        codes.truncate(len.clamp(0, n) as usize);
        Ok(codes.into_iter().map(|c| c as u32).collect())
    }

    /// Members resolved through `catalog`, `None` for codes it does not know
    /// (unit masks, qualified events).
    pub fn list_events(&self, catalog: &Catalog) -> Result<Vec<Option<Arc<Event>>>> {
        let codes = self.codes()?;
        Ok(codes
            .into_iter()
            .map(|code| catalog.event(code).cloned())
            .collect())
    }

    /// Releases the set. A running set is stopped and emptied first.
    pub fn destroy(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.state == State::Running {
            self.stop()?;
        }
        if self.size > 0 {
            self.cleanup()?;
        }
        let native = self.papi.native();
        self.papi
            .check(native.destroy_eventset(&mut self.handle))?;
        self.handle = PAPI_NULL;
        Ok(())
    }
}

impl Drop for EventSet<'_> {
    fn drop(&mut self) {
        if self.handle == PAPI_NULL {
            return;
        }
        if let Err(e) = self.release() {
            log::warn!("failed to release event set {}: {}", self.handle, e);
        }
    }
}
