use std::ffi::CString;
use std::fmt;
use std::sync::Arc;

use super::{EventSet, State};
use crate::error::{Error, ErrorKind, Result};
use crate::event::{Catalog, Event};
use crate::ffi::OK;
use crate::layout::COMPONENTS_SINCE;

#[derive(Clone, Copy)]
enum Attempt<'a> {
    Code(u32),
    Name(&'a str),
}

impl fmt::Display for Attempt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{:#x}", code),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Undoes a tentative addition when dropped.
///
/// Removes every member that was not there when the guard was taken, whether
/// the addition was accepted, partially applied or expanded into several
/// members by the library. If the members cannot be listed, the attempted
/// event itself is removed.
struct Tentative<'s, 'p, 'a> {
    set: &'s EventSet<'p>,
    attempt: Attempt<'a>,
    before: Vec<u32>,
}

impl<'s, 'p, 'a> Tentative<'s, 'p, 'a> {
    fn new(set: &'s EventSet<'p>, attempt: Attempt<'a>) -> Result<Self> {
        Ok(Self {
            set,
            attempt,
            before: set.codes()?,
        })
    }

    fn remove_attempted(&self) {
        let native = self.set.papi.native();
        let status = match self.attempt {
            Attempt::Code(code) => native.remove_event(self.set.handle, code),
            Attempt::Name(name) => match CString::new(name) {
                Ok(name) => native.remove_named_event(self.set.handle, &name),
                Err(_) => return,
            },
        };
        if status < OK {
            log::warn!("failed to roll back {}: {}", self.attempt, status);
        }
    }
}

// Members of `now` not accounted for by `before`, duplicates included.
fn residue(before: &[u32], now: &[u32]) -> Vec<u32> {
    let mut old = before.to_vec();
    let mut new = vec![];
    for code in now {
        match old.iter().position(|c| c == code) {
            Some(pos) => {
                old.swap_remove(pos);
            }
            None => new.push(*code),
        }
    }
    new
}

impl Drop for Tentative<'_, '_, '_> {
    fn drop(&mut self) {
        let now = match self.set.codes() {
            Ok(now) => now,
            Err(e) => {
                log::warn!("cannot list event set {}: {}", self.set.handle, e);
                self.remove_attempted();
                return;
            }
        };
        let native = self.set.papi.native();
        for code in residue(&self.before, &now) {
            let status = native.remove_event(self.set.handle, code);
            if status < OK {
                log::warn!("failed to roll back {:#x}: {}", code, status);
            }
        }
    }
}

impl EventSet<'_> {
    /// Finds the catalog events this set can actually count.
    ///
    /// Candidates are the presets of the bound component when `presets` is
    /// set and it has any, its native events otherwise. Each candidate is
    /// added tentatively and rolled back right away, so membership is the same
    /// before and after the call. Native events the library rejects by code
    /// are retried by name: each unit mask, then each unit mask with the
    /// configured [`Qualifier`][crate::config::Qualifier], or for events
    /// without masks the qualified base name. Events already in the set count
    /// as usable without another addition, the library refuses duplicates.
    pub fn probe(&mut self, catalog: &Catalog, presets: bool) -> Result<Vec<Arc<Event>>> {
        if self.state == State::Running {
            return Err(Error::Running);
        }
        let cidx = self.bound_component()?;
        let component = catalog.component(cidx).ok_or(Error::NoComponent(cidx))?;

        let candidates = match component.presets() {
            Some(list) if presets && !list.is_empty() => list,
            _ => component.native(),
        };

        let members = self.codes()?;
        let mut usable = vec![];
        for event in candidates {
            if members.contains(&event.code()) || self.usable(event)? {
                usable.push(Arc::clone(event));
            }
        }
        self.refresh()?;

        log::debug!(
            "{} of {} events usable on component {}",
            usable.len(),
            candidates.len(),
            cidx
        );
        Ok(usable)
    }

    // Sets bound to no component count on the default one, as does every set
    // before the component API existed.
    fn bound_component(&self) -> Result<i32> {
        if self.papi.version() < COMPONENTS_SINCE {
            return Ok(0);
        }
        match self.component() {
            Ok(cidx) => Ok(cidx),
            Err(e) if e.kind() == ErrorKind::ComponentNotFound => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn usable(&self, event: &Event) -> Result<bool> {
        if self.attempt(Attempt::Code(event.code()))? {
            return Ok(true);
        }

        let qualifier = &self.papi.opts().qualifier;
        if event.masks.is_empty() {
            return match qualifier.apply(event.info.base_name()) {
                Some(name) => self.attempt(Attempt::Name(&name)),
                None => Ok(false),
            };
        }

        for mask in &event.masks {
            if self.attempt(Attempt::Name(&mask.info.symbol))? {
                return Ok(true);
            }
        }
        for mask in &event.masks {
            if let Some(name) = qualifier.apply(&mask.info.symbol) {
                if self.attempt(Attempt::Name(&name))? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn attempt(&self, attempt: Attempt<'_>) -> Result<bool> {
        let _guard = Tentative::new(self, attempt)?;
        let native = self.papi.native();
        let status = match attempt {
            Attempt::Code(code) => native.add_event(self.handle, code),
            Attempt::Name(name) => {
                let name = CString::new(name)?;
                native.add_named_event(self.handle, &name)
            }
        };
        log::trace!("probe {} on event set {}: {}", attempt, self.handle, status);
        Ok(status >= OK)
    }
}
