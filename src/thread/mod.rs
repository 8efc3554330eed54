
use libc::c_ulong;

use crate::error::Result;
use crate::Papi;

/// Thread support. Every thread that drives event sets must be registered
/// after [`thread_init`][Papi::thread_init] ran once.
impl Papi {
    /// Enables thread support, identifying threads by `pthread_self`.
    pub fn thread_init(&self) -> Result<()> {
        self.check(self.native().thread_init(libc::pthread_self))?;
        Ok(())
    }

    /// Registers the calling thread.
    pub fn register_thread(&self) -> Result<()> {
        self.check(self.native().register_thread())?;
        Ok(())
    }

    pub fn unregister_thread(&self) -> Result<()> {
        self.check(self.native().unregister_thread())?;
        Ok(())
    }

    /// Ids of the registered threads.
    pub fn list_threads(&self) -> Result<Vec<c_ulong>> {
        let native = self.native();
        let mut count = 0;
        self.check(native.list_threads(None, &mut count))?;
        if count <= 0 {
            return Ok(vec![]);
        }

        let mut ids = vec![0; count as usize];
        self.check(native.list_threads(Some(&mut ids), &mut count))?;
        ids.truncate(count.clamp(0, ids.len() as i32) as usize);
        Ok(ids)
    }
}
