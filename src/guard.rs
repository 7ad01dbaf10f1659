use std::fmt::Display;
use std::sync::Arc;

use crate::traits::{NativeClient, NativeResult};

type Release<H> = fn(&dyn NativeClient, H) -> NativeResult<()>;

/// Owns a native handle and releases it exactly once.
///
/// Dropping an armed guard runs its release call and suppresses the error,
/// if any. Paths that finalize the handle themselves (commit, explicit close)
/// either `release` the guard to observe the error or `disarm` it after a
/// successful native call.
pub(crate) struct Guarded<H: Copy + Display> {
    client: Arc<dyn NativeClient>,
    handle: H,
    release: Release<H>,
    armed: bool,
}

impl<H: Copy + Display> Guarded<H> {
    pub(crate) fn new(client: Arc<dyn NativeClient>, handle: H, release: Release<H>) -> Self {
        Self {
            client,
            handle,
            release,
            armed: true,
        }
    }

    pub(crate) fn get(&self) -> H {
        self.handle
    }

    /// Gives up ownership without releasing.
    pub(crate) fn disarm(mut self) -> H {
        self.armed = false;
        self.handle
    }

    /// Releases now and reports the outcome.
    pub(crate) fn release(mut self) -> NativeResult<()> {
        self.armed = false;
        (self.release)(&*self.client, self.handle)
    }
}

impl<H: Copy + Display> Drop for Guarded<H> {
    fn drop(&mut self) {
        if self.armed {
            self.armed = false;
            if let Err(e) = (self.release)(&*self.client, self.handle) {
                tracing::warn!(
                    handle = %self.handle,
                    error = %e,
                    "suppressed error while releasing native handle"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::drivers::{InMemoryTestClient, NativeCall};
    use crate::traits::{AttachParams, ConnectionHandle, NativeClient};

    fn attach(client: &Arc<InMemoryTestClient>) -> ConnectionHandle {
        client.attach("guard.fdb", &AttachParams::default()).unwrap()
    }

    #[test]
    fn test_drop_releases_once() {
        let client = Arc::new(InMemoryTestClient::new());
        let handle = attach(&client);
        {
            let guard = Guarded::new(
                Arc::clone(&client) as Arc<dyn NativeClient>,
                handle,
                |c, h| c.detach(h),
            );
            assert_eq!(guard.get(), handle);
        }
        assert_eq!(client.count_calls(|c| matches!(c, NativeCall::Detach { .. })), 1);
    }

    #[test]
    fn test_disarm_skips_release() {
        let client = Arc::new(InMemoryTestClient::new());
        let handle = attach(&client);
        let guard = Guarded::new(
            Arc::clone(&client) as Arc<dyn NativeClient>,
            handle,
            |c, h| c.detach(h),
        );
        assert_eq!(guard.disarm(), handle);
        assert_eq!(client.count_calls(|c| matches!(c, NativeCall::Detach { .. })), 0);
    }

    #[test]
    fn test_drop_suppresses_release_errors() {
        let client = Arc::new(InMemoryTestClient::new());
        let handle = attach(&client);
        client.detach(handle).unwrap();
        // Detaching an already detached handle fails; the guard must swallow it.
        let guard = Guarded::new(
            Arc::clone(&client) as Arc<dyn NativeClient>,
            handle,
            |c, h| c.detach(h),
        );
        drop(guard);
        let second = Guarded::new(
            Arc::clone(&client) as Arc<dyn NativeClient>,
            handle,
            |c, h| c.detach(h),
        );
        assert!(second.release().is_err());
    }
}
