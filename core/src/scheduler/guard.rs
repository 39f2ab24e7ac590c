use std::sync::atomic::{AtomicBool, Ordering};

/// Non-reentrant guard allowing at most one fetch in flight.
#[derive(Debug, Default)]
pub struct FetchState {
    is_loading: AtomicBool,
}

impl FetchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the guard; `false` means a fetch is already running.
    pub fn try_begin(&self) -> bool {
        self.is_loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn finish(&self) {
        self.is_loading.store(false, Ordering::Release);
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::Acquire)
    }

    /// Releases the claim when dropped, including on unwind or task abort.
    pub fn release_on_drop(&self) -> InFlight<'_> {
        InFlight { state: self }
    }
}

pub struct InFlight<'a> {
    state: &'a FetchState,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_fails_until_finished() {
        let state = FetchState::new();
        assert!(state.try_begin());
        assert!(state.is_loading());
        assert!(!state.try_begin());
        state.finish();
        assert!(!state.is_loading());
        assert!(state.try_begin());
    }

    #[test]
    fn in_flight_guard_releases_on_panic() {
        let state = FetchState::new();
        assert!(state.try_begin());
        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _in_flight = state.release_on_drop();
            panic!("renderer blew up");
        }));
        assert!(unwound.is_err());
        assert!(!state.is_loading());
    }
}
