//! Diagnostics channel for non-fatal faults.
//!
//! Lookup misses, rejected snapshot rows and thumbnail failures are reported
//! here and recovered locally; nothing in this module can fail the caller.
//! On wasm32 the messages land in the browser console, on native builds
//! (tests) they are dropped.

#[cfg(target_arch = "wasm32")]
pub(crate) fn warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn warn(_message: &str) {}
