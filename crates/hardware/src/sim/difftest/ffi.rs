//! The `dlopen` bridge to an external reference shared object.
//!
//! Loads a NEMU-compatible reference module and exposes it behind
//! [`RefTarget`]. The module must export the difftest ABI:
//! `difftest_init`, `difftest_memcpy`, `difftest_regcpy`, `difftest_exec`,
//! and `difftest_raise_intr`. The `direction` flag on the copy entry points
//! is `true` for copies into REF, matching `DIFFTEST_TO_REF`.

use std::ffi::{CString, c_void};
use std::fmt;
use std::mem;

use tracing::info;

use crate::common::SimError;
use crate::core::arch::CpuState;
use crate::sim::difftest::reference::{Direction, RefTarget};

type MemcpyFn = unsafe extern "C" fn(u32, *mut c_void, usize, bool);
type RegcpyFn = unsafe extern "C" fn(*mut c_void, bool);
type ExecFn = unsafe extern "C" fn(u64);
type RaiseIntrFn = unsafe extern "C" fn(u32);
type InitFn = unsafe extern "C" fn(i32);

/// A reference implementation loaded from a shared object.
pub struct SharedObjectRef {
    handle: *mut c_void,
    memcpy: MemcpyFn,
    regcpy: RegcpyFn,
    exec: ExecFn,
    raise_intr: RaiseIntrFn,
    init: InitFn,
}

impl fmt::Debug for SharedObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedObjectRef")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Resolves one exported symbol, or fails with its name.
fn lookup(handle: *mut c_void, name: &str) -> Result<*mut c_void, SimError> {
    let c_name =
        CString::new(name).map_err(|_| SimError::RefLoad(format!("bad symbol name '{name}'")))?;
    // SAFETY: `handle` is a live handle returned by dlopen; dlsym only reads
    // it and the name string.
    let sym = unsafe { libc::dlsym(handle, c_name.as_ptr()) };
    if sym.is_null() {
        Err(SimError::RefLoad(format!(
            "reference module does not export '{name}'"
        )))
    } else {
        Ok(sym)
    }
}

impl SharedObjectRef {
    /// Opens `path` and resolves the five difftest entry points.
    ///
    /// # Errors
    ///
    /// [`SimError::RefLoad`] if the object cannot be opened or any entry
    /// point is missing.
    pub fn open(path: &str) -> Result<Self, SimError> {
        let c_path =
            CString::new(path).map_err(|_| SimError::RefLoad(format!("bad path '{path}'")))?;
        // SAFETY: dlopen only reads the path string.
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_LAZY) };
        if handle.is_null() {
            return Err(SimError::RefLoad(format!("dlopen failed for '{path}'")));
        }

        let resolve = || -> Result<Self, SimError> {
            // SAFETY: each symbol is an exported function of a
            // NEMU-compatible reference module; the difftest ABI fixes its
            // signature, which the transmuted type mirrors exactly.
            unsafe {
                Ok(Self {
                    handle,
                    memcpy: mem::transmute::<*mut c_void, MemcpyFn>(lookup(
                        handle,
                        "difftest_memcpy",
                    )?),
                    regcpy: mem::transmute::<*mut c_void, RegcpyFn>(lookup(
                        handle,
                        "difftest_regcpy",
                    )?),
                    exec: mem::transmute::<*mut c_void, ExecFn>(lookup(handle, "difftest_exec")?),
                    raise_intr: mem::transmute::<*mut c_void, RaiseIntrFn>(lookup(
                        handle,
                        "difftest_raise_intr",
                    )?),
                    init: mem::transmute::<*mut c_void, InitFn>(lookup(handle, "difftest_init")?),
                })
            }
        };

        match resolve() {
            Ok(bridge) => {
                info!(path, "loaded reference module");
                Ok(bridge)
            }
            Err(e) => {
                // SAFETY: `handle` is live and owned by this function on the
                // error path.
                unsafe {
                    let _ = libc::dlclose(handle);
                }
                Err(e)
            }
        }
    }
}

impl RefTarget for SharedObjectRef {
    fn init(&mut self, port: i32) {
        // SAFETY: entry point resolved in `open`; takes a plain int.
        unsafe { (self.init)(port) }
    }

    fn memcpy(&mut self, addr: u32, buf: &mut [u8], direction: Direction) {
        // SAFETY: `buf` outlives the call and the module accesses at most
        // `buf.len()` bytes of it, per the difftest ABI.
        unsafe {
            (self.memcpy)(
                addr,
                buf.as_mut_ptr().cast(),
                buf.len(),
                direction == Direction::ToRef,
            );
        }
    }

    fn regcpy(&mut self, state: &mut CpuState, direction: Direction) {
        // SAFETY: `CpuState` is `#[repr(C)]` and lays out the register block
        // exactly as the module's `difftest_regcpy` expects.
        unsafe {
            (self.regcpy)(
                std::ptr::from_mut(state).cast(),
                direction == Direction::ToRef,
            );
        }
    }

    fn exec(&mut self, n: u64) {
        // SAFETY: entry point resolved in `open`; takes a plain count.
        unsafe { (self.exec)(n) }
    }

    fn raise_intr(&mut self, no: u32) {
        // SAFETY: entry point resolved in `open`; takes a plain cause code.
        unsafe { (self.raise_intr)(no) }
    }
}

impl Drop for SharedObjectRef {
    fn drop(&mut self) {
        // SAFETY: `handle` came from dlopen and is closed exactly once.
        unsafe {
            let _ = libc::dlclose(self.handle);
        }
    }
}
