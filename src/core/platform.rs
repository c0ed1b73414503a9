//! Whether the operating system itself runs in 64-bit mode.
//!
//! A 64-bit process can only exist on a 64-bit OS. A 32-bit process may be
//! running under a 64-bit kernel (WOW64, compat mode), so it has to ask for
//! the native machine instead of looking at its own build target.
//!
//! On Linux the answer comes from `uname(2)`, which honours the process
//! personality: under `linux32` (`PER_LINUX32`) a 64-bit kernel reports
//! `i686` and this returns false.

use tracing::trace;

pub fn os_is_64bit() -> bool {
    if cfg!(target_pointer_width = "64") {
        return true;
    }
    native_machine()
        .map(|m| {
            trace!(machine = %m, "Native machine");
            is_64bit_machine(&m)
        })
        .unwrap_or(false)
}

/// `x86_64` (Unix `uname`) and `AMD64` (Windows) are the two spellings.
pub fn is_64bit_machine(machine: &str) -> bool {
    machine.eq_ignore_ascii_case("x86_64") || machine.eq_ignore_ascii_case("amd64")
}

#[cfg(unix)]
fn native_machine() -> Option<String> {
    use std::ffi::CStr;

    let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut uts) } != 0 {
        return None;
    }
    let machine = unsafe { CStr::from_ptr(uts.machine.as_ptr()) };
    Some(machine.to_string_lossy().into_owned())
}

#[cfg(windows)]
fn native_machine() -> Option<String> {
    use winapi::um::sysinfoapi::{GetNativeSystemInfo, SYSTEM_INFO};
    use winapi::um::winnt::PROCESSOR_ARCHITECTURE_AMD64;

    // Unlike GetSystemInfo, this sees through WOW64.
    let mut si: SYSTEM_INFO = unsafe { std::mem::zeroed() };
    unsafe { GetNativeSystemInfo(&mut si) };
    let arch = unsafe { si.u.s().wProcessorArchitecture };
    if arch == PROCESSOR_ARCHITECTURE_AMD64 {
        Some("AMD64".to_string())
    } else {
        Some(format!("arch-{}", arch))
    }
}

#[cfg(not(any(unix, windows)))]
fn native_machine() -> Option<String> {
    None
}
