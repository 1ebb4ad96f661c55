//! Linux: sysconf, errno, сигналы / sysconf, errno, signals

pub mod signal;

use libsqrtvm::{Errno, Error, Result};

/// Размер страницы от платформы / Page size from the platform
pub fn page_size() -> Result<usize> {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        return Err(Error::PageSize { page_size: 0 });
    }
    Ok(size as usize)
}

pub fn errno() -> i32 {
    unsafe { *libc::__errno_location() }
}

/// Обработчик сигнала обязан вернуть errno прерванного кода.
/// A signal handler must hand the interrupted code its errno back.
pub fn set_errno(value: i32) {
    unsafe { *libc::__errno_location() = value };
}

pub fn last_errno() -> Errno {
    Errno(errno())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_a_power_of_two() {
        let size = page_size().unwrap();
        assert!(size.is_power_of_two());
        assert!(size >= 4096);
    }

    #[test]
    fn errno_round_trips() {
        let saved = errno();
        set_errno(libc::EEXIST);
        assert_eq!(last_errno(), Errno(libc::EEXIST));
        set_errno(saved);
    }
}
