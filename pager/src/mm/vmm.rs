//! Virtual Memory — mmap / munmap
//!
//! `MmapBackend` — реализация `PageBackend` поверх anonymous mmap.
//! `MmapBackend` implements `PageBackend` on top of anonymous mmap.

use core::{ptr, slice};

use libsqrtvm::{Error, PageBackend, PageGeometry, Placement, Protection, Result};

use crate::arch::current::last_errno;

fn prot_bits(prot: Protection) -> libc::c_int {
    let mut bits = libc::PROT_NONE;
    if prot.contains(Protection::READ)  { bits |= libc::PROT_READ; }
    if prot.contains(Protection::WRITE) { bits |= libc::PROT_WRITE; }
    if prot.contains(Protection::EXEC)  { bits |= libc::PROT_EXEC; }
    bits
}

/// Зарезервировать `len` байт адресов без прав и без backing'а.
/// Reserve `len` bytes of addresses with no permissions and no backing.
pub fn reserve(len: usize) -> Result<usize> {
    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_NONE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE,
            -1,
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        return Err(Error::Reserve { len, errno: last_errno() });
    }
    Ok(addr as usize)
}

/// Вернуть диапазон адресов системе / Give an address range back
pub fn release(addr: usize, len: usize) -> Result<()> {
    if unsafe { libc::munmap(addr as *mut libc::c_void, len) } == -1 {
        return Err(Error::Release { addr, errno: last_errno() });
    }
    Ok(())
}

pub struct MmapBackend {
    geometry: PageGeometry,
}

impl MmapBackend {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }
}

impl PageBackend for MmapBackend {
    fn map(&mut self, page: usize, prot: Protection, placement: Placement) -> Result<&mut [f64]> {
        // NOREPLACE: чужой маппинг в освобождённом диапазоне → EEXIST,
        // а не молчаливая перезапись.
        // NOREPLACE: a foreign mapping in the released range → EEXIST
        // rather than silently clobbering it.
        let fixed = match placement {
            Placement::Exclusive => libc::MAP_FIXED_NOREPLACE,
            Placement::Replace   => libc::MAP_FIXED,
        };
        let size = self.geometry.page_size();
        let addr = unsafe {
            libc::mmap(
                page as *mut libc::c_void,
                size,
                prot_bits(prot),
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | fixed,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(Error::Map { addr: page, errno: last_errno() });
        }
        // Ядра до 4.17 не знают NOREPLACE и считают адрес подсказкой.
        // Kernels before 4.17 ignore NOREPLACE and treat the address as a hint.
        if addr as usize != page {
            unsafe { libc::munmap(addr, size) };
            return Err(Error::Misplaced { want: page, got: addr as usize });
        }
        // SAFETY: свежий RW-маппинг ровно одной страницы, выровнен под f64,
        // живёт до unmap(); резолвер не держит срез дольше fill.
        // Fresh RW mapping of exactly one page, f64-aligned, alive until
        // unmap(); the resolver does not hold the slice past fill.
        Ok(unsafe { slice::from_raw_parts_mut(addr.cast::<f64>(), self.geometry.elems_per_page()) })
    }

    fn unmap(&mut self, page: usize) -> Result<()> {
        if unsafe { libc::munmap(page as *mut libc::c_void, self.geometry.page_size()) } == -1 {
            return Err(Error::Unmap { addr: page, errno: last_errno() });
        }
        Ok(())
    }
}
