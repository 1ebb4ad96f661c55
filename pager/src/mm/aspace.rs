//! Address-Space Manager
//!
//! Запускается один раз при старте / Runs once at startup:
//!   1. размер страницы от платформы        / page size from the platform
//!   2. пробное резервирование диапазона    / probe reservation
//!   3. освобождение массива и запаса       / release array + slack
//!   4. потолок RLIMIT_AS                   / RLIMIT_AS ceiling
//!   5. проверка запаса под K страниц       / headroom check for K pages
//!
//! Раскладка пробного резервирования / Probe reservation layout:
//!
//!   ┌───────┬────────────────────────┬───────┬──────────────────────┐
//!   │ guard │ массив / array (N × 8) │ guard │ запас / slack (limit)│
//!   └───────┴────────────────────────┴───────┴──────────────────────┘
//!    держим   освобождаем              держим  освобождаем
//!    kept     released                 kept    released
//!
//! Guard-страницы (PROT_NONE) остаются, чтобы индекс -1 и индекс N
//! гарантированно вызывали fault, а не читали чужую память. Новые mmap
//! ядро ставит сверху вниз, поэтому они садятся в запас, а не в массив.
//! Guard pages (PROT_NONE) stay so index -1 and index N always fault instead
//! of reading foreign memory. The kernel places new mmaps top-down, so they
//! land in the slack rather than in the array.

use libsqrtvm::{ArrayRegion, Error, PageGeometry, Result, ELEM_SIZE};

use super::{procfs, vmm};
use crate::arch::current::{last_errno, page_size};
use crate::config::Layout;

pub struct AddressSpace {
    region:  ArrayRegion,
    ceiling: u64,
    guards:  [usize; 2],
}

impl AddressSpace {
    pub fn initialize(layout: &Layout) -> Result<Self> {
        let geometry = PageGeometry::new(page_size()?, ELEM_SIZE)?;
        let page = geometry.page_size();

        let array_bytes = layout
            .elements
            .checked_mul(ELEM_SIZE)
            .map(|b| b.next_multiple_of(page))
            .ok_or(Error::Overflow { len: layout.elements })?;
        let slack = layout.ceiling as usize;
        let total = page + array_bytes + page + slack;

        // Только чтобы найти безопасное место для таблицы.
        // Only mapping to find a safe location for the table.
        let probe = vmm::reserve(total)?;
        let base = probe + page;
        let tail_guard = base + array_bytes;
        log::debug!("[mm] probe {:#x}..{:#x} ({} bytes)", probe, probe + total, total);

        // Освобождаем, чтобы остаться под потолком.
        // Release to stay under the ceiling.
        vmm::release(base, array_bytes)?;
        vmm::release(tail_guard + page, slack)?;

        let region = ArrayRegion::new(base, layout.elements, geometry)?;
        install_ceiling(layout.ceiling)?;
        log::info!("[mm] RLIMIT_AS = {} bytes", layout.ceiling);

        let space = Self { region, ceiling: layout.ceiling, guards: [probe, tail_guard] };
        space.check_headroom(layout.resident_pages)?;
        Ok(space)
    }

    pub fn region(&self) -> &ArrayRegion { &self.region }
    pub fn ceiling(&self) -> u64 { self.ceiling }
    pub fn guards(&self) -> [usize; 2] { self.guards }

    /// Текущий коммит + K резидентных страниц должны влезть под потолок.
    /// Current commitment + K resident pages must fit under the ceiling.
    pub fn check_headroom(&self, resident_pages: usize) -> Result<()> {
        let needed = (resident_pages * self.region.geometry().page_size()) as u64;
        let committed = match procfs::vm_size() {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("[mm] VmSize unavailable ({}), skipping headroom check", err);
                return Ok(());
            }
        };
        log::debug!("[mm] committed {} bytes, {} resident bytes needed", committed, needed);
        if committed + needed > self.ceiling {
            return Err(Error::Headroom { committed, needed, ceiling: self.ceiling });
        }
        Ok(())
    }
}

/// Мягкий и жёсткий лимит сразу: после установки не меняется.
/// Soft and hard limit at once: never changed after installation.
fn install_ceiling(bytes: u64) -> Result<()> {
    let lim = libc::rlimit { rlim_cur: bytes as libc::rlim_t, rlim_max: bytes as libc::rlim_t };
    if unsafe { libc::setrlimit(libc::RLIMIT_AS, &lim) } == -1 {
        return Err(Error::Limit { bytes, errno: last_errno() });
    }
    Ok(())
}
