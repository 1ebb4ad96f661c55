//! libsqrtvm — ядро страничной подкачки по требованию
//! libsqrtvm — demand-paging core
//!
//! Платформенно-независимая часть: оракул, геометрия страниц, диапазон
//! логического массива и автомат резолвера page fault'ов.
//! Platform-independent part: oracle, page geometry, logical array range
//! and the page-fault resolver state machine.
//!
//! Использование / Usage:
//!   let region   = ArrayRegion::new(base, len, geometry)?;
//!   let mut res  = Resolver::<_, 1>::new(region, backend);
//!   res.resolve(fault_addr)?;

pub mod geometry;
pub mod oracle;
pub mod region;
pub mod resident;
pub mod resolver;

pub use geometry::PageGeometry;
pub use region::{ArrayRegion, PageSlice};
pub use resident::ResidentSet;
pub use resolver::{PageBackend, Placement, Protection, Resolution, Resolver, Stats};

/// Размер элемента логического массива / Logical array element size
pub const ELEM_SIZE: usize = core::mem::size_of::<f64>();

/// Ошибки ядра подкачки / Pager errors
///
/// `errno` хранится числом: форматирование не должно аллоцировать,
/// ошибки печатаются из обработчика сигнала.
/// `errno` is kept as a raw number: formatting must not allocate, errors
/// are printed from signal-handler context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("SIGSEGV at address outside sqrt table: {addr:#x}")]
    OutOfDomain { addr: usize },

    #[error("page size {page_size} is not a power of two")]
    PageSize { page_size: usize },

    #[error("element size {elem_size} does not divide page size {page_size}")]
    ElementSize { elem_size: usize, page_size: usize },

    #[error("array base {base:#x} is not page aligned")]
    Misaligned { base: usize },

    #[error("array of {len} elements overflows the address space")]
    Overflow { len: usize },

    #[error("Couldn't mmap() region for sqrt table ({len} bytes): {errno}")]
    Reserve { len: usize, errno: Errno },

    #[error("Couldn't munmap() region at {addr:#x}: {errno}")]
    Release { addr: usize, errno: Errno },

    #[error("Couldn't set rlimit on RLIMIT_AS to {bytes} bytes: {errno}")]
    Limit { bytes: u64, errno: Errno },

    #[error("committed {committed} bytes leave no room for {needed} resident bytes under the {ceiling}-byte ceiling")]
    Headroom { committed: u64, needed: u64, ceiling: u64 },

    #[error("Couldn't set up fault handler: {errno}")]
    Handler { errno: Errno },

    #[error("Failed to map memory at {addr:#x}: {errno}")]
    Map { addr: usize, errno: Errno },

    #[error("mapping for {want:#x} landed at {got:#x}")]
    Misplaced { want: usize, got: usize },

    #[error("Failed to unmap previous page at {addr:#x}: {errno}")]
    Unmap { addr: usize, errno: Errno },

    #[error("fault at {addr:#x} while a fault was already being resolved")]
    Reentrant { addr: usize },

    #[error("fault at {addr:#x} before the resolver was installed")]
    Uninstalled { addr: usize },
}

pub type Result<T> = core::result::Result<T, Error>;

/// Сырой errno / Raw errno value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Errno(pub i32);

impl core::fmt::Display for Errno {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (errno {})", errno_name(self.0), self.0)
    }
}

/// Имя errno без обращения к libc (strerror не signal-safe).
/// errno name without calling into libc (strerror is not signal-safe).
pub fn errno_name(errno: i32) -> &'static str {
    // Значения Linux / Linux values
    match errno {
        1  => "EPERM (operation not permitted)",
        9  => "EBADF (bad file descriptor)",
        11 => "EAGAIN (resource temporarily unavailable)",
        12 => "ENOMEM (cannot allocate memory)",
        13 => "EACCES (permission denied)",
        14 => "EFAULT (bad address)",
        17 => "EEXIST (address already mapped)",
        22 => "EINVAL (invalid argument)",
        _  => "unknown errno",
    }
}
