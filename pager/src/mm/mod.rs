//! Memory Management
//!
//! Три части / Three parts:
//!   vmm    — mmap/munmap и PageBackend для резолвера
//!   aspace — резервирование диапазона массива + потолок RLIMIT_AS
//!   procfs — сколько памяти реально закоммичено (/proc/self)

pub mod aspace;
pub mod procfs;
pub mod vmm;

pub use aspace::AddressSpace;
pub use vmm::MmapBackend;
