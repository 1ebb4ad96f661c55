//! Валидатор таблицы корней / Sqrt table validator
//!
//! Обычные чтения по индексу; fault'ы и подкачка для него прозрачны.
//! Plain indexed reads; faults and paging are transparent to it.

use rand::{rngs::StdRng, Rng, SeedableRng};

use libsqrtvm::{oracle, ArrayRegion};

use crate::mm::procfs;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Setup(#[from] libsqrtvm::Error),

    #[error("Square root is incorrect at index {index}. Expected {expected}, got {got}.")]
    Mismatch { index: usize, expected: f64, got: f64 },

    #[error("{mapped} bytes mapped inside the table, at most {limit} allowed")]
    Residency { mapped: u64, limit: u64 },

    #[error("address space grew to {committed} bytes past the {ceiling}-byte ceiling")]
    Ceiling { committed: u64, ceiling: u64 },

    #[error("cannot read /proc/self: {0}")]
    Procfs(#[from] std::io::Error),
}

/// Логический массив глазами потребителя / The logical array as a consumer sees it
pub struct LogicalArray {
    base: *const f64,
    len:  usize,
}

impl LogicalArray {
    pub fn new(region: &ArrayRegion) -> Self {
        Self { base: region.base() as *const f64, len: region.len() }
    }

    pub fn len(&self) -> usize { self.len }

    /// Чтение элемента. Может вызвать fault, после которого резолвер
    /// подставит страницу, и инструкция повторится.
    /// Element read. May fault; the resolver backs the page and the
    /// instruction re-executes.
    pub fn get(&self, index: usize) -> Option<f64> {
        if index >= self.len {
            return None;
        }
        // SAFETY: адрес внутри массива; обработчик fault'а обеспечивает
        // backing любой странице диапазона.
        // The address is inside the array; the fault handler backs every
        // page of the range.
        Some(unsafe { self.base.add(index).read_volatile() })
    }

    /// Чтение без проверки границ — вне массива приводит к фатальному fault'у.
    /// Read without a bounds check — outside the array it ends in a fatal fault.
    ///
    /// # Safety
    /// Вызывающий принимает, что процесс завершится, если `index` вне массива.
    /// The caller accepts that the process terminates if `index` is out of range.
    pub unsafe fn read_unchecked(&self, index: i64) -> f64 {
        unsafe { self.base.wrapping_offset(index as isize).read_volatile() }
    }

    fn check(&self, index: usize) -> Result<f64, Error> {
        let expected = oracle::value(index as u64);
        let got = self.get(index).unwrap_or(f64::NAN);
        if got.to_bits() != expected.to_bits() {
            return Err(Error::Mismatch { index, expected, got });
        }
        Ok(got)
    }
}

/// Случайные индексы вперемешку с «предыдущий + 1».
/// Random indices interleaved with "previous + 1".
pub fn run_random(array: &LogicalArray, reads: u64, seed: u64) -> Result<(), Error> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pos = 0usize;
    for i in 0..reads {
        if i % 2 == 0 {
            pos = rng.gen_range(0..array.len() - 1);
        } else {
            pos += 1;
        }
        array.check(pos)?;
    }
    log::info!("[validate] {} reads matched", reads);
    Ok(())
}

/// i → j на другой странице → снова i: значение то же, что и до вытеснения.
/// i → j on another page → i again: same value as before eviction.
pub fn run_eviction(array: &LogicalArray, elems_per_page: usize) -> Result<(), Error> {
    let i = elems_per_page / 2;
    let j = (i + 7 * elems_per_page).min(array.len() - 1);
    let before = array.check(i)?;
    array.check(j)?;
    let after = array.check(i)?;
    debug_assert_eq!(before.to_bits(), after.to_bits());
    log::info!("[validate] eviction round trip {} → {} → {} ok", i, j, i);
    Ok(())
}

/// Замаплено внутри массива не больше K страниц.
/// No more than K pages mapped inside the array.
pub fn check_residency(region: &ArrayRegion, resident_pages: usize) -> Result<u64, Error> {
    let mapped = procfs::mapped_bytes_within(region.base(), region.end())?;
    let limit = (resident_pages * region.geometry().page_size()) as u64;
    if mapped > limit {
        return Err(Error::Residency { mapped, limit });
    }
    Ok(mapped)
}

pub fn check_ceiling(ceiling: u64) -> Result<u64, Error> {
    let committed = procfs::vm_size()?;
    if committed > ceiling {
        return Err(Error::Ceiling { committed, ceiling });
    }
    Ok(committed)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Полностью материализованная таблица — без подкачки.
    /// Fully materialized table — no paging involved.
    fn table(len: usize) -> Vec<f64> {
        let mut v = vec![0.0; len];
        oracle::fill(0, &mut v);
        v
    }

    fn view(v: &[f64]) -> LogicalArray {
        LogicalArray { base: v.as_ptr(), len: v.len() }
    }

    #[test]
    fn random_walk_over_correct_table_passes() {
        let v = table(4096);
        run_random(&view(&v), 10_000, 0xDEAD_BEEF).unwrap();
        run_eviction(&view(&v), 512).unwrap();
    }

    #[test]
    fn corrupted_entry_is_reported() {
        let mut v = table(16);
        v[3] = 1.5;
        let err = run_random(&view(&v), 10_000, 7).unwrap_err();
        assert!(matches!(err, Error::Mismatch { index: 3, got, .. } if got == 1.5));
    }

    #[test]
    fn get_is_bounds_checked() {
        let v = table(8);
        let array = view(&v);
        assert_eq!(array.get(4), Some(2.0));
        assert_eq!(array.get(8), None);
        assert_eq!(unsafe { array.read_unchecked(4) }, 2.0);
    }
}
