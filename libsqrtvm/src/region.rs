//! Диапазон логического массива / Logical array range
//!
//! Массив существует только как диапазон виртуальных адресов:
//! `[base, base + len * elem_size)`. Никакой физической памяти за ним нет,
//! пока резолвер не замаппит страницу.
//! The array exists only as a virtual address range. No physical memory
//! backs it until the resolver maps a page.

use crate::{Error, PageGeometry, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayRegion {
    base:     usize,
    len:      usize,
    geometry: PageGeometry,
}

/// Срез массива, покрытый одной страницей.
/// Slice of the array covered by one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    /// Адрес страницы (выровнен) / Page address (aligned)
    pub page:        usize,
    /// Индекс первого элемента на странице / Index of the first element
    pub first_index: u64,
    /// Элементов на странице / Elements on the page
    pub count:       usize,
}

impl ArrayRegion {
    pub fn new(base: usize, len: usize, geometry: PageGeometry) -> Result<Self> {
        if !geometry.is_aligned(base) {
            return Err(Error::Misaligned { base });
        }
        len.checked_mul(geometry.elem_size())
            .and_then(|bytes| base.checked_add(bytes))
            .ok_or(Error::Overflow { len })?;
        Ok(Self { base, len, geometry })
    }

    pub const fn base(&self) -> usize { self.base }
    pub const fn len(&self) -> usize { self.len }
    pub const fn is_empty(&self) -> bool { self.len == 0 }
    pub const fn geometry(&self) -> PageGeometry { self.geometry }

    pub const fn byte_len(&self) -> usize {
        self.len * self.geometry.elem_size()
    }

    /// Первый адрес за массивом / First address past the array
    pub const fn end(&self) -> usize {
        self.base + self.byte_len()
    }

    pub const fn page_count(&self) -> usize {
        self.byte_len().div_ceil(self.geometry.page_size())
    }

    /// Проверка вхождения / Containment check
    pub const fn contains(&self, addr: usize) -> bool {
        addr >= self.base && addr < self.end()
    }

    /// Адрес → страница → индексы, которые она покрывает.
    /// Address → page → the index range it covers.
    pub fn slice_for(&self, addr: usize) -> Result<PageSlice> {
        if !self.contains(addr) {
            return Err(Error::OutOfDomain { addr });
        }
        let page = self.geometry.align_down(addr);
        Ok(PageSlice {
            page,
            first_index: ((page - self.base) / self.geometry.elem_size()) as u64,
            count:       self.geometry.elems_per_page(),
        })
    }

    /// Адрес элемента `index` / Address of element `index`
    pub const fn addr_of(&self, index: usize) -> usize {
        self.base + index * self.geometry.elem_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: usize = 0x7f00_0000_0000;

    fn region(len: usize) -> ArrayRegion {
        ArrayRegion::new(BASE, len, PageGeometry::new(4096, 8).unwrap()).unwrap()
    }

    #[test]
    fn index_zero_resolves_to_first_page() {
        let r = region(1 << 27);
        let s = r.slice_for(r.addr_of(0)).unwrap();
        assert_eq!(s, PageSlice { page: BASE, first_index: 0, count: 512 });
    }

    #[test]
    fn interior_address_resolves_to_its_page() {
        let r = region(1 << 27);
        // Индекс 1000 лежит на второй странице / index 1000 sits on page 1
        let s = r.slice_for(r.addr_of(1000) + 3).unwrap();
        assert_eq!(s.page, BASE + 4096);
        assert_eq!(s.first_index, 512);
        assert!(s.first_index <= 1000 && 1000 < s.first_index + s.count as u64);
    }

    #[test]
    fn containment_edges() {
        let r = region(1024);
        assert!(r.contains(BASE));
        assert!(r.contains(r.end() - 1));
        assert!(!r.contains(r.end()));
        assert!(!r.contains(BASE - 8));
        assert_eq!(r.slice_for(r.end()), Err(Error::OutOfDomain { addr: r.end() }));
        assert_eq!(r.slice_for(BASE - 1), Err(Error::OutOfDomain { addr: BASE - 1 }));
        assert_eq!(r.page_count(), 2);
    }

    #[test]
    fn rejects_unaligned_base_and_overflow() {
        let g = PageGeometry::new(4096, 8).unwrap();
        assert_eq!(ArrayRegion::new(BASE + 8, 16, g), Err(Error::Misaligned { base: BASE + 8 }));
        assert_eq!(ArrayRegion::new(BASE, usize::MAX / 2, g), Err(Error::Overflow { len: usize::MAX / 2 }));
    }
}
