//! Геометрия страниц / Page geometry
//!
//! Размер страницы запрашивается у платформы один раз при старте.
//! Page size is queried from the platform once at startup.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    page_size: usize,
    elem_size: usize,
}

impl PageGeometry {
    /// Проверить инварианты: страница — степень двойки, элемент делит страницу.
    /// Check invariants: page size is a power of two, element divides the page.
    pub fn new(page_size: usize, elem_size: usize) -> Result<Self> {
        if !page_size.is_power_of_two() {
            return Err(Error::PageSize { page_size });
        }
        if elem_size == 0 || page_size % elem_size != 0 {
            return Err(Error::ElementSize { elem_size, page_size });
        }
        Ok(Self { page_size, elem_size })
    }

    pub const fn page_size(&self) -> usize { self.page_size }
    pub const fn elem_size(&self) -> usize { self.elem_size }

    pub const fn elems_per_page(&self) -> usize {
        self.page_size / self.elem_size
    }

    /// Округлить адрес вниз до границы страницы.
    /// Round an address down to its page boundary.
    pub const fn align_down(&self, addr: usize) -> usize {
        addr & !(self.page_size - 1)
    }

    pub const fn is_aligned(&self, addr: usize) -> bool {
        addr & (self.page_size - 1) == 0
    }
}
