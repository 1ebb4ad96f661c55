//! Резолвер page fault'ов / Page-fault resolver
//!
//! Автомат над набором резидентных страниц:
//! State machine over the resident page set:
//!
//!   NONE ──fault(p)──▶ RESIDENT(p) ──fault(q≠p)──▶ RESIDENT(q)
//!
//! Шаги на каждый fault / Steps per fault:
//!   1. containment — адрес внутри массива? / address inside the array?
//!   2. resolve     — адрес → страница → индексы
//!   3. evict       — размаппить старую страницу ДО маппинга новой
//!   4. map         — новая private anonymous RW страница
//!   5. fill        — оракул заполняет страницу по порядку индексов
//!   6. commit      — страница становится резидентной
//!
//! Платформенные операции спрятаны за трейтом `PageBackend`.
//! Platform operations live behind the `PageBackend` trait.

use bitflags::bitflags;

use crate::{oracle, ArrayRegion, ResidentSet, Result};

bitflags! {
    /// Права страницы / Page protection
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Protection: u32 {
        const READ  = 1 << 0;
        const WRITE = 1 << 1;
        const EXEC  = 1 << 2;
    }
}

/// Как ставить маппинг / How a mapping is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Страница свободна; ошибка, если по адресу уже что-то есть.
    /// Page must be free; fail if anything already occupies it.
    Exclusive,
    /// Страница уже наша — перемаппить поверх.
    /// Page is already ours — map over it.
    Replace,
}

/// Трейт для платформенной реализации маппинга страниц.
/// Trait for the platform page-mapping implementation.
pub trait PageBackend {
    /// Замаппить одну страницу по адресу `page` и вернуть её содержимое.
    /// Map one page at `page` and hand back its contents.
    fn map(&mut self, page: usize, prot: Protection, placement: Placement) -> Result<&mut [f64]>;
    fn unmap(&mut self, page: usize) -> Result<()>;
}

/// Итог одного fault'а / Outcome of one fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub page:     usize,
    pub evicted:  Option<usize>,
    pub remapped: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub faults:    u64,
    pub evictions: u64,
    pub remaps:    u64,
}

pub struct Resolver<B, const K: usize = 1> {
    region:   ArrayRegion,
    backend:  B,
    resident: ResidentSet<K>,
    stats:    Stats,
}

impl<B: PageBackend, const K: usize> Resolver<B, K> {
    pub fn new(region: ArrayRegion, backend: B) -> Self {
        Self { region, backend, resident: ResidentSet::new(), stats: Stats::default() }
    }

    pub fn region(&self) -> &ArrayRegion { &self.region }
    pub fn stats(&self) -> Stats { self.stats }
    pub fn backend(&self) -> &B { &self.backend }

    pub fn resident_pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.resident.iter()
    }

    /// Обработать fault по адресу `addr`.
    /// Resolve a fault at `addr`.
    pub fn resolve(&mut self, addr: usize) -> Result<Resolution> {
        // 1 + 2
        let slice = self.region.slice_for(addr)?;
        self.stats.faults += 1;

        // 3. Вытеснение строго до маппинга: иначе на миг резидентны K+1
        //    страниц, и потолок RLIMIT_AS может не пустить mmap.
        //    Evict strictly before mapping: otherwise K+1 pages are briefly
        //    resident and the RLIMIT_AS ceiling may refuse the mmap.
        let evicted = self.resident.victim_for(slice.page);
        if let Some(victim) = evicted {
            self.backend.unmap(victim)?;
            self.resident.remove(victim);
            self.stats.evictions += 1;
        }

        // 4. Fault на уже резидентной странице (запись в RO-маппинг и т.п.):
        //    перемаппить её же — идемпотентно.
        //    Fault on an already-resident page: re-map it, idempotently.
        let remapped = self.resident.contains(slice.page);
        let placement = if remapped {
            self.stats.remaps += 1;
            Placement::Replace
        } else {
            Placement::Exclusive
        };
        let page = self.backend.map(slice.page, Protection::READ | Protection::WRITE, placement)?;

        // 5
        let count = slice.count.min(page.len());
        oracle::fill(slice.first_index, &mut page[..count]);

        // 6
        self.resident.insert(slice.page);
        log::trace!(
            "fault {:#x}: page {:#x} [{}..{}) evicted={:?}",
            addr, slice.page, slice.first_index, slice.first_index + count as u64, evicted
        );
        Ok(Resolution { page: slice.page, evicted, remapped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, PageGeometry, ELEM_SIZE};
    use std::collections::BTreeMap;

    const BASE: usize = 0x7f00_0000_0000;
    const PAGE: usize = 4096;

    #[derive(Debug, PartialEq, Eq)]
    enum Op {
        Map(usize, Placement),
        Unmap(usize),
    }

    /// Бэкенд-заглушка: страницы в куче + журнал операций.
    /// Mock backend: pages on the heap plus an operation log.
    #[derive(Default)]
    struct MockBackend {
        pages:   BTreeMap<usize, Vec<f64>>,
        log:     Vec<Op>,
        foreign: Option<usize>,
    }

    impl PageBackend for MockBackend {
        fn map(&mut self, page: usize, _prot: Protection, placement: Placement) -> Result<&mut [f64]> {
            if placement == Placement::Exclusive
                && (self.pages.contains_key(&page) || self.foreign == Some(page))
            {
                return Err(Error::Map { addr: page, errno: crate::Errno(17) });
            }
            self.log.push(Op::Map(page, placement));
            // Свежая anonymous страница — нули / fresh anonymous page is zeroed
            let buf = self.pages.entry(page).or_default();
            *buf = vec![0.0; PAGE / ELEM_SIZE];
            Ok(buf.as_mut_slice())
        }

        fn unmap(&mut self, page: usize) -> Result<()> {
            self.log.push(Op::Unmap(page));
            self.pages.remove(&page).map(|_| ()).ok_or(Error::Unmap { addr: page, errno: crate::Errno(22) })
        }
    }

    fn resolver<const K: usize>(len: usize) -> Resolver<MockBackend, K> {
        let region = ArrayRegion::new(BASE, len, PageGeometry::new(PAGE, ELEM_SIZE).unwrap()).unwrap();
        Resolver::new(region, MockBackend::default())
    }

    fn read<const K: usize>(r: &Resolver<MockBackend, K>, index: usize) -> Option<f64> {
        let addr = r.region().addr_of(index);
        let page = r.region().geometry().align_down(addr);
        r.backend().pages.get(&page).map(|p| p[(addr - page) / ELEM_SIZE])
    }

    #[test]
    fn first_fault_maps_and_fills_index_zero_page() {
        let mut r = resolver::<1>(1 << 27);
        let res = r.resolve(BASE).unwrap();
        assert_eq!(res, Resolution { page: BASE, evicted: None, remapped: false });
        assert_eq!(r.backend().log, vec![Op::Map(BASE, Placement::Exclusive)]);
        for i in [0, 1, 511] {
            assert_eq!(read(&r, i), Some(oracle::value(i as u64)));
        }
        assert_eq!(read(&r, 512), None);
    }

    #[test]
    fn unmaps_previous_page_before_mapping_next() {
        let mut r = resolver::<1>(1 << 20);
        r.resolve(r.region().addr_of(10)).unwrap();
        let res = r.resolve(r.region().addr_of(5000)).unwrap();
        assert_eq!(res.evicted, Some(BASE));
        assert_eq!(
            r.backend().log,
            vec![
                Op::Map(BASE, Placement::Exclusive),
                Op::Unmap(BASE),
                Op::Map(BASE + 9 * PAGE, Placement::Exclusive),
            ]
        );
        assert_eq!(r.backend().pages.len(), 1);
        assert_eq!(r.resident_pages().collect::<Vec<_>>(), vec![BASE + 9 * PAGE]);
    }

    #[test]
    fn refault_after_eviction_recomputes_same_values() {
        let mut r = resolver::<1>(1 << 20);
        let (i, j) = (700, 90_000);
        r.resolve(r.region().addr_of(i)).unwrap();
        let before = read(&r, i).unwrap();
        r.resolve(r.region().addr_of(j)).unwrap();
        assert_eq!(read(&r, i), None);
        r.resolve(r.region().addr_of(i)).unwrap();
        assert_eq!(read(&r, i).unwrap().to_bits(), before.to_bits());
        assert_eq!(r.stats(), Stats { faults: 3, evictions: 2, remaps: 0 });
    }

    #[test]
    fn fault_on_resident_page_remaps_in_place() {
        let mut r = resolver::<1>(4096);
        r.resolve(BASE + 8).unwrap();
        let res = r.resolve(BASE + 16).unwrap();
        assert_eq!(res, Resolution { page: BASE, evicted: None, remapped: true });
        assert_eq!(r.backend().log.last(), Some(&Op::Map(BASE, Placement::Replace)));
        assert_eq!(read(&r, 2), Some(oracle::value(2)));
        assert_eq!(r.stats().remaps, 1);
    }

    #[test]
    fn out_of_domain_touches_nothing() {
        let mut r = resolver::<1>(1024);
        let end = r.region().end();
        assert_eq!(r.resolve(end), Err(Error::OutOfDomain { addr: end }));
        assert_eq!(r.resolve(BASE - 8), Err(Error::OutOfDomain { addr: BASE - 8 }));
        assert!(r.backend().log.is_empty());
        assert_eq!(r.stats().faults, 0);
    }

    #[test]
    fn foreign_mapping_in_range_is_reported() {
        let mut r = resolver::<1>(1 << 20);
        r.backend.foreign = Some(BASE + PAGE);
        assert!(matches!(r.resolve(BASE + PAGE), Err(Error::Map { addr, .. }) if addr == BASE + PAGE));
    }

    #[test]
    fn residency_never_exceeds_capacity() {
        let mut r = resolver::<2>(1 << 20);
        for index in [0, 600, 1200, 1, 5000, 601, 70_000] {
            r.resolve(r.region().addr_of(index)).unwrap();
            assert!(r.backend().pages.len() <= 2);
            assert_eq!(read(&r, index), Some(oracle::value(index as u64)));
        }
    }
}
