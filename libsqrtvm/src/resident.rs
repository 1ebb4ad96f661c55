//! Набор резидентных страниц / Resident page set
//!
//! Фиксированная ёмкость `K`. `K = 1` — классический режим «одна страница».
//! Fixed capacity `K`. `K = 1` is the single-resident-page mode.
//!
//! Вытесняется самая давно замапленная страница. Резидентная страница
//! больше не вызывает fault, поэтому порядок маппинга совпадает с порядком
//! обращений, которые дошли до резолвера.
//! The oldest-mapped page is evicted. A resident page never faults again, so
//! map order equals the order of accesses that reached the resolver.

#[derive(Debug, Clone, Copy)]
struct Slot {
    page:  usize,
    stamp: u64,
}

#[derive(Debug)]
pub struct ResidentSet<const K: usize> {
    slots: [Option<Slot>; K],
    clock: u64,
}

impl<const K: usize> ResidentSet<K> {
    pub const fn new() -> Self {
        Self { slots: [None; K], clock: 0 }
    }

    pub const fn capacity(&self) -> usize { K }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, page: usize) -> bool {
        self.iter().any(|p| p == page)
    }

    /// Какую страницу вытеснить, чтобы поместить `page`.
    /// Which page to evict so that `page` fits.
    pub fn victim_for(&self, page: usize) -> Option<usize> {
        if self.contains(page) || self.slots.iter().any(Option::is_none) {
            return None;
        }
        self.slots
            .iter()
            .flatten()
            .min_by_key(|s| s.stamp)
            .map(|s| s.page)
    }

    pub fn remove(&mut self, page: usize) -> bool {
        match self.slots.iter_mut().find(|s| matches!(s, Some(s) if s.page == page)) {
            Some(slot) => { *slot = None; true }
            None       => false,
        }
    }

    /// Зафиксировать `page` как резидентную. Вызывающий обязан сначала
    /// освободить место через `victim_for` + `remove`.
    /// Commit `page` as resident. The caller frees room first.
    pub fn insert(&mut self, page: usize) {
        self.clock += 1;
        let stamp = self.clock;
        if let Some(slot) = self.slots.iter_mut().flatten().find(|s| s.page == page) {
            slot.stamp = stamp;
            return;
        }
        match self.slots.iter_mut().find(|s| s.is_none()) {
            Some(free) => *free = Some(Slot { page, stamp }),
            None       => debug_assert!(false, "resident set full, evict before insert"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().flatten().map(|s| s.page)
    }
}

impl<const K: usize> Default for ResidentSet<K> {
    fn default() -> Self {
        Self::new()
    }
}
