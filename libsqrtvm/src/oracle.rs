//! Оракул значений — квадратные корни
//! Value oracle — square roots
//!
//! Чистая функция: одинаковые входы → одинаковые выходы, поэтому
//! вытесненную страницу всегда можно вычислить заново.
//! Pure function: same inputs give the same outputs, so an evicted page
//! can always be recomputed.

/// Значение элемента `index` / Value of element `index`
#[inline]
pub fn value(index: u64) -> f64 {
    (index as f64).sqrt()
}

/// Заполнить `out` значениями `start..start + out.len()` по порядку.
/// Fill `out` with the values for `start..start + out.len()` in order.
pub fn fill(start: u64, out: &mut [f64]) {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = value(start + i as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_calls_agree_bit_for_bit() {
        for i in [0u64, 1, 2, 511, 512, 1 << 20, (1 << 27) - 1] {
            assert_eq!(value(i).to_bits(), value(i).to_bits());
        }
    }

    #[test]
    fn fill_matches_single_values() {
        let mut page = [0.0f64; 512];
        fill(1024, &mut page);
        for (i, v) in page.iter().enumerate() {
            assert_eq!(v.to_bits(), value(1024 + i as u64).to_bits());
        }
        assert_eq!(page[0], 32.0);
    }

    #[test]
    fn perfect_squares() {
        assert_eq!(value(0), 0.0);
        assert_eq!(value(1), 1.0);
        assert_eq!(value(144), 12.0);
        assert_eq!(value(1 << 26), 8192.0);
    }
}
