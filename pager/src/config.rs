//! Конфигурация / Configuration
//!
//! Потолок и размер массива фиксируются при компиляции; из командной
//! строки настраивается только валидатор.
//! Ceiling and array size are fixed at compile time; only the validator
//! is configurable from the command line.

use clap::Parser;

/// Максимум виртуальной памяти, байты / Maximum virtual memory bytes
pub const AS_LIMIT: u64 = 1 << 25;
/// Элементов в таблице корней / Entries in the sqrt table
pub const MAX_SQRTS: usize = 1 << 27;
/// Резидентных страниц одновременно / Pages resident at once
pub const RESIDENT_PAGES: usize = 1;

/// Раскладка адресного пространства / Address-space layout
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub ceiling:        u64,
    pub elements:       usize,
    pub resident_pages: usize,
}

pub const LAYOUT: Layout = Layout {
    ceiling:        AS_LIMIT,
    elements:       MAX_SQRTS,
    resident_pages: RESIDENT_PAGES,
};

// Таблица обязана не помещаться под потолок — иначе подкачка не нужна.
// The table must not fit under the ceiling, otherwise paging is pointless.
const _: () = assert!((MAX_SQRTS * libsqrtvm::ELEM_SIZE) as u64 > AS_LIMIT);
const _: () = assert!(RESIDENT_PAGES >= 1);

#[derive(Debug, Parser)]
#[command(name = "sqrtvm", about = "Demand-paged square root table under an RLIMIT_AS ceiling")]
pub struct Args {
    /// Сколько случайных/последовательных чтений / Number of validation reads
    #[arg(long, default_value_t = 500_000)]
    pub reads: u64,

    /// Зерно ГПСЧ / PRNG seed
    #[arg(long, default_value_t = 0xDEAD_BEEF)]
    pub seed: u64,

    /// Прочитать один индекс (может быть вне массива) и выйти.
    /// Read a single index (may be outside the array) and exit.
    #[arg(long, allow_negative_numbers = true)]
    pub probe: Option<i64>,

    /// -v debug, -vv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_run() {
        let args = Args::parse_from(["sqrtvm"]);
        assert_eq!(args.reads, 500_000);
        assert_eq!(args.seed, 0xDEAD_BEEF);
        assert_eq!(args.probe, None);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn negative_probe_is_a_value() {
        let args = Args::parse_from(["sqrtvm", "--probe", "-1", "-vv"]);
        assert_eq!(args.probe, Some(-1));
        assert_eq!(args.verbose, 2);
    }
}
