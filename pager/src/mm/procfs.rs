//! Учёт памяти через /proc/self / Memory accounting via /proc/self
//!
//! Только для проверок вне обработчика: читает файлы и аллоцирует.
//! Only for checks outside the handler: reads files and allocates.

use std::{fs, io};

/// Текущий размер адресного пространства (VmSize), байты.
/// Current address-space size (VmSize), bytes.
pub fn vm_size() -> io::Result<u64> {
    let status = fs::read_to_string("/proc/self/status")?;
    parse_vm_size(&status).ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "no VmSize line"))
}

pub fn parse_vm_size(status: &str) -> Option<u64> {
    let line = status.lines().find(|l| l.starts_with("VmSize:"))?;
    let mut fields = line["VmSize:".len()..].split_whitespace();
    let value: u64 = fields.next()?.parse().ok()?;
    match fields.next() {
        Some("kB") | None => Some(value * 1024),
        Some(_)           => None,
    }
}

/// Сколько байт замаплено внутри `[start, end)`.
/// How many bytes are mapped inside `[start, end)`.
pub fn mapped_bytes_within(start: usize, end: usize) -> io::Result<u64> {
    let maps = fs::read_to_string("/proc/self/maps")?;
    Ok(overlap_in_maps(&maps, start, end))
}

/// Строка maps: `lo-hi perms offset dev inode [path]`
/// A maps line: `lo-hi perms offset dev inode [path]`
pub fn overlap_in_maps(maps: &str, start: usize, end: usize) -> u64 {
    maps.lines()
        .filter_map(|line| {
            let range = line.split_whitespace().next()?;
            let (lo, hi) = range.split_once('-')?;
            let lo = usize::from_str_radix(lo, 16).ok()?;
            let hi = usize::from_str_radix(hi, 16).ok()?;
            let (a, b) = (lo.max(start), hi.min(end));
            (a < b).then(|| (b - a) as u64)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Name:\tsqrtvm\nVmPeak:\t   12000 kB\nVmSize:\t    8192 kB\nVmRSS:\t    1024 kB\n";

    const MAPS: &str = "\
55d0c0000000-55d0c0010000 r-xp 00000000 08:01 1234 /usr/bin/sqrtvm
7f0000000000-7f0000001000 ---p 00000000 00:00 0
7f0000002000-7f0000003000 rw-p 00000000 00:00 0
7f00000ff000-7f0000101000 rw-p 00000000 00:00 0
7ffd00000000-7ffd00021000 rw-p 00000000 00:00 0 [stack]
";

    #[test]
    fn reads_vm_size_in_bytes() {
        assert_eq!(parse_vm_size(STATUS), Some(8192 * 1024));
        assert_eq!(parse_vm_size("Name:\tx\n"), None);
    }

    #[test]
    fn counts_only_the_overlap() {
        // Массив [0x7f0000001000, 0x7f0000100000): страница внутри + хвост
        // соседнего маппинга; guard-страница слева не считается.
        // One page inside + the tail of a neighbour; the left guard is not counted.
        let inside = overlap_in_maps(MAPS, 0x7f00_0000_1000, 0x7f00_0010_0000);
        assert_eq!(inside, 0x1000 + 0x1000);
        assert_eq!(overlap_in_maps(MAPS, 0x1000, 0x2000), 0);
    }

    #[test]
    fn live_process_has_a_size() {
        assert!(vm_size().unwrap() > 0);
    }
}
