//! stderr через write(2) / stderr via write(2)
//!
//! Сообщение сначала форматируется в буфер на стеке, затем уходит одним
//! write(2). Длинные сообщения обрезаются.
//! A message is formatted into a stack buffer first, then leaves in a single
//! write(2). Long messages are truncated.

use core::fmt;

/// Больше не нужно ни одной диагностике / No diagnostic needs more
const LINE_MAX: usize = 512;
const ELLIPSIS: &[u8] = b"...\n";

pub struct LineBuffer<const N: usize> {
    buf:       [u8; N],
    len:       usize,
    truncated: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0, truncated: false }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Отправить содержимое в fd. Повторяет при EINTR и частичной записи.
    /// Send the contents to fd. Retries on EINTR and short writes.
    pub fn flush_to(&mut self, fd: libc::c_int) {
        if self.is_truncated() && N >= ELLIPSIS.len() {
            let at = self.len.min(N - ELLIPSIS.len());
            self.buf[at..at + ELLIPSIS.len()].copy_from_slice(ELLIPSIS);
            self.len = at + ELLIPSIS.len();
        }
        let mut rest = self.as_bytes();
        while !rest.is_empty() {
            let n = unsafe { libc::write(fd, rest.as_ptr().cast(), rest.len()) };
            if n < 0 {
                if crate::arch::current::errno() == libc::EINTR { continue; }
                break; // stderr закрыт — сказать больше некому / nobody left to tell
            }
            rest = &rest[n as usize..];
        }
        self.len = 0;
        self.truncated = false;
    }
}

impl<const N: usize> fmt::Write for LineBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = N - self.len;
        let take = s.len().min(room);
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        if take < s.len() {
            self.truncated = true;
        }
        Ok(())
    }
}

/// Внутренняя функция для макроса sprint!
/// Internal function for the sprint! macro
pub fn _print(args: fmt::Arguments) {
    use fmt::Write;
    let mut line = LineBuffer::<LINE_MAX>::new();
    line.write_fmt(args).ok();
    line.flush_to(libc::STDERR_FILENO);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn formats_into_stack_buffer() {
        let mut line = LineBuffer::<64>::new();
        write!(line, "fault at {:#x}", 0x7f00_1000usize).unwrap();
        assert_eq!(line.as_bytes(), b"fault at 0x7f001000");
        assert!(!line.is_truncated());
    }

    #[test]
    fn long_lines_are_cut_not_overflowed() {
        let mut line = LineBuffer::<8>::new();
        write!(line, "{}", "0123456789abcdef").unwrap();
        assert_eq!(line.as_bytes(), b"01234567");
        assert!(line.is_truncated());
    }

    #[test]
    fn flush_resets_the_buffer() {
        let mut line = LineBuffer::<32>::new();
        write!(line, "").unwrap();
        // Пустой буфер: write(2) не вызывается / empty buffer: no write(2)
        line.flush_to(libc::STDERR_FILENO);
        assert!(line.as_bytes().is_empty());
    }
}
