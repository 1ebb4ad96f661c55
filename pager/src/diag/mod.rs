//! Диагностика / Diagnostics
//!
//! Весь вывод ошибок идёт через буфер на стеке + write(2), без блокировок
//! и аллокаций: им можно пользоваться из обработчика SIGSEGV.
//! All error output goes through a stack buffer + write(2), without locks
//! or allocation, so it is usable from the SIGSEGV handler.
//!
//!   stderr — signal-safe writer (`sprint!` / `sprintln!`)
//!   logger — backend for the `log` facade on top of it

pub mod logger;
pub mod stderr;

/// Signal-safe печать в stderr.
/// Signal-safe print to stderr.
#[macro_export]
macro_rules! sprint {
    ($($arg:tt)*) => {
        $crate::diag::stderr::_print(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! sprintln {
    ()           => ($crate::sprint!("\n"));
    ($($arg:tt)*) => ($crate::sprint!("{}\n", format_args!($($arg)*)));
}
