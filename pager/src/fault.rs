//! Обработчик fault'ов / Fault handler
//!
//! SIGSEGV/SIGBUS → резолвер. Резолвер живёт в контексте, который
//! устанавливается один раз; обработчик берёт его через `try_lock`.
//! SIGSEGV/SIGBUS → resolver. The resolver lives in a context installed
//! once; the handler takes it via `try_lock`.
//!
//! Однопоточная модель: fault доставляется синхронно в поток, который
//! его вызвал, и второй fault не может прийти, пока первый не закончен.
//! Single-threaded model: a fault is delivered synchronously to the thread
//! that raised it, and a second fault cannot arrive before the first ends.
//!
//! Любая ошибка фатальна: у обработчика нет пути вернуть ошибку в
//! инструкцию, вызвавшую fault. Диагностика — только signal-safe.
//! Every error is fatal: the handler has no path to return an error to the
//! faulting instruction. Diagnostics are signal-safe only.

use spin::{Mutex, Once};

use libsqrtvm::{Error, Resolution, Resolver, Result, Stats};

use crate::arch::current::{self, signal};
use crate::config::RESIDENT_PAGES;
use crate::mm::MmapBackend;

pub type PageResolver = Resolver<MmapBackend, RESIDENT_PAGES>;

struct FaultContext {
    resolver: Mutex<PageResolver>,
}

static CONTEXT: Once<FaultContext> = Once::new();

/// Передать резолвер обработчику и зарегистрировать обработчик.
/// Hand the resolver to the handler and register the handler.
pub fn install(resolver: PageResolver) -> Result<()> {
    let mut fresh = false;
    CONTEXT.call_once(|| {
        fresh = true;
        FaultContext { resolver: Mutex::new(resolver) }
    });
    if !fresh {
        log::warn!("[fault] handler context already installed, keeping the first resolver");
    }
    for sig in signal::FAULT_SIGNALS {
        signal::install(sig, handle_fault)?;
    }
    log::info!("[fault] SIGSEGV/SIGBUS handler installed");
    Ok(())
}

extern "C" fn handle_fault(_sig: libc::c_int, info: *mut libc::siginfo_t, _uctx: *mut libc::c_void) {
    let saved = current::errno();
    let addr = unsafe { signal::fault_addr(info) };
    if let Err(err) = resolve(addr) {
        fatal(&err);
    }
    current::set_errno(saved);
}

fn resolve(addr: usize) -> Result<Resolution> {
    let ctx = CONTEXT.get().ok_or(Error::Uninstalled { addr })?;
    let mut resolver = ctx.resolver.try_lock().ok_or(Error::Reentrant { addr })?;
    resolver.resolve(addr)
}

/// Диагностика + немедленный выход. `_exit`, а не `exit`: atexit-хуки
/// и буферы stdio не signal-safe.
/// Diagnostic + immediate exit. `_exit`, not `exit`: atexit hooks and stdio
/// buffers are not signal-safe.
fn fatal(err: &Error) -> ! {
    crate::sprintln!("{}", err);
    unsafe { libc::_exit(libc::EXIT_FAILURE) }
}

/// Счётчики резолвера. Только вне обработчика.
/// Resolver counters. Outside the handler only.
pub fn stats() -> Option<Stats> {
    CONTEXT.get().map(|ctx| ctx.resolver.lock().stats())
}

pub fn resident_pages() -> Vec<usize> {
    CONTEXT
        .get()
        .map(|ctx| ctx.resolver.lock().resident_pages().collect())
        .unwrap_or_default()
}
