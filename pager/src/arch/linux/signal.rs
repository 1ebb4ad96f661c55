//! Установка обработчиков SIGSEGV / SIGBUS
//! Installing SIGSEGV / SIGBUS handlers
//!
//! Обработчик получает siginfo_t (SA_SIGINFO): в нём адрес fault'а.
//! The handler receives siginfo_t (SA_SIGINFO), which carries the fault
//! address.

use core::{mem, ptr};

use libsqrtvm::{Error, Result};

/// Сигналы, которыми платформа сообщает о fault'е в массиве.
/// Signals the platform uses to report a fault inside the array.
pub const FAULT_SIGNALS: [libc::c_int; 2] = [libc::SIGSEGV, libc::SIGBUS];

pub type SigInfoHandler = extern "C" fn(libc::c_int, *mut libc::siginfo_t, *mut libc::c_void);

/// Зарегистрировать `handler` для `signal`.
/// Register `handler` for `signal`.
///
/// Пока обработчик работает, оба fault-сигнала заблокированы: повторный
/// fault внутри обработчика убьёт процесс, а не рекурсирует.
/// While the handler runs both fault signals are blocked: a second fault
/// inside the handler kills the process instead of recursing.
pub fn install(signal: libc::c_int, handler: SigInfoHandler) -> Result<()> {
    unsafe {
        let mut act: libc::sigaction = mem::zeroed();
        act.sa_sigaction = handler as usize;
        act.sa_flags = libc::SA_SIGINFO;
        libc::sigemptyset(&mut act.sa_mask);
        for sig in FAULT_SIGNALS {
            libc::sigaddset(&mut act.sa_mask, sig);
        }
        if libc::sigaction(signal, &act, ptr::null_mut()) == -1 {
            return Err(Error::Handler { errno: super::last_errno() });
        }
    }
    Ok(())
}

/// Адрес, обращение к которому вызвало fault.
/// The address whose access raised the fault.
///
/// # Safety
/// `info` — указатель, переданный ядром в SA_SIGINFO-обработчик.
/// `info` is the pointer the kernel passed to an SA_SIGINFO handler.
pub unsafe fn fault_addr(info: *const libc::siginfo_t) -> usize {
    unsafe { (*info).si_addr() as usize }
}
