//! sqrtvm — таблица корней с подкачкой по требованию
//! sqrtvm — demand-paged square root table
//!
//! Таблица на 2^27 корней (1 GiB) живёт под потолком RLIMIT_AS в 32 MiB:
//! в каждый момент замаплена одна страница, остальное вычисляется в
//! обработчике SIGSEGV при первом обращении.
//! A 2^27-entry (1 GiB) table lives under a 32 MiB RLIMIT_AS ceiling: one
//! page is mapped at any moment, the rest is computed in the SIGSEGV handler
//! on first touch.

#![deny(unsafe_op_in_unsafe_fn)]

use std::process::ExitCode;

use clap::Parser;

use libsqrtvm::Resolver;

mod arch;
mod config;
mod diag;
mod fault;
mod mm;
mod validate;

use config::{Args, LAYOUT};
use mm::{AddressSpace, MmapBackend};

fn main() -> ExitCode {
    let args = Args::parse();
    diag::logger::init(diag::logger::level_for(args.verbose));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            sprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), validate::Error> {
    // 1. Адресное пространство + потолок / Address space + ceiling
    log::info!("[mm] Reserving sqrt table ({} entries)...", LAYOUT.elements);
    let space = AddressSpace::initialize(&LAYOUT)?;
    let region = *space.region();
    let geometry = region.geometry();
    println!("page_size is {}", geometry.page_size());
    log::info!(
        "[mm] table at {:#x}..{:#x}, guards at {:#x?}",
        region.base(), region.end(), space.guards()
    );

    // 2. Обработчик fault'ов / Fault handler
    let resolver = Resolver::new(region, MmapBackend::new(geometry));
    fault::install(resolver)?;

    let array = validate::LogicalArray::new(&region);

    if let Some(index) = args.probe {
        // SAFETY: за границами массива процесс завершится в обработчике.
        // Out of range, the process terminates inside the handler.
        let value = unsafe { array.read_unchecked(index) };
        println!("sqrts[{}] = {}", index, value);
        return Ok(());
    }

    // 3. Проверка / Validation
    println!("Validating square root table contents...");
    validate::run_random(&array, args.reads, args.seed)?;
    validate::run_eviction(&array, geometry.elems_per_page())?;

    let mapped = validate::check_residency(&region, LAYOUT.resident_pages)?;
    let committed = validate::check_ceiling(space.ceiling())?;
    if let Some(stats) = fault::stats() {
        log::info!(
            "[fault] {} faults, {} evictions, {} remaps",
            stats.faults, stats.evictions, stats.remaps
        );
    }
    log::info!(
        "[mm] resident {:#x?}, {} bytes mapped in table, VmSize {} / {} bytes",
        fault::resident_pages(), mapped, committed, space.ceiling()
    );

    println!("All tests passed!");
    Ok(())
}
