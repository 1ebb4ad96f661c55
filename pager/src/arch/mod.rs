//! Платформенный слой / Platform layer
//!
//! Выбираем реализацию в зависимости от целевой ОС.
//! Select implementation based on the target OS.

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "linux")]
pub use linux as current;

#[cfg(not(target_os = "linux"))]
compile_error!("sqrtvm needs Linux: /proc/self and MAP_FIXED_NOREPLACE");
