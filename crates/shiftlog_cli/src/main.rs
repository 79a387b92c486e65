//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `shiftlog_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("shiftlog_core ping={}", shiftlog_core::ping());
    println!("shiftlog_core version={}", shiftlog_core::core_version());
}
