//! # Built-in Functions Module
//!
//! Functions every script can call, organized into 4 categories:
//!
//! - **[math]** (5): max, min, abs, pow, trunc - Numeric operations
//! - **[bits]** (5): radix, bit, set, clr, flip - Integer bit operations
//! - **[console]** (2): print, println - Output through the shared sink
//! - **[time]** (1): millis - Wall-clock access
//!
//! Each category is a sub-module with its own register function. Hosts may
//! register additional functions, or replace these, through the same table.

use crate::host::FnTable;
use self::console::OutputSink;

pub mod bits;
pub mod console;
pub mod math;
pub mod time;

// Re-export for convenience
pub use self::bits::register as register_bits;
pub use self::console::register as register_console;
pub use self::math::register as register_math;
pub use self::time::register as register_time;

/// Register all built-in functions. Console output goes through `out`.
pub fn register_builtins(table: &mut FnTable, out: &OutputSink) {
    register_math(table);
    register_bits(table);
    register_console(table, out);
    register_time(table);
}
