//! Developer dump of arbitrary values, bypassing the structured pipeline

use chrono::Local;
use logit_core::DEBUG_RULE_WIDTH;
use std::fmt::Debug;
use std::io::{self, Write};

/// Write a framed dump of `values`, one line per value
pub(crate) fn write_dump<W: Write>(out: &mut W, values: &[&dyn Debug]) -> io::Result<()> {
    let rule = "-".repeat(DEBUG_RULE_WIDTH);

    writeln!(out, "{}", rule)?;
    writeln!(out, "[DEBUG] {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    for (i, value) in values.iter().enumerate() {
        writeln!(out, "Field {}: {:?}", i, value)?;
    }
    writeln!(out, "{}", rule)?;

    out.flush()
}
