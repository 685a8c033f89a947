// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable cache reports.
//!
//! [`PrettyPrinter`] writes one line per rule and one indented line per
//! symbolizer to a [`Write`] destination (default: stderr).

use std::io::{self, Write};

use crate::report::{RuleReport, SymbolizerReport};

/// Writes human-readable report lines to a [`Write`] destination.
pub struct PrettyPrinter<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrinter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrinter").finish_non_exhaustive()
    }
}

impl PrettyPrinter {
    /// Creates a printer that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(io::stderr()),
        }
    }
}

impl<W: Write> PrettyPrinter<W> {
    /// Creates a printer that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes one rule and its symbolizers.
    pub fn print_rule(&mut self, rule: &RuleReport) -> io::Result<()> {
        writeln!(
            self.writer,
            "[rule] {}{} filter={} {} {}{} margin={:.1}",
            rule.name.as_deref().unwrap_or("<unnamed>"),
            if rule.is_else { " (else)" } else { "" },
            rule.filter,
            staticness(rule.is_static),
            rule.visibility,
            attributes(&rule.required),
            rule.margin,
        )?;
        for symbolizer in &rule.symbolizers {
            self.print_symbolizer(symbolizer)?;
        }
        for reason in &rule.omitted {
            writeln!(self.writer, "  [omitted] {reason}")?;
        }
        Ok(())
    }

    fn print_symbolizer(&mut self, s: &SymbolizerReport) -> io::Result<()> {
        writeln!(
            self.writer,
            "  [{}] {} {}{} margin={:.1}",
            s.kind,
            staticness(s.is_static),
            s.visibility,
            attributes(&s.required),
            s.margin,
        )
    }
}

fn staticness(is_static: bool) -> &'static str {
    if is_static { "static" } else { "dynamic" }
}

fn attributes(required: &[String]) -> String {
    if required.is_empty() {
        String::new()
    } else {
        format!(" reads=[{}]", required.join(","))
    }
}

/// Writes every report to `writer`.
pub fn write_report(writer: &mut dyn Write, reports: &[RuleReport]) -> io::Result<()> {
    let mut printer = PrettyPrinter::with_writer(writer);
    for report in reports {
        printer.print_rule(report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::report_rules;
    use crate::report::tests::style;
    use limner_core::registry::CacheRegistry;

    #[test]
    fn one_line_per_cache() {
        let reports = report_rules(&CacheRegistry::default(), &style());
        let mut out = Vec::new();
        write_report(&mut out, &reports).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("[rule] roads filter=dynamic dynamic depends-on-feature"));
        assert!(lines[0].contains("reads=[pop,width_mm]"));
        assert!(lines[1].starts_with("  [line] dynamic"));
        assert!(lines[2].starts_with("  [omitted] raster outline"));
        assert!(lines[3].starts_with("[rule] <unnamed> (else) filter=accept-all static always"));
        assert!(lines[4].starts_with("  [point] static always"));
    }
}
