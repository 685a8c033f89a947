// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache reports, pretty-printing and JSON export for limner diagnostics.
//!
//! - [`report`]: [`RuleReport`](report::RuleReport) snapshots of what the
//!   caches of a style settled on.
//! - [`pretty`]: human-readable one-line-per-cache output.
//! - [`json`]: JSON export of the same reports.

pub mod json;
pub mod pretty;
pub mod report;
