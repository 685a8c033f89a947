// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of cache reports.

use std::io::{self, Write};

use serde_json::json;

use crate::report::RuleReport;

/// Writes `reports` as a JSON object to `writer`.
///
/// The output has a `rules` array with one object per [`RuleReport`] and a
/// top-level `required` array: the sorted union of every rule's attributes,
/// which is what a feature loader has to fetch.
pub fn export(reports: &[RuleReport], writer: &mut dyn Write) -> io::Result<()> {
    let mut required: Vec<&str> = reports
        .iter()
        .flat_map(|r| r.required.iter().map(String::as_str))
        .collect();
    required.sort_unstable();
    required.dedup();

    let document = json!({
        "rules": reports,
        "required": required,
    });
    serde_json::to_writer_pretty(writer, &document)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::report_rules;
    use crate::report::tests::style;
    use limner_core::registry::CacheRegistry;
    use serde_json::Value;

    #[test]
    fn export_produces_valid_json() {
        let reports = report_rules(&CacheRegistry::default(), &style());
        let mut out = Vec::new();
        export(&reports, &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(parsed["required"], json!(["pop", "width_mm"]));
        let rules = parsed["rules"].as_array().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0]["name"], "roads");
        assert_eq!(rules[0]["symbolizers"][0]["kind"], "line");
        assert_eq!(rules[1]["name"], Value::Null);
        assert_eq!(rules[1]["visibility"], "always");
    }

    #[test]
    fn export_empty_report() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert!(parsed["rules"].as_array().unwrap().is_empty());
    }
}
