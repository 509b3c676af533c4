//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Dwm.
//! The Dwm project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

use dwm::{
    DwmError, DwmFieldConfig, DwmFieldsTable, DwmHistory, DwmHistoryEntry, DwmIncludesRule,
    DwmIncludesStage, DwmLookupStage, DwmLookupStore, DwmLookupType, DwmMemoryStore, DwmRecord,
    DwmRegexRule, DwmRegexStage, DwmStage, DwmStageContext, Result,
};

/// Store that fails every query.
struct BrokenStore;

impl DwmLookupStore for BrokenStore {
    fn lookup(&self, field: &str, _: DwmLookupType, _: &str) -> Result<Option<String>> {
        Err(DwmError::lookup_store(format!("connection lost while reading '{field}'")))
    }

    fn regex_rules(&self, _: &str, _: DwmLookupType) -> Result<Vec<DwmRegexRule>> {
        Err(DwmError::lookup_store("connection lost"))
    }

    fn includes_rules(&self, _: &str) -> Result<Vec<DwmIncludesRule>> {
        Err(DwmError::lookup_store("connection lost"))
    }
}

fn table(entries: &[(&str, &[DwmLookupType])]) -> DwmFieldsTable {
    entries
        .iter()
        .map(|(name, lookups)| {
            let config = lookups
                .iter()
                .fold(DwmFieldConfig::new(), |c, l| c.with_lookup(*l));
            (name.to_string(), config)
        })
        .collect()
}

#[test]
fn lookup_stage_skips_blank_and_unconfigured_fields() {
    let mut store = DwmMemoryStore::new();
    store
        .add_lookup(DwmLookupType::GenericLookup, "", "x", "replaced")
        .unwrap();
    let fields = table(&[
        ("a", &[DwmLookupType::GenericLookup]),
        ("b", &[DwmLookupType::GenericLookup]),
    ]);
    let ctx = DwmStageContext::new(&fields, &store);

    let mut record = DwmRecord::new().with("a", "").with("c", "x");
    record.set_null("b");
    let stage = DwmLookupStage::new(DwmLookupType::GenericLookup).unwrap();
    let (out, history) = stage.apply(&ctx, record.clone(), DwmHistory::new()).unwrap();

    assert_eq!(out, record);
    assert!(history.is_empty());
}

#[test]
fn lookup_stage_results_do_not_depend_on_other_fields() {
    // "first" maps to the starting value of "second" and vice versa; each
    // field must be looked up with its own value from before the pass.
    let mut store = DwmMemoryStore::new();
    store
        .add_lookup(DwmLookupType::FieldSpecificLookup, "first", "one", "two")
        .unwrap()
        .add_lookup(DwmLookupType::FieldSpecificLookup, "second", "two", "one")
        .unwrap();
    let fields = table(&[
        ("first", &[DwmLookupType::FieldSpecificLookup]),
        ("second", &[DwmLookupType::FieldSpecificLookup]),
    ]);
    let ctx = DwmStageContext::new(&fields, &store);

    let stage = DwmLookupStage::new(DwmLookupType::FieldSpecificLookup).unwrap();
    let record = DwmRecord::new().with("first", "one").with("second", "two");
    let (out, _) = stage.apply(&ctx, record, DwmHistory::new()).unwrap();

    assert_eq!(out.get("first"), Some("two"));
    assert_eq!(out.get("second"), Some("one"));
}

#[test]
fn no_match_keeps_value_and_is_recorded() {
    let store = DwmMemoryStore::new();
    let fields = table(&[("country", &[DwmLookupType::NormLookup])]);
    let ctx = DwmStageContext::new(&fields, &store);

    let stage = DwmLookupStage::new(DwmLookupType::NormLookup).unwrap();
    let (out, history) = stage
        .apply(&ctx, DwmRecord::new().with("country", "Mars"), DwmHistory::new())
        .unwrap();

    assert_eq!(out.get("country"), Some("Mars"));
    assert_eq!(
        history.entries("country"),
        &[DwmHistoryEntry::NoMatch {
            stage: DwmLookupType::NormLookup.into(),
            value: Some("Mars".into()),
        }]
    );
}

#[test]
fn regex_stage_uses_only_its_own_table() {
    let mut store = DwmMemoryStore::new();
    store
        .add_regex(DwmLookupType::NormRegex, "company", r"(?:,)?\s+inc\.?$", "")
        .unwrap()
        .add_regex(DwmLookupType::FieldSpecificRegex, "company", r".*", "WRONG")
        .unwrap();
    let fields = table(&[("company", &[DwmLookupType::NormRegex])]);
    let ctx = DwmStageContext::new(&fields, &store);

    let stage = DwmRegexStage::new(DwmLookupType::NormRegex).unwrap();
    let (out, history) = stage
        .apply(&ctx, DwmRecord::new().with("company", "Acme, Inc."), DwmHistory::new())
        .unwrap();

    assert_eq!(out.get("company"), Some("Acme"));
    assert!(matches!(
        history.last("company"),
        Some(DwmHistoryEntry::RegexApplied { stage: DwmLookupType::NormRegex, .. })
    ));
}

#[test]
fn regex_stage_without_match_records_no_match() {
    let mut store = DwmMemoryStore::new();
    store
        .add_regex(DwmLookupType::GenericRegex, "", r"^n/?a$", "")
        .unwrap();
    let fields = table(&[("email", &[DwmLookupType::GenericRegex])]);
    let ctx = DwmStageContext::new(&fields, &store);

    let stage = DwmRegexStage::new(DwmLookupType::GenericRegex).unwrap();
    let (out, history) = stage
        .apply(&ctx, DwmRecord::new().with("email", "ada@example.com"), DwmHistory::new())
        .unwrap();

    assert_eq!(out.get("email"), Some("ada@example.com"));
    assert!(history.last("email").unwrap().is_no_match());
}

#[test]
fn includes_stage_honours_excludes() {
    let mut store = DwmMemoryStore::new();
    store
        .add_includes(
            "title",
            DwmIncludesRule::new("manager", "Manager").with_excludes("assistant"),
        )
        .add_includes("title", DwmIncludesRule::new("assistant", "Assistant"));
    let fields = table(&[("title", &[DwmLookupType::NormIncludes])]);
    let ctx = DwmStageContext::new(&fields, &store);

    let (out, history) = DwmIncludesStage::new()
        .apply(
            &ctx,
            DwmRecord::new().with("title", "Assistant Manager"),
            DwmHistory::new(),
        )
        .unwrap();

    assert_eq!(out.get("title"), Some("Assistant"));
    match history.last("title").unwrap() {
        DwmHistoryEntry::IncludesApplied { rule, from, .. } => {
            assert_eq!(rule, "includes=assistant");
            assert_eq!(from, "Assistant Manager");
        }
        other => panic!("unexpected entry: {other:?}"),
    }
}

#[test]
fn store_errors_propagate_unchanged() {
    let store = BrokenStore;
    let fields = table(&[("country", &[DwmLookupType::NormLookup])]);
    let ctx = DwmStageContext::new(&fields, &store);

    let stage = DwmLookupStage::new(DwmLookupType::NormLookup).unwrap();
    let err = stage
        .apply(&ctx, DwmRecord::new().with("country", "USA"), DwmHistory::new())
        .unwrap_err();
    assert_eq!(
        err,
        DwmError::lookup_store("connection lost while reading 'country'")
    );
}

#[test]
fn unconfigured_stage_never_queries_the_store() {
    // BrokenStore fails on any query, so success proves nothing was asked.
    let store = BrokenStore;
    let fields = table(&[("country", &[DwmLookupType::NormLookup])]);
    let ctx = DwmStageContext::new(&fields, &store);

    let record = DwmRecord::new().with("country", "USA");
    let stage = DwmRegexStage::new(DwmLookupType::NormRegex).unwrap();
    let (out, history) = stage.apply(&ctx, record.clone(), DwmHistory::new()).unwrap();
    assert_eq!(out, record);
    assert!(history.is_empty());
}

#[test]
fn includes_rule_without_terms_is_not_a_catch_all() {
    let mut store = DwmMemoryStore::new();
    store.add_includes("title", DwmIncludesRule::new(" , ", "Anything"));
    let fields = table(&[("title", &[DwmLookupType::NormIncludes])]);
    let ctx = DwmStageContext::new(&fields, &store);

    let (out, history) = DwmIncludesStage::new()
        .apply(&ctx, DwmRecord::new().with("title", "Engineer"), DwmHistory::new())
        .unwrap();

    assert_eq!(out.get("title"), Some("Engineer"));
    assert!(history.last("title").unwrap().is_no_match());
}
