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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dwm::{
    DwmConfig, DwmDeriveRule, DwmDeriveType, DwmError, DwmFieldConfig, DwmHistory,
    DwmHistoryEntry, DwmHistoryMetrics, DwmIncludesRule, DwmLookupStore, DwmLookupType,
    DwmMemoryStore, DwmPipeline, DwmPipelineBuilder, DwmRecord, DwmRegexRule, DwmUdfPosition,
    DwmUdfTable, Result,
};

fn country_store() -> DwmMemoryStore {
    let mut store = DwmMemoryStore::new();
    store
        .add_lookup(DwmLookupType::NormLookup, "country", "USA", "United States")
        .unwrap();
    store
}

fn country_pipeline() -> DwmPipeline {
    DwmPipelineBuilder::new("countries")
        .store(country_store())
        .field(
            "country",
            DwmFieldConfig::new().with_lookup(DwmLookupType::NormLookup),
        )
        .build()
        .unwrap()
}

#[test]
fn norm_lookup_replaces_country() {
    let (record, history) = country_pipeline()
        .run(DwmRecord::new().with("country", "USA"), None)
        .unwrap();

    assert_eq!(record.get("country"), Some("United States"));
    assert_eq!(
        history.entries("country"),
        &[DwmHistoryEntry::LookupApplied {
            stage: DwmLookupType::NormLookup,
            from: "USA".into(),
            to: "United States".into(),
        }]
    );
}

#[test]
fn unknown_country_is_kept_with_no_match() {
    let (record, history) = country_pipeline()
        .run(DwmRecord::new().with("country", "Mars"), None)
        .unwrap();

    assert_eq!(record.get("country"), Some("Mars"));
    let entry = history.last("country").unwrap();
    assert!(entry.is_no_match());
    assert_eq!(entry.stage(), DwmLookupType::NormLookup.into());
}

#[test]
fn empty_record_passes_through() {
    let (record, history) = country_pipeline().run(DwmRecord::new(), None).unwrap();
    assert!(record.is_empty());
    assert!(history.is_empty());
}

#[test]
fn before_derive_hook_is_visible_to_derive() {
    let pipeline = DwmPipelineBuilder::new("hooks")
        .store(DwmMemoryStore::new())
        .field(
            "status",
            DwmFieldConfig::new()
                .with_derive(DwmDeriveRule::new(DwmDeriveType::CopyValue, ["flag"])),
        )
        .udf(DwmUdfPosition::BeforeDerive, |mut record, history| {
            record.set("flag", "seen");
            Ok((record, history))
        })
        .build()
        .unwrap();

    let (record, history) = pipeline.run(DwmRecord::new(), None).unwrap();
    assert_eq!(record.get("flag"), Some("seen"));
    assert_eq!(record.get("status"), Some("seen"));
    assert!(history.last("status").unwrap().is_match());
}

#[test]
fn hooks_run_in_pipeline_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut udfs = DwmUdfTable::new();
    for position in DwmUdfPosition::ALL.iter().rev() {
        let seen = Arc::clone(&seen);
        let position = *position;
        udfs.register(position, move |record, history| {
            seen.lock().unwrap().push(position);
            Ok((record, history))
        });
    }

    let pipeline = DwmPipeline::new(
        "order",
        Arc::new(DwmMemoryStore::new()),
        Default::default(),
        udfs,
    )
    .unwrap();
    pipeline.run(DwmRecord::new(), None).unwrap();

    assert_eq!(*seen.lock().unwrap(), DwmUdfPosition::ALL.to_vec());
}

#[test]
fn hook_can_rewrite_value_before_lookup() {
    let pipeline = DwmPipelineBuilder::new("rewrite")
        .store(country_store())
        .field(
            "country",
            DwmFieldConfig::new().with_lookup(DwmLookupType::NormLookup),
        )
        .udf_named("beforeNormLookup", |mut record, history| {
            if record.get("country") == Some("U.S.A.") {
                record.set("country", "USA");
            }
            Ok((record, history))
        })
        .build()
        .unwrap();

    let (record, _) = pipeline
        .run(DwmRecord::new().with("country", "U.S.A."), None)
        .unwrap();
    assert_eq!(record.get("country"), Some("United States"));
}

#[test]
fn hook_error_aborts_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let after = Arc::clone(&calls);

    let pipeline = DwmPipelineBuilder::new("failing")
        .store(country_store())
        .udf(DwmUdfPosition::BeforeNormRegex, |_, _| {
            Err(DwmError::udf("hook rejected record"))
        })
        .udf(DwmUdfPosition::AfterAll, move |record, history| {
            after.fetch_add(1, Ordering::SeqCst);
            Ok((record, history))
        })
        .build()
        .unwrap();

    let err = pipeline.run(DwmRecord::new(), None).unwrap_err();
    assert_eq!(err, DwmError::udf("hook rejected record"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Store whose lookups always fail.
struct OfflineStore;

impl DwmLookupStore for OfflineStore {
    fn name(&self) -> &str {
        "offline"
    }

    fn lookup(&self, _: &str, _: DwmLookupType, _: &str) -> Result<Option<String>> {
        Err(DwmError::lookup_store("store offline"))
    }

    fn regex_rules(&self, _: &str, _: DwmLookupType) -> Result<Vec<DwmRegexRule>> {
        Ok(Vec::new())
    }

    fn includes_rules(&self, _: &str) -> Result<Vec<DwmIncludesRule>> {
        Ok(Vec::new())
    }
}

#[test]
fn store_error_aborts_run() {
    let pipeline = DwmPipelineBuilder::new("offline")
        .store(OfflineStore)
        .field(
            "country",
            DwmFieldConfig::new().with_lookup(DwmLookupType::NormLookup),
        )
        .build()
        .unwrap();

    let err = pipeline
        .run(DwmRecord::new().with("country", "USA"), None)
        .unwrap_err();
    assert_eq!(err, DwmError::lookup_store("store offline"));

    // Nothing configured to query: the failing store is never reached.
    let (record, _) = pipeline
        .run(DwmRecord::new().with("city", "Paris"), None)
        .unwrap();
    assert_eq!(record.get("city"), Some("Paris"));
}

#[test]
fn history_is_threaded_across_runs() {
    let pipeline = country_pipeline();
    let (record, history) = pipeline
        .run(DwmRecord::new().with("country", "USA"), None)
        .unwrap();
    let (record, history) = pipeline.run(record, Some(history)).unwrap();

    assert_eq!(record.get("country"), Some("United States"));
    let entries = history.entries("country");
    assert_eq!(entries.len(), 2);
    assert!(entries[0].is_match());
    assert!(entries[1].is_no_match());
}

#[test]
fn stages_chain_within_one_run() {
    let mut store = DwmMemoryStore::new();
    store
        .add_regex(DwmLookupType::GenericRegex, "", r"\s*\(.*\)$", "")
        .unwrap()
        .add_lookup(DwmLookupType::NormLookup, "country", "uk", "United Kingdom")
        .unwrap()
        .add_derive_value("region", &[("country", "United Kingdom")], "EMEA");

    let pipeline = DwmPipelineBuilder::new("chain")
        .store(store)
        .field(
            "country",
            DwmFieldConfig::new()
                .with_lookup(DwmLookupType::GenericRegex)
                .with_lookup(DwmLookupType::NormLookup),
        )
        .field(
            "region",
            DwmFieldConfig::new()
                .with_derive(DwmDeriveRule::new(DwmDeriveType::DeriveValue, ["country"])),
        )
        .build()
        .unwrap();

    let (record, history) = pipeline
        .run(DwmRecord::new().with("country", "UK (GB)"), None)
        .unwrap();

    assert_eq!(record.get("country"), Some("United Kingdom"));
    assert_eq!(record.get("region"), Some("EMEA"));
    assert_eq!(history.entries("country").len(), 2);
    assert_eq!(
        history
            .entries_for_stage("country", DwmLookupType::GenericRegex)
            .count(),
        1
    );
}

#[test]
fn fixture_config_runs_end_to_end() {
    let mut store = DwmMemoryStore::new();
    store
        .add_lookup(DwmLookupType::GenericLookup, "", "n/a", "")
        .unwrap()
        .add_lookup(DwmLookupType::NormLookup, "country", "usa", "United States")
        .unwrap()
        .add_lookup(DwmLookupType::NormLookup, "state", "calif", "CA")
        .unwrap()
        .add_regex(DwmLookupType::FieldSpecificRegex, "state", r"\.$", "")
        .unwrap()
        .add_includes(
            "title",
            DwmIncludesRule::new("vice,president", "Vice President"),
        )
        .add_derive_value("region", &[("country", "United States")], "Americas");

    let config = DwmConfig::from_file("tests/fixtures/contacts.yaml").unwrap();
    let pipeline =
        DwmPipeline::from_config(config, Arc::new(store), DwmUdfTable::new()).unwrap();

    let input = DwmRecord::new()
        .with("country", "USA")
        .with("state", "Calif.")
        .with("title", "SVP / Vice President, Sales")
        .with("zip", "94107")
        .with("regionHint", "West Coast");
    let (record, history) = pipeline.run(input, None).unwrap();

    assert_eq!(record.get("country"), Some("United States"));
    assert_eq!(record.get("state"), Some("CA"));
    assert_eq!(record.get("title"), Some("Vice President"));
    // deriveValue fills the region, then copyValue overwrites it.
    assert_eq!(record.get("region"), Some("West Coast"));
    assert_eq!(history.entries("region").len(), 2);
    // state is non-blank and its derive rule lacks overwrite.
    assert!(matches!(
        history.last("state"),
        Some(DwmHistoryEntry::DeriveSkipped { .. })
    ));
}

#[test]
fn run_batch_keeps_input_order() {
    let pipeline = country_pipeline();
    let records: Vec<DwmRecord> = ["USA", "Mars", "usa", ""]
        .iter()
        .map(|c| DwmRecord::new().with("country", *c))
        .collect();

    let results = pipeline.run_batch(records);
    let countries: Vec<_> = results
        .iter()
        .map(|r| r.as_ref().unwrap().0.get("country").unwrap().to_string())
        .collect();
    assert_eq!(countries, vec!["United States", "Mars", "United States", ""]);

    let histories: Vec<&DwmHistory> = results.iter().map(|r| &r.as_ref().unwrap().1).collect();
    let metrics = DwmHistoryMetrics::compute_all(histories);
    assert_eq!(metrics.matches_by_stage.get("normLookup"), Some(&2));
    assert_eq!(metrics.no_matches_by_stage.get("normLookup"), Some(&1));
    assert_eq!(metrics.fields_touched, 3);
}

#[test]
fn run_batch_isolates_failures() {
    let pipeline = DwmPipelineBuilder::new("batch")
        .store(DwmMemoryStore::new())
        .udf(DwmUdfPosition::AfterAll, |record, history| {
            if record.get("id") == Some("2") {
                return Err(DwmError::udf("rejected 2"));
            }
            Ok((record, history))
        })
        .build()
        .unwrap();

    let results = pipeline.run_batch(
        ["1", "2", "3"]
            .iter()
            .map(|id| DwmRecord::new().with("id", *id))
            .collect(),
    );
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err(), &DwmError::udf("rejected 2"));
    assert!(results[2].is_ok());
}

#[test]
fn progress_reports_every_step() {
    let pipeline = country_pipeline();
    let mut steps = Vec::new();
    pipeline
        .run_with_progress(
            DwmRecord::new().with("country", "USA"),
            None,
            |step, added| steps.push((step.to_string(), added)),
        )
        .unwrap();

    assert_eq!(steps.len(), 17);
    assert_eq!(steps[0].0, "beforeGenericValLookup");
    assert_eq!(steps[16].0, "afterAll");
    let with_entries: Vec<_> = steps.iter().filter(|(_, added)| *added > 0).collect();
    assert_eq!(with_entries, vec![&("normLookup".to_string(), 1usize)]);
}
