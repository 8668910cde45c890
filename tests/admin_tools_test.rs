// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus

use featureadmin::activation::{Action, AdminError, Location, ScopeLevel, ValidationError};
use featureadmin::admin_tools::AdminTools;
use featureadmin::config::AdminConfig;
use featureadmin::farm::{FarmStore, MemoryFarm};
use featureadmin::log_sink::LogSink;
use std::collections::BTreeSet;
use uuid::Uuid;

const FARM_YAML: &str = r#"
farm:
  id: 00000000-0000-0000-0000-0000000000f0
  name: Local Farm
  web_applications:
    - id: 00000000-0000-0000-0000-0000000000a1
      url: http://a
      name: A
      site_collections:
        - id: 00000000-0000-0000-0000-0000000000c1
          url: http://a/sites/s
          name: S
          features:
            - 11111111-1111-1111-1111-111111111111
          webs:
            - id: 00000000-0000-0000-0000-0000000000e1
              url: http://a/sites/s
              name: S
            - id: 00000000-0000-0000-0000-0000000000e2
              url: http://a/sites/s/w2
              name: W2
              features:
                - 99999999-9999-9999-9999-999999999999
    - id: 00000000-0000-0000-0000-0000000000a2
      url: http://b
      name: B
definitions:
  - id: 11111111-1111-1111-1111-111111111111
    name: Publishing
    scope: site_collection
  - id: 22222222-2222-2222-2222-222222222222
    name: Wiki
    scope: web
"#;

fn id(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap()
}

fn publishing() -> Uuid {
    id("11111111-1111-1111-1111-111111111111")
}

fn wiki() -> Uuid {
    id("22222222-2222-2222-2222-222222222222")
}

fn orphan() -> Uuid {
    id("99999999-9999-9999-9999-999999999999")
}

fn tools() -> AdminTools<MemoryFarm> {
    let snapshot = featureadmin::farm::FarmSnapshot::parse(FARM_YAML).unwrap();
    AdminTools::new(
        MemoryFarm::from_snapshot(&snapshot).unwrap(),
        &AdminConfig::default(),
    )
}

#[test]
fn test_scan_and_feature_listing() {
    let tools = tools();
    let report = tools.scan();
    assert!(report.errors.is_empty());
    assert_eq!(report.locations_visited, 6);
    assert_eq!(report.total_activations, 2);
    assert_eq!(report.faulty_features, 1);

    let listing = tools.features(false);
    assert_eq!(listing.installed, 3);
    let json = serde_json::to_value(&listing).unwrap();
    let names: Vec<&str> = json["features"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Publishing", "Wiki"]);
    assert_eq!(json["features"][2]["faulty"], true);

    let faulty = tools.features(true);
    assert_eq!(faulty.installed, 3);
    assert_eq!(faulty.faulty, 1);
    assert_eq!(faulty.features.len(), 1);
    assert_eq!(faulty.features[0].id, orphan());
}

#[test]
fn test_deactivate_at_site_collection_from_root() {
    let tools = tools();
    let mut sink = LogSink::new("%H:%M").recording();
    let outcome = tools
        .apply(
            Action::Deactivate,
            ScopeLevel::SiteCollection,
            None,
            &[publishing()],
            false,
            &mut sink,
        )
        .unwrap();

    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(sink.lines().len(), 1);
    assert!(sink.lines()[0].contains("Deactivated feature Publishing"));
    assert!(tools.locate(&[publishing()]).is_empty());
}

#[test]
fn test_activate_web_feature_below_selected_site() {
    let tools = tools();
    let site = tools.find_location("http://a/sites/s/").unwrap();
    assert_eq!(site.kind, ScopeLevel::SiteCollection);

    assert_eq!(
        tools.targets(&[wiki()], Some(&site)),
        vec![
            ScopeLevel::Farm,
            ScopeLevel::WebApplication,
            ScopeLevel::SiteCollection
        ]
    );

    let outcome = tools
        .apply(
            Action::Activate,
            ScopeLevel::SiteCollection,
            Some(&site),
            &[wiki()],
            false,
            &mut LogSink::new("%H:%M"),
        )
        .unwrap();
    assert_eq!(outcome.succeeded, 2);
    assert_eq!(tools.locate(&[wiki()]).total_location_count(), 2);
}

#[test]
fn test_site_feature_at_web_rejected_without_side_effects() {
    let tools = tools();
    let web = tools.find_location("http://a/sites/s/w2").unwrap();
    let before = tools.index().fingerprint.clone();

    let err = tools
        .apply(
            Action::Activate,
            ScopeLevel::Web,
            Some(&web),
            &[publishing()],
            false,
            &mut LogSink::new("%H:%M"),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AdminError::Validation(ValidationError::ScopeMismatch { .. })
    ));
    assert!(!tools.provider().is_changed());
    assert_eq!(tools.index().fingerprint, before);
}

#[test]
fn test_remove_faulty_feature_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("farm.yaml");
    std::fs::write(&path, FARM_YAML).unwrap();
    let store = FarmStore::new(&path);
    let tools = AdminTools::new(store.load().unwrap(), &AdminConfig::default());

    let web: BTreeSet<Uuid> = [orphan()].into();
    let mut sink = LogSink::new("%H:%M");
    let first = tools
        .remove(&BTreeSet::new(), &web, None, &mut sink)
        .unwrap();
    assert_eq!(first.succeeded, 1);
    assert_eq!(first.already_absent, 1);

    let second = tools
        .remove(&BTreeSet::new(), &web, None, &mut sink)
        .unwrap();
    assert_eq!(second.succeeded, 0);
    assert_eq!(second.already_absent, 2);

    store.save(tools.provider()).unwrap();
    let reloaded = AdminTools::new(store.load().unwrap(), &AdminConfig::default());
    assert_eq!(reloaded.features(true).features.len(), 0);
}

#[test]
fn test_max_selection_from_config() {
    let config = AdminConfig {
        max_selection: 1,
        ..AdminConfig::default()
    };
    let snapshot = featureadmin::farm::FarmSnapshot::parse(FARM_YAML).unwrap();
    let tools = AdminTools::new(MemoryFarm::from_snapshot(&snapshot).unwrap(), &config);

    let err = tools
        .apply(
            Action::Activate,
            ScopeLevel::Farm,
            Some(&Location::empty()),
            &[publishing(), wiki()],
            false,
            &mut LogSink::new("%H:%M"),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Too many features (2) selected; max 1 may be activated at a time"
    );
}

#[test]
fn test_site_url_resolves_to_site_even_when_root_web_sorts_first() {
    // The root web shares the site's url and gets an id that sorts lower.
    let yaml = FARM_YAML.replace(
        "00000000-0000-0000-0000-0000000000e1",
        "00000000-0000-0000-0000-000000000001",
    );
    let snapshot = featureadmin::farm::FarmSnapshot::parse(&yaml).unwrap();
    let tools = AdminTools::new(
        MemoryFarm::from_snapshot(&snapshot).unwrap(),
        &AdminConfig::default(),
    );

    let at = tools.find_location("http://a/sites/s").unwrap();
    assert_eq!(at.kind, ScopeLevel::SiteCollection);
    assert_eq!(at.id, id("00000000-0000-0000-0000-0000000000c1"));

    let outcome = tools
        .apply(
            Action::Deactivate,
            ScopeLevel::SiteCollection,
            Some(&at),
            &[publishing()],
            false,
            &mut LogSink::new("%H:%M"),
        )
        .unwrap();
    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.succeeded, 1);
}
