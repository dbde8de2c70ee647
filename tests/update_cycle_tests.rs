//! Full update cycles against in-memory bridges.

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::cell::RefCell;
use std::rc::Rc;

use phlux::config::Config;
use phlux::credentials::{Credential, CredentialStore, CredentialTable, GatewayId};
use phlux::gateway::{Fixture, FixtureState, Gateway, GatewayDiscovery, GatewayInfo};
use phlux::geo::{GeoCoordinate, SolarClock};
use phlux::logger::Log;
use phlux::orchestrator::run_cycle;
use phlux::temperature::{FixtureCapability, Kelvin};

struct FixedClock;

impl SolarClock for FixedClock {
    fn sunrise_at(&self, _: NaiveDate, _: GeoCoordinate) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(2023, 6, 21, 5, 0, 0).single()
    }

    fn sunset_at(&self, _: NaiveDate, _: GeoCoordinate) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(2023, 6, 21, 20, 0, 0).single()
    }
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 6, 21, 12, 0, 0).unwrap()
}

fn midnight() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 6, 21, 23, 30, 0).unwrap()
}

/// Everything the fake bridges were asked to do.
#[derive(Default)]
struct Journal {
    updates: Vec<(String, String, FixtureState)>,
    provisions: Vec<String>,
    logins: Vec<(String, String)>,
}

type SharedJournal = Rc<RefCell<Journal>>;

#[derive(Clone)]
struct FakeBridge {
    host: String,
    id: Option<&'static str>,
    accepted_token: &'static str,
    issues_token: Option<&'static str>,
    fixtures: Vec<Fixture>,
    failing_fixture: Option<&'static str>,
    journal: SharedJournal,
    logged_in: bool,
}

impl FakeBridge {
    fn new(host: &str, id: &'static str, journal: &SharedJournal) -> Self {
        Self {
            host: host.to_string(),
            id: Some(id),
            accepted_token: "token",
            issues_token: None,
            fixtures: Vec::new(),
            failing_fixture: None,
            journal: Rc::clone(journal),
            logged_in: false,
        }
    }

    fn with_fixture(mut self, id: &str, on: bool, min: u16, max: u16) -> Self {
        self.fixtures.push(Fixture {
            id: id.to_string(),
            name: format!("Light {id}"),
            kind: "Extended color light".to_string(),
            on,
            capability: FixtureCapability::new(min, max),
        });
        self
    }
}

impl Gateway for FakeBridge {
    fn address(&self) -> String {
        self.host.clone()
    }

    fn fetch_info(&mut self) -> Result<GatewayInfo> {
        match self.id {
            Some(id) => Ok(GatewayInfo {
                id: GatewayId::new(id),
                name: None,
            }),
            None => bail!("config endpoint unavailable"),
        }
    }

    fn login(&mut self, credential: &Credential) -> Result<()> {
        self.journal
            .borrow_mut()
            .logins
            .push((self.host.clone(), credential.expose().to_string()));
        if credential.expose() != self.accepted_token {
            bail!("unauthorized user");
        }
        self.logged_in = true;
        Ok(())
    }

    fn provision(&mut self, _app_name: &str) -> Result<Credential> {
        self.journal.borrow_mut().provisions.push(self.host.clone());
        self.issues_token
            .map(Credential::new)
            .ok_or_else(|| anyhow!("link button not pressed"))
    }

    fn list_fixtures(&mut self) -> Result<Vec<Fixture>> {
        if !self.logged_in {
            bail!("not logged in");
        }
        Ok(self.fixtures.clone())
    }

    fn set_fixture_state(&mut self, fixture: &Fixture, state: FixtureState) -> Result<()> {
        if self.failing_fixture == Some(fixture.id.as_str()) {
            bail!("device unreachable");
        }
        self.journal
            .borrow_mut()
            .updates
            .push((self.host.clone(), fixture.id.clone(), state));
        Ok(())
    }
}

struct FakeDiscovery {
    bridges: Vec<FakeBridge>,
    fails: bool,
}

impl GatewayDiscovery for FakeDiscovery {
    fn discover(&self) -> Result<Vec<Box<dyn Gateway>>> {
        if self.fails {
            bail!("discovery service unreachable");
        }
        Ok(self
            .bridges
            .iter()
            .cloned()
            .map(|bridge| Box::new(bridge) as Box<dyn Gateway>)
            .collect())
    }
}

fn discovery(bridges: Vec<FakeBridge>) -> FakeDiscovery {
    FakeDiscovery {
        bridges,
        fails: false,
    }
}

fn store_with(entries: &[(&str, &str)]) -> CredentialTable {
    let mut table = CredentialTable::new();
    for (id, token) in entries {
        table.insert(GatewayId::new(id), Credential::new(*token));
    }
    table
}

fn setup() -> SharedJournal {
    Log::set_enabled(false);
    SharedJournal::default()
}

#[test]
fn test_daytime_cycle_updates_supported_fixtures() {
    let journal = setup();
    let bridge = FakeBridge::new("10.0.0.2", "bridge-a", &journal)
        .with_fixture("1", true, 153, 500)
        .with_fixture("2", false, 200, 454)
        .with_fixture("3", true, 0, 0);
    let mut store = store_with(&[("bridge-a", "token")]);
    let config = Config {
        transition_time: Some(40),
        ..Config::default()
    };

    let report = run_cycle(&discovery(vec![bridge]), &mut store, &config, &FixedClock, &noon()).unwrap();

    assert_eq!(report.kelvin, Kelvin(6500));
    assert_eq!(report.fixtures_updated, 2);
    assert_eq!(report.fixtures_skipped, 1);
    assert!(report.is_clean());

    let journal = journal.borrow();
    assert_eq!(
        journal.updates,
        vec![
            (
                "10.0.0.2".to_string(),
                "1".to_string(),
                FixtureState {
                    on: true,
                    ct: 153,
                    transition_time: Some(40),
                }
            ),
            (
                "10.0.0.2".to_string(),
                "2".to_string(),
                FixtureState {
                    on: false,
                    ct: 200,
                    transition_time: Some(40),
                }
            ),
        ]
    );
    assert!(journal.provisions.is_empty());
}

#[test]
fn test_nighttime_cycle_clamps_to_each_range() {
    let journal = setup();
    let bridge = FakeBridge::new("10.0.0.2", "bridge-a", &journal)
        .with_fixture("1", true, 153, 500)
        .with_fixture("2", true, 153, 454);
    let mut store = store_with(&[("bridge-a", "token")]);

    let report = run_cycle(
        &discovery(vec![bridge]),
        &mut store,
        &Config::default(),
        &FixedClock,
        &midnight(),
    )
    .unwrap();

    assert_eq!(report.kelvin, Kelvin(1800));
    let values: Vec<u16> = journal.borrow().updates.iter().map(|(_, _, s)| s.ct).collect();
    assert_eq!(values, vec![500, 454]);
}

#[test]
fn test_fixture_failure_does_not_stop_remaining_fixtures() {
    let journal = setup();
    let mut bridge = FakeBridge::new("10.0.0.2", "bridge-a", &journal)
        .with_fixture("1", true, 153, 500)
        .with_fixture("2", true, 153, 500)
        .with_fixture("3", true, 153, 500);
    bridge.failing_fixture = Some("2");
    let mut store = store_with(&[("bridge-a", "token")]);

    let report = run_cycle(&discovery(vec![bridge]), &mut store, &Config::default(), &FixedClock, &noon()).unwrap();

    assert_eq!(report.fixtures_updated, 2);
    assert_eq!(report.fixtures_failed, 1);
    assert_eq!(report.gateways_failed, 0);
    let ids: Vec<String> = journal.borrow().updates.iter().map(|(_, id, _)| id.clone()).collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[test]
fn test_failing_bridge_does_not_affect_others() {
    let journal = setup();
    let revoked = FakeBridge::new("10.0.0.2", "bridge-a", &journal).with_fixture("1", true, 153, 500);
    let healthy = FakeBridge::new("10.0.0.3", "bridge-b", &journal).with_fixture("1", true, 153, 500);
    let mut store = store_with(&[("bridge-a", "revoked"), ("bridge-b", "token")]);

    let report = run_cycle(
        &discovery(vec![revoked, healthy]),
        &mut store,
        &Config::default(),
        &FixedClock,
        &noon(),
    )
    .unwrap();

    assert_eq!(report.gateways, 2);
    assert_eq!(report.gateways_failed, 1);
    assert_eq!(report.fixtures_updated, 1);

    let journal = journal.borrow();
    assert_eq!(journal.updates[0].0, "10.0.0.3");
    // A rejected stored credential is never replaced by registering again
    assert!(journal.provisions.is_empty());
    assert_eq!(store.lookup(&GatewayId::new("bridge-a")), Some(Credential::new("revoked")));
}

#[test]
fn test_new_bridge_is_registered_once_and_reused() {
    let journal = setup();
    let mut bridge = FakeBridge::new("10.0.0.2", "bridge-a", &journal).with_fixture("1", true, 153, 500);
    bridge.accepted_token = "issued";
    bridge.issues_token = Some("issued");
    let discovery = discovery(vec![bridge]);
    let mut store = CredentialTable::new();

    run_cycle(&discovery, &mut store, &Config::default(), &FixedClock, &noon()).unwrap();
    assert_eq!(store.lookup(&GatewayId::new("bridge-a")), Some(Credential::new("issued")));

    run_cycle(&discovery, &mut store, &Config::default(), &FixedClock, &noon()).unwrap();

    let journal = journal.borrow();
    assert_eq!(journal.provisions.len(), 1);
    assert_eq!(journal.updates.len(), 2);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_link_button_not_pressed_fails_only_that_bridge() {
    let journal = setup();
    let unregistered = FakeBridge::new("10.0.0.2", "bridge-a", &journal).with_fixture("1", true, 153, 500);
    let registered = FakeBridge::new("10.0.0.3", "bridge-b", &journal).with_fixture("1", true, 153, 500);
    let mut store = store_with(&[("bridge-b", "token")]);

    let report = run_cycle(
        &discovery(vec![unregistered, registered]),
        &mut store,
        &Config::default(),
        &FixedClock,
        &noon(),
    )
    .unwrap();

    assert_eq!(report.gateways_failed, 1);
    assert_eq!(report.fixtures_updated, 1);
    assert!(store.lookup(&GatewayId::new("bridge-a")).is_none());
}

#[test]
fn test_bridge_without_identity_still_updates_but_is_not_saved() {
    let journal = setup();
    let mut bridge = FakeBridge::new("10.0.0.2", "unused", &journal).with_fixture("1", true, 153, 500);
    bridge.id = None;
    bridge.accepted_token = "issued";
    bridge.issues_token = Some("issued");
    let mut store = CredentialTable::new();

    let report = run_cycle(&discovery(vec![bridge]), &mut store, &Config::default(), &FixedClock, &noon()).unwrap();

    assert_eq!(report.fixtures_updated, 1);
    assert!(store.is_empty());
}

#[test]
fn test_discovery_failure_aborts_cycle() {
    let journal = setup();
    let bridge = FakeBridge::new("10.0.0.2", "bridge-a", &journal).with_fixture("1", true, 153, 500);
    let failing = FakeDiscovery {
        bridges: vec![bridge],
        fails: true,
    };
    let mut store = store_with(&[("bridge-a", "token")]);

    assert!(run_cycle(&failing, &mut store, &Config::default(), &FixedClock, &noon()).is_err());
    assert!(journal.borrow().updates.is_empty());
}

#[test]
fn test_no_bridges_found_aborts_cycle() {
    setup();
    let mut store = CredentialTable::new();
    let error = run_cycle(&discovery(Vec::new()), &mut store, &Config::default(), &FixedClock, &noon())
        .unwrap_err();
    assert!(error.to_string().contains("No bridges"));
}
