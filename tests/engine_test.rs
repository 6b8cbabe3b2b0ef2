// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Engine public API integration tests.

use chrono::TimeDelta;
use fare_transfer::{
    CustomerId, Engine, FareError, FareId, FareSchedule, FareTimestamp, ManualClock,
    MemoryWorldState, SEED_FARE_ID, SequentialFareIds, StoreError, TransitId, WorldState,
    state_digest,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

const START: &str = "2024-03-01T08:00:00";

struct Harness {
    engine: Engine,
    clock: Arc<ManualClock>,
    state: Arc<MemoryWorldState>,
}

fn harness() -> Harness {
    let state = Arc::new(MemoryWorldState::new());
    let clock = Arc::new(ManualClock::new(FareTimestamp::parse(START).unwrap()));
    let engine = Engine::with_sources(
        state.clone(),
        FareSchedule::builtin(),
        clock.clone(),
        Arc::new(SequentialFareIds::new("fare-")),
    );
    Harness {
        engine,
        clock,
        state,
    }
}

fn cid(id: &str) -> CustomerId {
    CustomerId::from(id)
}

fn transit(id: &str) -> TransitId {
    TransitId::from(id)
}

fn enroll(h: &Harness, id: &str, home: &str) {
    h.engine
        .enroll_customer(&cid(id), "Ann", "Lee", &transit(home))
        .unwrap();
}

#[test]
fn first_charge_pays_base_fare_now() {
    let h = harness();
    enroll(&h, "c1", "TTC");
    h.clock.advance(TimeDelta::minutes(5));

    let fare = h.engine.charge_fare(&cid("c1"), &transit("YRT")).unwrap();

    assert_eq!(fare.amount, dec!(4.25));
    assert_eq!(fare.timestamp.to_string(), "2024-03-01T08:05:00");
    assert_eq!(fare.transit, transit("YRT"));
    assert_eq!(fare.id, FareId::from("fare-1"));
}

#[test]
fn charge_links_customer_to_new_fare() {
    let h = harness();
    enroll(&h, "c1", "TTC");

    let fare = h.engine.charge_fare(&cid("c1"), &transit("TTC")).unwrap();

    let customer = h.engine.get_customer(&cid("c1")).unwrap();
    assert_eq!(customer.last_txn_id, Some(fare.id.clone()));
    assert_eq!(h.engine.get_customer_last_fare(&fare.id).unwrap(), fare);
}

#[test]
fn re_entry_inside_window_is_free() {
    let h = harness();
    enroll(&h, "c1", "TTC");

    let first = h.engine.charge_fare(&cid("c1"), &transit("TTC")).unwrap();
    h.clock.advance(TimeDelta::minutes(119));
    let second = h.engine.charge_fare(&cid("c1"), &transit("TTC")).unwrap();

    assert_eq!(second.amount, Decimal::ZERO);
    assert_eq!(second.timestamp, first.timestamp);
    assert_ne!(second.id, first.id);
}

#[test]
fn transfer_inside_window_pays_transfer_fare_and_keeps_timestamp() {
    let h = harness();
    enroll(&h, "c1", "TTC");

    let first = h.engine.charge_fare(&cid("c1"), &transit("TTC")).unwrap();
    h.clock.advance(TimeDelta::minutes(45));
    let second = h.engine.charge_fare(&cid("c1"), &transit("MI")).unwrap();

    assert_eq!(second.amount, dec!(1.25));
    assert_eq!(second.timestamp, first.timestamp);
}

#[test]
fn chained_transfers_do_not_extend_window() {
    let h = harness();
    enroll(&h, "c1", "TTC");

    let first = h.engine.charge_fare(&cid("c1"), &transit("TTC")).unwrap();
    h.clock.advance(TimeDelta::minutes(100));
    let second = h.engine.charge_fare(&cid("c1"), &transit("MI")).unwrap();
    assert_eq!(second.timestamp, first.timestamp);

    // 130 minutes after the first charge, 30 after the transfer.
    h.clock.advance(TimeDelta::minutes(30));
    let third = h.engine.charge_fare(&cid("c1"), &transit("YRT")).unwrap();

    assert_eq!(third.amount, dec!(4.25));
    assert_eq!(third.timestamp.to_string(), "2024-03-01T10:10:00");
}

#[test]
fn window_is_exclusive_at_120_minutes() {
    let h = harness();
    enroll(&h, "c1", "TTC");

    h.engine.charge_fare(&cid("c1"), &transit("TTC")).unwrap();
    h.clock.advance(TimeDelta::minutes(120));
    let second = h.engine.charge_fare(&cid("c1"), &transit("TTC")).unwrap();

    assert_eq!(second.amount, dec!(3.25));
    assert_eq!(second.timestamp.to_string(), "2024-03-01T10:00:00");
}

#[test]
fn expired_window_pays_full_fare_on_other_system() {
    let h = harness();
    enroll(&h, "c1", "TTC");

    h.engine.charge_fare(&cid("c1"), &transit("TTC")).unwrap();
    h.clock.advance(TimeDelta::hours(3));
    let second = h.engine.charge_fare(&cid("c1"), &transit("BT")).unwrap();

    assert_eq!(second.amount, dec!(3.25));
    assert_eq!(second.timestamp.to_string(), "2024-03-01T11:00:00");
}

#[test]
fn ann_lee_scenario() {
    let h = harness();
    h.engine
        .enroll_customer(&cid("c1"), "Ann", "Lee", &transit("TTC"))
        .unwrap();

    let first = h.engine.charge_fare(&cid("c1"), &transit("TTC")).unwrap();
    assert_eq!(first.amount, dec!(3.25));

    let second = h.engine.charge_fare(&cid("c1"), &transit("MI")).unwrap();
    assert_eq!(second.amount, dec!(1.25));
    assert_eq!(second.timestamp, first.timestamp);

    assert_eq!(
        h.engine.charge_fare(&cid("c1"), &transit("Me")),
        Err(FareError::InvalidTransit(transit("Me")))
    );
}

#[test]
fn mi_then_yrt_transfer() {
    let h = harness();
    enroll(&h, "customer1", "TTC");

    let first = h.engine.charge_fare(&cid("customer1"), &transit("MI")).unwrap();
    assert_eq!(first.amount.to_string(), "3.50");

    let second = h.engine.charge_fare(&cid("customer1"), &transit("YRT")).unwrap();
    assert_eq!(second.amount.to_string(), "1.25");
}

#[test]
fn invalid_transit_is_checked_before_customer() {
    let h = harness();
    assert_eq!(
        h.engine.charge_fare(&cid("nobody"), &transit("Me")),
        Err(FareError::InvalidTransit(transit("Me")))
    );
    assert!(h.state.is_empty());
}

#[test]
fn charge_for_unknown_customer() {
    let h = harness();
    assert_eq!(
        h.engine.charge_fare(&cid("nobody"), &transit("TTC")),
        Err(FareError::CustomerNotFound(cid("nobody")))
    );
    assert!(h.state.is_empty());
}

#[test]
fn dangling_last_txn_id_fails_charge() {
    let h = harness();
    enroll(&h, "c1", "TTC");
    let fare = h.engine.charge_fare(&cid("c1"), &transit("TTC")).unwrap();
    h.state.delete_state(&fare.id.0).unwrap();

    assert_eq!(
        h.engine.charge_fare(&cid("c1"), &transit("TTC")),
        Err(FareError::FareNotFound(fare.id.clone()))
    );
    // Nothing new was written.
    assert_eq!(h.state.len(), 1);
    assert_eq!(
        h.engine.get_customer(&cid("c1")).unwrap().last_txn_id,
        Some(fare.id)
    );
}

#[test]
fn charge_does_not_change_home_transit() {
    let h = harness();
    enroll(&h, "c1", "TTC");
    h.engine.charge_fare(&cid("c1"), &transit("MI")).unwrap();
    assert_eq!(
        h.engine.get_customer(&cid("c1")).unwrap().transit_id,
        transit("TTC")
    );
}

#[test]
fn each_charge_appends_a_fare() {
    let h = harness();
    enroll(&h, "c1", "TTC");
    for _ in 0..3 {
        h.engine.charge_fare(&cid("c1"), &transit("TTC")).unwrap();
    }
    // One customer plus three fares.
    assert_eq!(h.state.len(), 4);
    for n in 1..=3 {
        let id = FareId(format!("fare-{n}"));
        assert!(h.engine.get_customer_last_fare(&id).is_ok());
    }
}

#[test]
fn seeded_customer_transfers_from_fare1() {
    let h = harness();
    h.engine.init_ledger().unwrap();

    let fare1 = h
        .engine
        .get_customer_last_fare(&FareId::from(SEED_FARE_ID))
        .unwrap();
    assert_eq!(fare1.amount, dec!(3.25));
    assert_eq!(fare1.timestamp.to_string(), START);

    h.clock.advance(TimeDelta::minutes(10));
    let fare = h.engine.charge_fare(&cid("customer1"), &transit("BT")).unwrap();
    assert_eq!(fare.amount, dec!(1.25));
    assert_eq!(fare.timestamp, fare1.timestamp);
}

#[test]
fn seeded_customer_record_matches_fixture() {
    let h = harness();
    h.engine.init_ledger().unwrap();

    let raw = h.state.get_state("customer1").unwrap().unwrap();
    assert_eq!(
        std::str::from_utf8(&raw).unwrap(),
        r#"{"FirstName":"Brad","ID":"customer1","LastName":"Pitt","LastTxnId":"fare1","TransitId":"TTC","docType":"customer"}"#
    );
    assert_eq!(h.state.len(), 7);
}

#[test]
fn replicas_converge_to_identical_state() {
    let a = harness();
    let b = harness();

    for h in [&a, &b] {
        h.engine.init_ledger().unwrap();
        enroll(h, "c7", "MI");
        h.engine.charge_fare(&cid("c7"), &transit("MI")).unwrap();
        h.clock.advance(TimeDelta::minutes(30));
        h.engine.charge_fare(&cid("c7"), &transit("TTC")).unwrap();
        h.engine.charge_fare(&cid("customer1"), &transit("TTC")).unwrap();
        h.engine
            .update_primary_transit(&cid("customer2"), &transit("YRT"))
            .unwrap();
        h.engine.delete_customer(&cid("customer6")).unwrap();
    }

    assert_eq!(
        state_digest(a.state.as_ref()).unwrap(),
        state_digest(b.state.as_ref()).unwrap()
    );
    assert_eq!(
        a.state.get_state_by_range("", "").unwrap(),
        b.state.get_state_by_range("", "").unwrap()
    );
}

/// World state that refuses writes to keys with a given prefix.
struct FailingWrites {
    inner: MemoryWorldState,
    prefix: Mutex<Option<String>>,
}

impl FailingWrites {
    fn new() -> Self {
        Self {
            inner: MemoryWorldState::new(),
            prefix: Mutex::new(None),
        }
    }

    fn fail_puts_to(&self, prefix: &str) {
        *self.prefix.lock() = Some(prefix.to_string());
    }
}

impl WorldState for FailingWrites {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get_state(key)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if let Some(prefix) = self.prefix.lock().as_deref() {
            if key.starts_with(prefix) {
                return Err(StoreError(format!("failed inserting key {key}")));
            }
        }
        self.inner.put_state(key, value)
    }

    fn delete_state(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete_state(key)
    }

    fn get_state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        self.inner.get_state_by_range(start, end)
    }
}

fn failing_engine() -> (Engine, Arc<FailingWrites>) {
    let state = Arc::new(FailingWrites::new());
    let engine = Engine::with_sources(
        state.clone(),
        FareSchedule::builtin(),
        Arc::new(ManualClock::new(FareTimestamp::parse(START).unwrap())),
        Arc::new(SequentialFareIds::new("fare-")),
    );
    (engine, state)
}

#[test]
fn store_failure_on_enroll_is_surfaced() {
    let (engine, state) = failing_engine();
    state.fail_puts_to("");

    assert_eq!(
        engine.enroll_customer(&cid("c1"), "Ann", "Lee", &transit("TTC")),
        Err(FareError::Store(StoreError(
            "failed inserting key c1".to_string()
        )))
    );
    assert!(!engine.customer_exists(&cid("c1")).unwrap());
}

#[test]
fn store_failure_on_init_ledger_is_surfaced() {
    let (engine, state) = failing_engine();
    state.fail_puts_to("customer");
    assert!(matches!(engine.init_ledger(), Err(FareError::Store(_))));
}

#[test]
fn failed_customer_write_leaves_orphan_fare() {
    let (engine, state) = failing_engine();
    engine
        .enroll_customer(&cid("c1"), "Ann", "Lee", &transit("TTC"))
        .unwrap();
    state.fail_puts_to("c1");

    let result = engine.charge_fare(&cid("c1"), &transit("TTC"));
    assert!(matches!(result, Err(FareError::Store(_))));

    // The fare landed, intact, but nothing references it.
    let orphan = engine
        .get_customer_last_fare(&FareId::from("fare-1"))
        .unwrap();
    assert_eq!(orphan.amount, dec!(3.25));
    assert_eq!(engine.get_customer(&cid("c1")).unwrap().last_txn_id, None);
}
