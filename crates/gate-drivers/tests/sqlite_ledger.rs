// SPDX-License-Identifier: Apache-2.0

use gate_core::{EventCode, LedgerStore, SecurityEvent};
use gate_drivers::SqliteLedgerStore;

#[test]
fn events_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    {
        let store = SqliteLedgerStore::open(&path).unwrap();
        let event = SecurityEvent::new(
            EventCode::UnauthorizedAccess,
            "u-9",
            "172.16.0.4",
            "gw.example",
            "Event: UNAUTHORIZED_ACCESS; Param: ; Value: ",
        );
        store.append(&event).unwrap();
    }

    let store = SqliteLedgerStore::open(&path).unwrap();
    assert_eq!(store.total_points("172.16.0.4").unwrap(), 80);

    let events = store.events_for("172.16.0.4").unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user_id, "u-9");
    assert_eq!(events[0].host_name, "gw.example");
    assert_eq!(events[0].event_code, EventCode::UnauthorizedAccess);
}

#[test]
fn two_handles_share_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let writer = SqliteLedgerStore::open(&path).unwrap();
    let reader = SqliteLedgerStore::open(&path).unwrap();

    for _ in 0..3 {
        writer
            .append(&SecurityEvent::new(
                EventCode::MissingParameter,
                "unknown",
                "172.16.0.5",
                "172.16.0.5",
                "m",
            ))
            .unwrap();
    }

    assert_eq!(reader.total_points("172.16.0.5").unwrap(), 60);
}
