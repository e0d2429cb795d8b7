// SPDX-License-Identifier: Apache-2.0

mod common;

use std::sync::Arc;

use common::{services, RecordingConnection};
use gate_core::{ClientContext, EventCode};
use proptest::prelude::*;
use querygate_lib::{Gateway, GatewayError, MemoryLedgerStore, ReputationLedger};

const CATALOG_CODES: &[&str] = &[
    "SQL_INJECTION_ATTEMPT",
    "UNAUTHORIZED_ACCESS",
    "MISSING_PARAMETER",
    "INVALID_PARAMETER_FORMAT",
    "INVALID_PARAMETER_VALUE",
    "MULTIPLE_LOGIN_ATTEMPTS",
    "DATABASE_MANIPULATION_ATTEMPT",
    "INVALID_SQL_SYNTAX",
    "EXCESSIVE_QUERY_EXECUTION",
    "IP_BLACKLISTED",
    "CROSS_SITE_SCRIPTING_ATTEMPT",
    "TAMPERING_WITH_SESSION",
    "MALICIOUS_PARAMETER_LENGTH",
    "ACCESS_FROM_UNKNOWN_IP",
    "INVALID_FILE_ACCESS",
    "DEBUG_MODE_ENABLED_UNAUTHORIZED",
    "error",
    "NOT_A_CATALOG_CODE",
];

#[test]
fn ip_is_blocked_once_score_reaches_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let (services, _) = services(dir.path(), 1000);
    let ip = "10.0.0.5";

    for _ in 0..9 {
        services
            .ledger
            .record(EventCode::DatabaseManipulationAttempt, "unknown", ip, ip, "port scan")
            .unwrap();
    }
    assert_eq!(services.ledger.score(ip).unwrap(), 900);

    let (conn, _) = RecordingConnection::new();
    assert!(Gateway::from_connection(Box::new(conn), services.clone(), ClientContext::new(ip)).is_ok());

    services
        .ledger
        .record(EventCode::DatabaseManipulationAttempt, "unknown", ip, ip, "port scan")
        .unwrap();

    let (conn, calls) = RecordingConnection::new();
    let err = Gateway::from_connection(Box::new(conn), services.clone(), ClientContext::new(ip))
        .unwrap_err();
    assert!(matches!(&err, GatewayError::AccessDenied { ip: denied } if denied == ip));
    assert_eq!(
        err.to_string(),
        "Access denied. Your IP has been blocked due to multiple security violations."
    );
    assert!(calls.lock().prepared.is_empty());

    let (conn, _) = RecordingConnection::new();
    assert!(
        Gateway::from_connection(Box::new(conn), services, ClientContext::new("10.0.0.6")).is_ok()
    );
}

#[test]
fn repeated_validation_failures_eventually_block() {
    let dir = tempfile::tempdir().unwrap();
    let (services, _) = services(dir.path(), 100);
    let ip = "198.51.100.4";

    let (conn, _) = RecordingConnection::new();
    let mut gateway =
        Gateway::from_connection(Box::new(conn), services.clone(), ClientContext::new(ip)).unwrap();
    gateway.set_query("SELECT * FROM t WHERE id = :id");
    for _ in 0..4 {
        assert!(gateway.add_param("id", "x", Some(r"^\d+$")).is_err());
    }
    assert_eq!(services.ledger.score(ip).unwrap(), 100);

    let (conn, _) = RecordingConnection::new();
    let err = Gateway::from_connection(Box::new(conn), services, ClientContext::new(ip))
        .unwrap_err();
    assert!(matches!(err, GatewayError::AccessDenied { .. }));
}

proptest! {
    #[test]
    fn blocked_exactly_when_sum_reaches_threshold(
        threshold in 1i64..2000,
        picks in proptest::collection::vec(0usize..CATALOG_CODES.len(), 0..40),
    ) {
        let ledger = ReputationLedger::new(Arc::new(MemoryLedgerStore::new()), threshold);
        let mut expected = 0i64;
        for pick in picks {
            let event = ledger
                .record(EventCode::parse(CATALOG_CODES[pick]), "unknown", "10.1.1.1", "h", "m")
                .unwrap();
            expected += event.points;
        }

        prop_assert_eq!(ledger.score("10.1.1.1").unwrap(), expected);
        prop_assert_eq!(ledger.is_blocked("10.1.1.1").unwrap(), expected >= threshold);
    }

    #[test]
    fn score_never_decreases(
        picks in proptest::collection::vec(0usize..CATALOG_CODES.len(), 1..40),
    ) {
        let ledger = ReputationLedger::in_memory();
        let mut previous = ledger.score("10.2.2.2").unwrap();
        for pick in picks {
            ledger
                .record(EventCode::parse(CATALOG_CODES[pick]), "unknown", "10.2.2.2", "h", "m")
                .unwrap();
            let current = ledger.score("10.2.2.2").unwrap();
            prop_assert!(current >= previous);
            previous = current;
        }
        prop_assert_eq!(ledger.score("10.3.3.3").unwrap(), 0);
    }
}
