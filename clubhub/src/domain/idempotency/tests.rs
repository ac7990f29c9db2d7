//! Tests for idempotency primitives.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case("", IdempotencyKeyError::Blank)]
#[case("   ", IdempotencyKeyError::Blank)]
#[case("not-a-uuid", IdempotencyKeyError::Malformed("not-a-uuid".to_owned()))]
#[case(
    " 550e8400-e29b-41d4-a716-446655440000",
    IdempotencyKeyError::Malformed(" 550e8400-e29b-41d4-a716-446655440000".to_owned())
)]
fn invalid_keys_are_rejected(#[case] raw: &str, #[case] expected: IdempotencyKeyError) {
    assert_eq!(raw.parse::<IdempotencyKey>(), Err(expected));
}

#[rstest]
fn keys_survive_a_trip_through_a_journal_record() {
    let key = IdempotencyKey::random();
    let stored = serde_json::to_value(&key).expect("encodes");

    assert_eq!(stored, json!(key.to_string()));
    assert_eq!(
        serde_json::from_value::<IdempotencyKey>(stored).expect("decodes"),
        key
    );
}

#[rstest]
fn random_keys_differ() {
    assert_ne!(IdempotencyKey::random(), IdempotencyKey::random());
}

#[rstest]
fn fingerprints_ignore_key_order_but_not_values() {
    let a = fingerprint_json(&json!({"user": "ada@example.com", "club": "c1"}))
        .expect("fingerprint");
    let b = fingerprint_json(&json!({"club": "c1", "user": "ada@example.com"}))
        .expect("fingerprint");
    let c = fingerprint_json(&json!({"club": "c2", "user": "ada@example.com"}))
        .expect("fingerprint");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.as_str().len(), 64);
}

#[rstest]
fn stored_fingerprints_are_validated() {
    let err = PurchaseFingerprint::try_from("xyz".to_owned()).expect_err("malformed");
    assert_eq!(err, PurchaseFingerprintError::Malformed);
}
