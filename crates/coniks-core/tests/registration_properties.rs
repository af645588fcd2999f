//! Property tests for registration, lookup, and the client consistency
//! checker's binding/TOFU behavior.
//!
//! ## Properties verified
//!
//! 1. Round-trip registration: after `register`, both the same-epoch
//!    response (absence + TB) and the next-epoch response (inclusion) pass
//!    the checker.
//! 2. Idempotent registration: registering the same `(username, key)` twice
//!    in the same epoch yields a bit-identical temporary binding.
//! 5. VRF determinism: the same username always derives the same index.
//! 7. No silent key change: re-registering a username under a different key
//!    is rejected by the server and flagged as `bindings_differ` by the
//!    checker.

use coniks_core::crypto::{Ed25519SigningKey, VrfSigningKey};
use coniks_core::errors::ClientError;
use coniks_core::tree::Policies;
use coniks_core::wire::DirectoryResponseBody;
use coniks_core::{Auditor, ConiksDirectory, ConsistencyChecker, RequestKind};
use proptest::prelude::*;

fn arb_username() -> impl Strategy<Value = String> {
    "[a-z]{3,12}"
}

fn arb_key() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 1..24)
}

fn fresh_directory() -> ConiksDirectory {
    let signing_key = Ed25519SigningKey::from_bytes([5u8; 32]);
    let vrf_key = VrfSigningKey::generate().unwrap();
    let policies = Policies::new(vrf_key.public_key().unwrap());
    ConiksDirectory::new(signing_key, vrf_key, policies, 32).unwrap()
}

fn fresh_checker(directory: &ConiksDirectory) -> ConsistencyChecker {
    let initial = directory.get_str_history(0, 0);
    let range = match initial.directory_response.unwrap() {
        DirectoryResponseBody::StrHistoryRange(range) => range,
        _ => panic!("expected STR history range"),
    };
    let signing_pub_key = Ed25519SigningKey::from_bytes([5u8; 32]).verifying_key();
    let auditor = Auditor::new(signing_pub_key, range.strs[0].clone());
    ConsistencyChecker::new(auditor)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: round-trip registration (invariant 1).
    #[test]
    fn prop_round_trip_registration(username in arb_username(), key in arb_key()) {
        let directory = fresh_directory();
        let mut checker = fresh_checker(&directory);

        let register_response = directory.register(&username, &key);
        prop_assert!(checker
            .handle_response(RequestKind::Register, &register_response, &username, Some(&key))
            .is_ok());
        prop_assert_eq!(checker.binding(&username), Some(key.as_slice()));
        prop_assert!(checker.outstanding_tb(&username).is_some());

        directory.update();

        let lookup_response = directory.key_lookup(&username);
        prop_assert!(checker
            .handle_response(RequestKind::KeyLookup, &lookup_response, &username, Some(&key))
            .is_ok());
        prop_assert_eq!(checker.binding(&username), Some(key.as_slice()));
        prop_assert!(
            checker.outstanding_tb(&username).is_none(),
            "an honoured promise must clear the outstanding TB"
        );
    }

    /// Property: idempotent registration (invariant 2).
    #[test]
    fn prop_idempotent_registration(username in arb_username(), key in arb_key()) {
        let directory = fresh_directory();

        let first = directory.register(&username, &key);
        let second = directory.register(&username, &key);

        let tb_of = |resp: &coniks_core::wire::Response| match resp.directory_response.as_ref().unwrap() {
            DirectoryResponseBody::DirectoryProof(proof) => proof.tb.clone().expect("pending TB"),
            _ => panic!("expected directory proof"),
        };
        let (first_tb, second_tb) = (tb_of(&first), tb_of(&second));

        prop_assert_eq!(first_tb.index, second_tb.index);
        prop_assert_eq!(first_tb.value, second_tb.value);
        prop_assert_eq!(first_tb.signature, second_tb.signature);
        prop_assert_eq!(second.error, coniks_core::errors::ServerErrorCode::NameExisted);
    }

    /// Property: VRF determinism (invariant 5), observed through the
    /// directory's lookup index rather than the raw VRF API.
    #[test]
    fn prop_vrf_determinism(username in arb_username(), key in arb_key()) {
        let directory = fresh_directory();
        directory.register(&username, &key);
        directory.update();

        let first = directory.key_lookup(&username);
        let second = directory.key_lookup(&username);

        let index_of = |resp: &coniks_core::wire::Response| match resp.directory_response.as_ref().unwrap() {
            DirectoryResponseBody::DirectoryProof(proof) => proof.aps[0].lookup_index,
            _ => panic!("expected directory proof"),
        };
        prop_assert_eq!(index_of(&first), index_of(&second));
    }

    /// Property: no silent key change (invariant 7).
    #[test]
    fn prop_no_silent_key_change(username in arb_username(), key_a in arb_key(), key_b in arb_key()) {
        prop_assume!(key_a != key_b);

        let directory = fresh_directory();
        let mut checker = fresh_checker(&directory);

        let first = directory.register(&username, &key_a);
        checker
            .handle_response(RequestKind::Register, &first, &username, Some(&key_a))
            .unwrap();

        let second = directory.register(&username, &key_b);
        prop_assert_eq!(second.error, coniks_core::errors::ServerErrorCode::NameExisted);

        let err = checker
            .handle_response(RequestKind::Register, &second, &username, Some(&key_b))
            .unwrap_err();
        prop_assert!(matches!(err, ClientError::BindingsDiffer { .. }), "expected bindings_differ, got {:?}", err);
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn fresh_checker_starts_with_no_bindings() {
        let directory = fresh_directory();
        let checker = fresh_checker(&directory);
        assert!(checker.binding("alice").is_none());
        assert!(checker.outstanding_tb("alice").is_none());
    }
}
