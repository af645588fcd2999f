//! Property tests for broken-promise detection (invariant 8): whether the
//! directory seals a *different* value than it promised, or never seals the
//! leaf at all, the consistency checker must reject the following proof as
//! `broken_promise`, for any username/value pair.

use coniks_core::crypto::{Ed25519SigningKey, VrfSigningKey};
use coniks_core::errors::{ClientError, ServerErrorCode};
use coniks_core::tree::{Apt, AuthenticationPath, Policies, SignedTreeRoot, TemporaryBinding};
use coniks_core::wire::{DirectoryProof, Response};
use coniks_core::{Auditor, ConsistencyChecker, RequestKind};
use proptest::prelude::*;

fn arb_username() -> impl Strategy<Value = String> {
    "[a-z]{3,12}"
}

fn arb_value() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 1..16)
}

fn arb_distinct_values() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    (arb_value(), arb_value()).prop_filter("values must differ", |(a, b)| a != b)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_broken_promise_always_detected(
        username in arb_username(),
        (promised, real) in arb_distinct_values(),
    ) {
        let signing_key = Ed25519SigningKey::from_bytes([13u8; 32]);
        let vrf_key = VrfSigningKey::generate().unwrap();
        let policies = Policies::new(vrf_key.public_key().unwrap());
        let (index, vrf_proof) = vrf_key.prove(&username).unwrap();

        let mut apt = Apt::new([1u8; 32]);
        let str0 = SignedTreeRoot::initial(apt.root_hash(), policies, &signing_key);
        let auditor = Auditor::new(signing_key.verifying_key(), str0.clone());
        let mut checker = ConsistencyChecker::new(auditor);

        let absence_path = apt.lookup(&index);
        let promise_tb = TemporaryBinding::issue(&str0, index, promised.clone(), &signing_key);
        let register_resp = Response::proof(
            ServerErrorCode::Success,
            DirectoryProof {
                aps: vec![AuthenticationPath {
                    tree_nonce: apt.tree_nonce(),
                    lookup_index: index,
                    vrf_proof: vrf_proof.clone(),
                    pruned_siblings: absence_path.pruned_siblings,
                    leaf: absence_path.leaf,
                }],
                strs: vec![str0.clone()],
                tb: Some(promise_tb),
            },
        );
        checker
            .handle_response(RequestKind::Register, &register_resp, &username, None)
            .unwrap();
        prop_assert!(checker.outstanding_tb(&username).is_some());

        apt.set(index, &username, real).unwrap();
        let str1 = SignedTreeRoot::next(&str0, apt.root_hash(), policies, &signing_key);
        let inclusion_path = apt.lookup(&index);
        let lookup_resp = Response::proof(
            ServerErrorCode::Success,
            DirectoryProof {
                aps: vec![AuthenticationPath {
                    tree_nonce: apt.tree_nonce(),
                    lookup_index: index,
                    vrf_proof,
                    pruned_siblings: inclusion_path.pruned_siblings,
                    leaf: inclusion_path.leaf,
                }],
                strs: vec![str1],
                tb: None,
            },
        );

        let err = checker
            .handle_response(RequestKind::KeyLookup, &lookup_resp, &username, None)
            .unwrap_err();
        prop_assert!(matches!(err, ClientError::BrokenPromise { .. }), "expected broken_promise, got {:?}", err);
    }

    /// The directory never seals the leaf at all: the following epoch's
    /// lookup is still a bare absence proof carrying no TB. This is the
    /// literal dropped-promise scenario, distinct from the mismatched-value
    /// case above.
    #[test]
    fn prop_broken_promise_detected_on_silent_absence(
        username in arb_username(),
        promised in arb_value(),
    ) {
        let signing_key = Ed25519SigningKey::from_bytes([13u8; 32]);
        let vrf_key = VrfSigningKey::generate().unwrap();
        let policies = Policies::new(vrf_key.public_key().unwrap());
        let (index, vrf_proof) = vrf_key.prove(&username).unwrap();

        let apt = Apt::new([1u8; 32]);
        let str0 = SignedTreeRoot::initial(apt.root_hash(), policies, &signing_key);
        let auditor = Auditor::new(signing_key.verifying_key(), str0.clone());
        let mut checker = ConsistencyChecker::new(auditor);

        let absence_path = apt.lookup(&index);
        let promise_tb = TemporaryBinding::issue(&str0, index, promised, &signing_key);
        let register_resp = Response::proof(
            ServerErrorCode::Success,
            DirectoryProof {
                aps: vec![AuthenticationPath {
                    tree_nonce: apt.tree_nonce(),
                    lookup_index: index,
                    vrf_proof: vrf_proof.clone(),
                    pruned_siblings: absence_path.pruned_siblings.clone(),
                    leaf: absence_path.leaf.clone(),
                }],
                strs: vec![str0.clone()],
                tb: Some(promise_tb),
            },
        );
        checker
            .handle_response(RequestKind::Register, &register_resp, &username, None)
            .unwrap();
        prop_assert!(checker.outstanding_tb(&username).is_some());

        let str1 = SignedTreeRoot::next(&str0, apt.root_hash(), policies, &signing_key);
        let lookup_resp = Response::proof(
            ServerErrorCode::NameNotFound,
            DirectoryProof {
                aps: vec![AuthenticationPath {
                    tree_nonce: apt.tree_nonce(),
                    lookup_index: index,
                    vrf_proof,
                    pruned_siblings: absence_path.pruned_siblings,
                    leaf: absence_path.leaf,
                }],
                strs: vec![str1],
                tb: None,
            },
        );

        let err = checker
            .handle_response(RequestKind::KeyLookup, &lookup_resp, &username, None)
            .unwrap_err();
        prop_assert!(matches!(err, ClientError::BrokenPromise { .. }), "expected broken_promise, got {:?}", err);
    }
}
