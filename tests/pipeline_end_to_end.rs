//! End-to-end tests of the prehash driver and its phase contracts.

use curve25519_dalek::scalar::Scalar;
use prehash::{
    pack_input, BufferLayout, Digest256, FinalVariant, GroupOrder, HashEngine, PackedInput,
    PrehashArray, PrehashConfig, PrehashError, PrehashParams, Prehasher, ThresholdPolicy, U256,
};

/// Test double whose every digest is `2^256 - 1`, above any threshold.
#[derive(Debug, Clone, Copy)]
struct SaturatingEngine;

impl HashEngine for SaturatingEngine {
    type Context = ();

    fn begin(&self, _prefix: &[&[u8]]) -> Self::Context {}

    fn finish(&self, _ctx: &Self::Context, _suffix: &[&[u8]]) -> Digest256 {
        [0xff; 32]
    }
}

fn fixed_buffer(layout: &BufferLayout, w: u8) -> Vec<u8> {
    let pk: Vec<u8> = (0..layout.pk as u8).collect();
    let mes: Vec<u8> = (0..layout.mes as u8).map(|b| b.wrapping_mul(3)).collect();
    let w = vec![w; layout.w];
    let x: Vec<u8> = (0..layout.x as u8).map(|b| b ^ 0x5a).collect();
    let sk = vec![0x11; layout.sk];
    pack_input(layout, &pk, &mes, &w, &x, &sk).unwrap()
}

fn params(n: usize, order: GroupOrder, max_rounds: u32) -> PrehashParams {
    PrehashParams::new(
        n,
        order,
        max_rounds,
        prehash::counter_message(1024),
        BufferLayout::default(),
    )
    .unwrap()
}

#[test]
fn toy_modulus_end_to_end_is_deterministic() {
    let order = GroupOrder::new(U256::from(101u64), ThresholdPolicy::Widest).unwrap();
    let prehasher = Prehasher::new(params(4, order, 64));
    let layout = BufferLayout::default();
    let buffer = fixed_buffer(&layout, 1);
    let input = PackedInput::new(&buffer, layout).unwrap();

    let first = prehasher.prehash(&input, FinalVariant::Reduce).unwrap();
    assert_eq!(first.array.invalid(), &[0, 0, 0, 0]);
    assert_eq!(first.array.hashes().len(), 4);
    assert!(first
        .array
        .hashes()
        .iter()
        .all(|h| *h < U256::from(101u64)));

    let second = prehasher.prehash(&input, FinalVariant::Reduce).unwrap();
    assert_eq!(first.array, second.array);
    assert_eq!(first.array.digest(), second.array.digest());
}

#[test]
fn saturating_engine_hits_round_bound() {
    let prehasher =
        Prehasher::with_engine(params(8, GroupOrder::curve25519(), 5), SaturatingEngine);
    let layout = BufferLayout::default();
    let buffer = fixed_buffer(&layout, 1);
    let input = PackedInput::new(&buffer, layout).unwrap();
    match prehasher.prehash(&input, FinalVariant::Reduce) {
        Err(PrehashError::ConvergenceExceeded {
            rounds,
            remaining,
            partial,
        }) => {
            assert_eq!(rounds, 5);
            assert_eq!(remaining, 8);
            let run = partial.expect("driver returns the unfinalised array");
            assert_eq!(run.array.pending(), &[1, 2, 3, 4, 5, 6, 7, 8]);
            assert_eq!(run.array.unresolved(), 8);
            assert!(run.array.hashes().iter().all(|h| *h == U256::MAX));
            assert_eq!(run.stats.rounds, 5);
            assert_eq!(run.stats.round_sizes, vec![8; 5]);
        }
        other => panic!("expected ConvergenceExceeded, got {other:?}"),
    }
}

#[test]
fn init_validity_predicate_is_consistent() {
    let prehasher = Prehasher::new(params(4096, GroupOrder::curve25519(), 64));
    let layout = BufferLayout::default();
    let buffer = fixed_buffer(&layout, 2);
    let input = PackedInput::new(&buffer, layout).unwrap();
    let array = prehasher.init(&input).unwrap();
    let threshold = *GroupOrder::curve25519().threshold();
    for (j, (h, &invalid)) in array.hashes().iter().zip(array.invalid()).enumerate() {
        assert_eq!(invalid == 0, *h < threshold, "slot {j}");
        if invalid != 0 {
            assert_eq!(invalid as usize, j + 1);
        }
    }
}

#[test]
fn update_leaves_valid_entries_untouched() {
    let prehasher = Prehasher::new(params(4096, GroupOrder::curve25519(), 64));
    let layout = BufferLayout::default();
    let buffer = fixed_buffer(&layout, 3);
    let input = PackedInput::new(&buffer, layout).unwrap();
    let mut array = prehasher.init(&input).unwrap();
    array.compact();
    let listed: Vec<usize> = array.pending().iter().map(|&i| i as usize - 1).collect();
    assert!(!listed.is_empty());
    let snapshot = array.hashes().to_vec();

    prehasher.update(&mut array);

    for (j, (before, after)) in snapshot.iter().zip(array.hashes()).enumerate() {
        if listed.contains(&j) {
            assert_ne!(before, after, "listed slot {j} was not resampled");
        } else {
            assert_eq!(before, after, "unlisted slot {j} changed");
        }
    }
    for (&entry, &slot) in array.pending().iter().zip(&listed) {
        let accepted = GroupOrder::curve25519().is_accepted(&array.hashes()[slot]);
        assert_eq!(entry == 0, accepted);
        if entry != 0 {
            assert_eq!(entry as usize, slot + 1);
        }
    }
}

#[test]
fn repeated_update_converges() {
    let prehasher = Prehasher::new(params(8192, GroupOrder::curve25519(), 64));
    let layout = BufferLayout::default();
    let buffer = fixed_buffer(&layout, 4);
    let input = PackedInput::new(&buffer, layout).unwrap();
    let mut array = prehasher.init(&input).unwrap();
    let mut len = array.compact();
    let mut rounds = 0;
    while len > 0 {
        let still_invalid = prehasher.update(&mut array);
        let next = array.compact();
        assert_eq!(still_invalid, next);
        assert!(next <= len);
        len = next;
        rounds += 1;
        assert!(rounds <= 64);
    }
    assert!(array.is_converged());
    prehasher.final_prehash(&mut array).unwrap();
    let q = *GroupOrder::curve25519().modulus();
    assert!(array.hashes().iter().all(|h| *h < q));
}

#[test]
fn mult_sec_key_matches_scalar_reference() {
    let prehasher = Prehasher::new(params(256, GroupOrder::curve25519(), 64));
    let layout = BufferLayout::default();
    let buffer = fixed_buffer(&layout, 5);
    let input = PackedInput::new(&buffer, layout).unwrap();

    let mut array = prehasher.init(&input).unwrap();
    prehasher.converge(&mut array, &mut Default::default()).unwrap();
    let accepted = array.hashes().to_vec();
    prehasher
        .final_prehash_mult_sec_key(&input, &mut array)
        .unwrap();

    let mut x_le = input.x().to_be_bytes::<32>();
    x_le.reverse();
    let x = Scalar::from_bytes_mod_order(x_le);
    for (before, after) in accepted.iter().zip(array.hashes()) {
        let mut le = before.to_be_bytes::<32>();
        le.reverse();
        let mut expected = (Scalar::from_bytes_mod_order(le) * x).to_bytes();
        expected.reverse();
        assert_eq!(*after, U256::from_be_bytes(expected));
    }
}

#[test]
fn final_before_convergence_is_rejected() {
    let prehasher = Prehasher::new(params(4096, GroupOrder::curve25519(), 64));
    let layout = BufferLayout::default();
    let buffer = fixed_buffer(&layout, 6);
    let input = PackedInput::new(&buffer, layout).unwrap();
    let mut array = prehasher.init(&input).unwrap();
    let pending = array.unresolved();
    assert!(pending > 0);
    let snapshot = array.clone();
    match prehasher.final_prehash_mult_sec_key(&input, &mut array) {
        Err(PrehashError::PreconditionViolation { pending: reported }) => {
            assert_eq!(reported, pending)
        }
        other => panic!("expected PreconditionViolation, got {other:?}"),
    }
    assert_eq!(array, snapshot);
}

#[test]
fn saved_contexts_serve_many_attempts() {
    let prehasher = Prehasher::new(params(512, GroupOrder::curve25519(), 64));
    let layout = BufferLayout::default();
    let first = fixed_buffer(&layout, 0);
    let uctx = prehasher
        .unfinal_init(&PackedInput::new(&first, layout).unwrap())
        .unwrap();
    for w in 0..4u8 {
        let buffer = fixed_buffer(&layout, w);
        let input = PackedInput::new(&buffer, layout).unwrap();
        let direct = prehasher.prehash(&input, FinalVariant::MultSecKey).unwrap();
        let resumed = prehasher
            .prehash_from_contexts(&uctx, &input, FinalVariant::MultSecKey)
            .unwrap();
        assert_eq!(direct.array.hashes(), resumed.array.hashes());
    }
}

#[test]
fn saved_contexts_reject_other_public_key() {
    let prehasher = Prehasher::new(params(16, GroupOrder::curve25519(), 64));
    let layout = BufferLayout::default();
    let buffer = fixed_buffer(&layout, 0);
    let uctx = prehasher
        .unfinal_init(&PackedInput::new(&buffer, layout).unwrap())
        .unwrap();
    let mut other = buffer.clone();
    other[0] ^= 1;
    let input = PackedInput::new(&other, layout).unwrap();
    assert!(matches!(
        prehasher.init_from_contexts(&uctx, &input),
        Err(PrehashError::Configuration(_))
    ));
}

#[test]
fn external_invalid_list_is_validated() {
    let hashes = vec![U256::MAX; 3];
    assert!(matches!(
        PrehashArray::from_parts(hashes.clone(), vec![4]),
        Err(PrehashError::InvalidIndex { index: 4, n: 3 })
    ));
    let mut array = PrehashArray::from_parts(hashes, vec![2]).unwrap();
    let prehasher = Prehasher::new(params(3, GroupOrder::curve25519(), 64));
    prehasher.update(&mut array);
    assert_eq!(array.hashes()[0], U256::MAX);
    assert_eq!(array.hashes()[2], U256::MAX);
    assert_ne!(array.hashes()[1], U256::MAX);
}

#[test]
fn config_drives_a_full_run() {
    let config = PrehashConfig::from_json_str(
        r#"{"n": 32, "group_order": "0x65", "threshold": "widest", "max_rounds": 8}"#,
    )
    .unwrap();
    let params = config.validate().unwrap();
    let layout = *params.layout();
    let buffer = fixed_buffer(&layout, 9);
    let input = PackedInput::new(&buffer, layout).unwrap();
    let run = Prehasher::new(params)
        .prehash(&input, FinalVariant::MultSecKey)
        .unwrap();
    assert!(run.array.hashes().iter().all(|h| *h < U256::from(101u64)));
}
