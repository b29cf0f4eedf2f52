//! Property-based tests for the prehash arithmetic and hashing layers.
//!
//! - Reduction and multiplication modulo the Curve25519 order agree with
//!   `curve25519-dalek` scalars.
//! - Small-modulus arithmetic agrees with native `u128` arithmetic.
//! - Finishing a saved context equals hashing the whole message.

use curve25519_dalek::scalar::Scalar;
use prehash::{
    pack_input, Blake2bEngine, BufferLayout, GroupOrder, HashEngine, PackedInput, PrehashParams,
    Prehasher, ThresholdPolicy, U256,
};
use proptest::prelude::*;

fn arb_u256() -> impl Strategy<Value = U256> {
    prop::array::uniform32(any::<u8>()).prop_map(U256::from_be_bytes)
}

fn to_le(value: &U256) -> [u8; 32] {
    let mut bytes = value.to_be_bytes::<32>();
    bytes.reverse();
    bytes
}

fn from_scalar(s: &Scalar) -> U256 {
    let mut bytes = s.to_bytes();
    bytes.reverse();
    U256::from_be_bytes(bytes)
}

fn small_layout() -> BufferLayout {
    BufferLayout {
        pk: 33,
        mes: 32,
        w: 8,
        padding: 3,
        x: 32,
        sk: 32,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Reduction of anything below the threshold matches the reference and lands in [0, Q).
    #[test]
    fn reduce_below_threshold_matches_reference(raw in arb_u256()) {
        let order = GroupOrder::curve25519();
        let a = raw % *order.threshold();
        prop_assert!(order.is_accepted(&a));
        let r = order.reduce_mod(&a);
        prop_assert!(r < *order.modulus());
        prop_assert_eq!(r, from_scalar(&Scalar::from_bytes_mod_order(to_le(&a))));
    }

    /// Reduction of arbitrary 256-bit values matches the reference.
    #[test]
    fn reduce_full_range_matches_reference(a in arb_u256()) {
        let order = GroupOrder::curve25519();
        prop_assert_eq!(
            order.reduce_mod(&a),
            from_scalar(&Scalar::from_bytes_mod_order(to_le(&a)))
        );
    }

    /// `(a mod Q) · x mod Q` matches scalar multiplication.
    #[test]
    fn mul_mod_matches_reference(a in arb_u256(), x in arb_u256()) {
        let order = GroupOrder::curve25519();
        let got = order.mul_mod(&order.reduce_mod(&a), &x);
        let expected = Scalar::from_bytes_mod_order(to_le(&a))
            * Scalar::from_bytes_mod_order(to_le(&x));
        prop_assert!(got < *order.modulus());
        prop_assert_eq!(got, from_scalar(&expected));
    }

    /// Small odd moduli agree with native arithmetic.
    #[test]
    fn small_modulus_matches_u128(a in any::<u64>(), b in any::<u64>(), m in 1u64..u64::MAX / 2) {
        let q = 2 * m + 1;
        let order = GroupOrder::new(U256::from(q), ThresholdPolicy::Widest).unwrap();
        let (a128, b128, q128) = (a as u128, b as u128, q as u128);
        prop_assert_eq!(order.reduce_mod(&U256::from(a)), U256::from((a128 % q128) as u64));
        prop_assert_eq!(
            order.mul_mod(&U256::from(a), &U256::from(b)),
            U256::from((a128 * b128 % q128) as u64)
        );
    }

    /// Saved contexts finish to the same digest as the one-shot hash.
    #[test]
    fn context_equivalence(
        index in any::<u32>(),
        pk in prop::collection::vec(any::<u8>(), 33),
        mes in prop::collection::vec(any::<u8>(), 0..64),
        w in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let engine = Blake2bEngine;
        let m = prehash::counter_message(16);
        let index = index.to_be_bytes();
        let ctx = engine.begin(&[&index[..], &m[..], &pk[..]]);
        prop_assert_eq!(
            engine.finish(&ctx, &[&mes[..], &w[..]]),
            engine.hash(&[&index[..], &m[..], &pk[..], &mes[..], &w[..]])
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Init computed from saved contexts equals the direct Init.
    #[test]
    fn init_from_contexts_equals_init(
        pk in prop::array::uniform32(any::<u8>()),
        mes in prop::array::uniform32(any::<u8>()),
        w in any::<u64>(),
    ) {
        let layout = small_layout();
        let params = PrehashParams::new(
            64,
            GroupOrder::curve25519(),
            64,
            prehash::counter_message(32),
            layout,
        )
        .unwrap();
        let prehasher = Prehasher::new(params);
        let mut pk33 = [2u8; 33];
        pk33[1..].copy_from_slice(&pk);
        let buffer =
            pack_input(&layout, &pk33, &mes, &w.to_be_bytes(), &[1; 32], &[0; 32]).unwrap();
        let input = PackedInput::new(&buffer, layout).unwrap();
        let direct = prehasher.init(&input).unwrap();
        let uctx = prehasher.unfinal_init(&input).unwrap();
        let resumed = prehasher.init_from_contexts(&uctx, &input).unwrap();
        prop_assert_eq!(direct, resumed);
    }
}
