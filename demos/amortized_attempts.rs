use prehash::{pack_input, BufferLayout, FinalVariant, PackedInput, PrehashConfig, Prehasher};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::time::Instant;

fn random_field(rng: &mut StdRng, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    bytes
}

fn main() {
    let mut config = PrehashConfig::default();
    config.n = 1 << 14;
    let params = config.validate().expect("default configuration is valid");
    let layout: BufferLayout = *params.layout();
    let prehasher = Prehasher::new(params);

    let mut rng = StdRng::seed_from_u64(7);
    let pk = random_field(&mut rng, layout.pk);
    let x = random_field(&mut rng, layout.x);
    let sk = random_field(&mut rng, layout.sk);

    let first = pack_input(
        &layout,
        &pk,
        &random_field(&mut rng, layout.mes),
        &random_field(&mut rng, layout.w),
        &x,
        &sk,
    )
    .expect("fields match layout");
    let start = Instant::now();
    let uctx = prehasher
        .unfinal_init(&PackedInput::new(&first, layout).expect("buffer length"))
        .expect("unfinalized init");
    println!(
        "Saved {} contexts for pk={} in {:.3} ms",
        uctx.len(),
        hex::encode(&pk[..8]),
        start.elapsed().as_secs_f64() * 1_000.0
    );

    for attempt in 0..4 {
        let buffer = pack_input(
            &layout,
            &pk,
            &random_field(&mut rng, layout.mes),
            &random_field(&mut rng, layout.w),
            &x,
            &sk,
        )
        .expect("fields match layout");
        let input = PackedInput::new(&buffer, layout).expect("buffer length");

        let resumed = prehasher
            .prehash_from_contexts(&uctx, &input, FinalVariant::MultSecKey)
            .expect("resumed run converges");
        let direct = prehasher
            .prehash(&input, FinalVariant::MultSecKey)
            .expect("direct run converges");
        assert_eq!(resumed.array.digest(), direct.array.digest());

        println!(
            "attempt {attempt}: rounds={} digest={} resume_init={:.3} ms direct_init={:.3} ms",
            resumed.stats.rounds,
            hex::encode(resumed.array.digest()),
            resumed.stats.init_duration.as_secs_f64() * 1_000.0,
            direct.stats.init_duration.as_secs_f64() * 1_000.0
        );
    }
}
