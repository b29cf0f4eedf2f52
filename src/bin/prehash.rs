//! Minimal CLI for the prehash pipeline.
//!
//! This binary runs the pipeline over a packed input buffer, prints the
//! default configuration, and times the phases across array sizes.

use prehash::{
    write_hash_series, FinalVariant, PackedInput, PrehashConfig, PrehashError, PrehashParams,
    PrehashStats, Prehasher,
};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::{
    env, fs,
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

const BENCH_SEED: u64 = 0x5052_4548_4153_4800;

fn fatal(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn print_run_help() {
    println!("Usage: prehash run --input <hex|@file> [flags]");
    println!("  --config <file.json>   configuration (defaults if omitted)");
    println!("  --n <N>                override the array size");
    println!("  --mult-sec-key         scale by the secret scalar in the Final phase");
    println!("  --out <dir>            write the hash array as hex lines");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let command = args.next();
    match command.as_deref() {
        Some("run") => cmd_run(args.collect()),
        Some("bench") => cmd_bench(args.collect()),
        Some("config") => cmd_config(args.collect()),
        _ => {
            eprintln!("Usage: prehash <run|bench|config> ...");
            std::process::exit(1);
        }
    }
}

fn load_params(config_path: Option<PathBuf>, n: Option<u32>) -> PrehashParams {
    let mut config = match config_path {
        Some(path) => PrehashConfig::load(&path)
            .unwrap_or_else(|err| fatal(&format!("failed to load {}: {err}", path.display()))),
        None => PrehashConfig::default(),
    };
    if let Err(err) = config.apply_env_overrides() {
        fatal(&err.to_string());
    }
    if let Some(n) = n {
        config.n = n;
    }
    config
        .validate()
        .unwrap_or_else(|err| fatal(&err.to_string()))
}

fn read_input(spec: &str) -> Vec<u8> {
    let text = match spec.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .unwrap_or_else(|err| fatal(&format!("failed to read {path}: {err}"))),
        None => spec.to_string(),
    };
    let digits = text.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    hex::decode(digits).unwrap_or_else(|err| fatal(&format!("invalid input hex: {err}")))
}

fn cmd_run(args: Vec<String>) {
    let mut config_path: Option<PathBuf> = None;
    let mut input_spec: Option<String> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut n: Option<u32> = None;
    let mut variant = FinalVariant::Reduce;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_run_help();
                return;
            }
            "--config" => {
                let value = iter
                    .next()
                    .unwrap_or_else(|| fatal("--config expects a path"));
                config_path = Some(PathBuf::from(value));
            }
            "--input" => {
                input_spec = Some(
                    iter.next()
                        .unwrap_or_else(|| fatal("--input expects hex or @file")),
                );
            }
            "--n" => {
                let value = iter.next().unwrap_or_else(|| fatal("--n expects a value"));
                n = Some(value.parse().unwrap_or_else(|_| fatal("invalid --n value")));
            }
            "--mult-sec-key" => variant = FinalVariant::MultSecKey,
            "--out" => {
                let value = iter
                    .next()
                    .unwrap_or_else(|| fatal("--out expects a directory"));
                out_dir = Some(PathBuf::from(value));
            }
            other => fatal(&format!("unknown argument: {other}")),
        }
    }
    let input_spec = input_spec.unwrap_or_else(|| {
        print_run_help();
        std::process::exit(1);
    });
    let params = load_params(config_path, n);
    let bytes = read_input(&input_spec);
    let input =
        PackedInput::new(&bytes, *params.layout()).unwrap_or_else(|err| fatal(&err.to_string()));
    let prehasher = Prehasher::new(params);
    match prehasher.prehash(&input, variant) {
        Ok(run) => {
            println!(
                "QSYS|mod=PREHASH|evt=DONE|n={}|rounds={}|variant={:?}|digest={}|total_ms={:.3}",
                run.array.n(),
                run.stats.rounds,
                variant,
                hex::encode(run.array.digest()),
                ms(&run.stats.total_duration)
            );
            if let Some(dir) = out_dir {
                match write_hash_series(&dir, "prehash", 0, run.array.hashes()) {
                    Ok(path) => println!("QSYS|mod=PREHASH|evt=WRITE|path={}", path.display()),
                    Err(err) => fatal(&format!("failed to write hashes: {err}")),
                }
            }
        }
        Err(PrehashError::ConvergenceExceeded { rounds, remaining, .. }) => {
            println!(
                "QSYS|mod=PREHASH|evt=CONVERGENCE_EXCEEDED|rounds={rounds}|remaining={remaining}"
            );
            std::process::exit(2);
        }
        Err(err) => fatal(&err.to_string()),
    }
}

fn cmd_config(args: Vec<String>) {
    if let Some(other) = args.first() {
        fatal(&format!("unknown argument: {other}"));
    }
    match PrehashConfig::default().to_json_string() {
        Ok(text) => println!("{text}"),
        Err(err) => fatal(&err.to_string()),
    }
}

fn cmd_bench(args: Vec<String>) {
    let mut max_log2: usize = 16;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--log2-n" => {
                let value = iter
                    .next()
                    .unwrap_or_else(|| fatal("--log2-n expects a value"));
                max_log2 = value
                    .parse()
                    .unwrap_or_else(|_| fatal("invalid --log2-n value"));
            }
            other => fatal(&format!("unknown argument: {other}")),
        }
    }
    if !(10..=31).contains(&max_log2) {
        fatal("--log2-n must be between 10 and 31");
    }
    run_bench(max_log2);
}

fn run_bench(max_log2: usize) {
    let mut rng = StdRng::seed_from_u64(BENCH_SEED);
    println!(
        "{:>5} | {:>10} | {:>10} | {:>6} | {:>10} | {:>10} | {:>10} | {:>12}",
        "log2n", "n", "init(ms)", "rounds", "update(ms)", "final(ms)", "uctx(ms)", "resume(ms)"
    );
    println!("{}", "-".repeat(96));
    for log2 in (10..=max_log2).step_by(2) {
        let n = 1u32 << log2;
        let params = load_params(None, Some(n));
        let mut bytes = vec![0u8; params.layout().total_len()];
        rng.fill_bytes(&mut bytes);
        let input = PackedInput::new(&bytes, *params.layout())
            .unwrap_or_else(|err| fatal(&err.to_string()));
        let prehasher = Prehasher::new(params);

        let run = prehasher
            .prehash(&input, FinalVariant::MultSecKey)
            .unwrap_or_else(|err| fatal(&err.to_string()));
        let rounds_ms = update_ms(&run.stats);

        let uctx_start = Instant::now();
        let uctx = prehasher
            .unfinal_init(&input)
            .unwrap_or_else(|err| fatal(&err.to_string()));
        let uctx_ms = ms(&uctx_start.elapsed());
        let resumed = prehasher
            .prehash_from_contexts(&uctx, &input, FinalVariant::MultSecKey)
            .unwrap_or_else(|err| fatal(&err.to_string()));
        if resumed.array.digest() != run.array.digest() {
            fatal("context-resumed run diverged from direct run");
        }

        println!(
            "{:>5} | {:>10} | {:>10.3} | {:>6} | {:>10.3} | {:>10.3} | {:>10.3} | {:>12.3}",
            log2,
            n,
            ms(&run.stats.init_duration),
            run.stats.rounds,
            rounds_ms,
            ms(&run.stats.final_duration),
            uctx_ms,
            ms(&resumed.stats.init_duration)
        );
    }
}

fn ms(duration: &Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

fn update_ms(stats: &PrehashStats) -> f64 {
    stats.round_durations.iter().map(ms).sum()
}
