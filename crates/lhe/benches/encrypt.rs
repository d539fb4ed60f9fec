use criterion::{criterion_group, criterion_main, Criterion};
use lhe::{Encryptor, HeParametersBuilder, KeyKind, Plaintext, PublicKey, SchemeType, SecretKey};
use lhe_math::rq::{Poly, Representation};
use rand::thread_rng;

pub fn encryption_benchmark(c: &mut Criterion) {
    let mut rng = thread_rng();
    let mut group = c.benchmark_group("encrypt");
    group.sample_size(10);

    let par = HeParametersBuilder::new()
        .set_scheme(SchemeType::Ckks)
        .set_degree(2048)
        .set_moduli_sizes(&[50, 50, 50])
        .build_arc()
        .unwrap();

    let sk = SecretKey::random(&par, &mut rng);
    let pk = PublicKey::new(&sk, &mut rng).unwrap();
    let mut enc = Encryptor::new(&par);
    enc.set_public_key(pk).unwrap();
    enc.set_secret_key(sk).unwrap();
    enc.prepare_noise_pool(&mut rng);

    let level = *par.first_level_id();
    let ctx = par.level_data(&level).unwrap().ctx().clone();
    let poly = Poly::random(&ctx, Representation::Ntt, &mut rng);
    let pt = Plaintext::new_evaluation(poly, &level, 2f64.powi(40), &par).unwrap();

    group.bench_function("encrypt_zero_symmetric/n=2048", |b| {
        b.iter(|| {
            enc.try_encrypt_zero(&level, KeyKind::Secret, false, &mut rng)
                .unwrap()
        })
    });

    group.bench_function("encrypt_asymmetric/n=2048", |b| {
        b.iter(|| enc.try_encrypt(&pt, KeyKind::Public, false, &mut rng).unwrap())
    });

    let mask = enc.sample_symmetric_mask(true, &mut rng).unwrap();
    group.bench_function("encrypt_symmetric_fast/n=2048", |b| {
        b.iter(|| enc.try_encrypt_symmetric_fast(&pt, &mask).unwrap())
    });

    group.finish();
}

criterion_group!(benches, encryption_benchmark);
criterion_main!(benches);
