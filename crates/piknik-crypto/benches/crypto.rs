use piknik_core::Opcode;
use piknik_crypto::{
    auth2_store, encrypt_and_sign, signing_key_from_seed, verify_and_decrypt, EncryptKey, Psk,
};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_encrypt_and_sign(bencher: divan::Bencher, size: usize) {
    let key = EncryptKey::from_bytes([0x42; 32]);
    let id = key.key_id();
    let signing = signing_key_from_seed(&[0x17; 32]);
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            encrypt_and_sign(
                divan::black_box(&key),
                &id,
                &signing,
                divan::black_box(&data),
            )
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_verify_and_decrypt(bencher: divan::Bencher, size: usize) {
    let key = EncryptKey::from_bytes([0x42; 32]);
    let id = key.key_id();
    let signing = signing_key_from_seed(&[0x17; 32]);
    let verifying = signing.verifying_key();
    let sealed = encrypt_and_sign(&key, &id, &signing, &make_data(size));
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            verify_and_decrypt(
                &key,
                &id,
                &verifying,
                divan::black_box(&sealed.payload),
                &sealed.signature,
            )
            .unwrap()
        });
}

#[divan::bench]
fn bench_auth2_store() -> [u8; 32] {
    let psk = Psk::from_bytes([0x11; 32]);
    auth2_store(
        divan::black_box(&psk),
        divan::black_box(&[0x22; 32]),
        Opcode::Store,
        &[0x33; 8],
        &[0x44; 64],
    )
}

fn main() {
    divan::main();
}
