use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use formats::{GifParser, PgpParser};

/// A GIF with `frames` images, each carrying `blocks` full data sub-blocks.
fn gen_gif(frames: usize, blocks: usize) -> Vec<u8> {
    let mut d = b"GIF89a".to_vec();
    d.extend([0x40, 0x00, 0x40, 0x00, 0xF7, 0x00, 0x00]);
    d.extend((0..256 * 3).map(|i| (i * 31 % 256) as u8));
    for frame in 0..frames {
        d.extend([0x21, 0xF9, 0x04, 0x04, 0x05, 0x00, 0x00, 0x00]);
        d.extend([0x2C, 0, 0, 0, 0, 0x40, 0, 0x40, 0, 0x00, 0x08]);
        for block in 0..blocks {
            d.push(0xFF);
            d.extend((0..255).map(|i| ((i + block + frame) % 256) as u8));
        }
        d.push(0x00);
    }
    d.push(0x3B);
    d
}

/// A keyring of `keys` public key certificates, each followed by a user id.
fn gen_keyring(keys: usize) -> Vec<u8> {
    let mut d = Vec::new();
    for i in 0..keys {
        let mut body = vec![0x03, 0x2F, 0x00, 0x00, i as u8, 0x00, 0x00, 0x01];
        body.extend([0x04, 0x00]); // 1024-bit modulus
        body.extend((0..128).map(|b| ((b * 7 + i) % 256) as u8 | 0x80));
        body.extend([0x00, 0x05, 0x11]);
        d.push(0x99);
        d.extend((body.len() as u16).to_be_bytes());
        d.extend(body);

        let id = format!("User {i} <user{i}@example.org>");
        d.push(0xB4);
        d.push(id.len() as u8);
        d.extend(id.as_bytes());
    }
    d
}

fn bench_gif(c: &mut Criterion) {
    let parser = GifParser::new().unwrap();
    let mut group = c.benchmark_group("gif");
    for &(frames, blocks) in &[(1usize, 4usize), (16, 16)] {
        let data = gen_gif(frames, blocks);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(format!("parse_{frames}x{blocks}"), |b| {
            b.iter(|| parser.parse(black_box(&data)).unwrap());
        });
        let (file, _) = parser.parse(&data).unwrap();
        group.bench_function(format!("encode_{frames}x{blocks}"), |b| {
            b.iter(|| parser.encode(black_box(&file)).unwrap());
        });
    }
    group.finish();
}

fn bench_keyring(c: &mut Criterion) {
    let parser = PgpParser::new().unwrap();
    let mut group = c.benchmark_group("pgp");
    for &keys in &[1usize, 64] {
        let data = gen_keyring(keys);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(format!("parse_{keys}_keys"), |b| {
            b.iter(|| parser.parse_all(black_box(&data)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_gif, bench_keyring);
criterion_main!(benches);
