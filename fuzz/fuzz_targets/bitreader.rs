#![no_main]

use bitstream::{unpack_group, BitReader, BitWriter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    // First bytes pick widths, the remainder is the bit source.
    let count = usize::from(split % 16).min(rest.len());
    let (widths, payload) = rest.split_at(count);
    let widths: Vec<u8> = widths.iter().map(|w| w % 64 + 1).collect();

    let mut reader = BitReader::new(payload);
    let mut writer = BitWriter::new();
    for &bits in &widths {
        match reader.read_bits(bits) {
            Ok(value) => writer
                .write_bits(value, bits)
                .expect("value read with `bits` fits in `bits`"),
            Err(_) => return,
        }
    }
    assert_eq!(writer.bits_written(), reader.bit_position());

    if let Ok((values, used)) = unpack_group(payload, 0, &widths) {
        assert!(used <= payload.len());
        assert_eq!(values.len(), widths.len());
    }
});
