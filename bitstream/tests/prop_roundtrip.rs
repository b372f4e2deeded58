use bitstream::{pack_group, unpack_group, BitError, BitReader, BitWriter};
use proptest::prelude::*;

fn mask_value(bits: u8, value: u64) -> u64 {
    if bits >= 64 {
        value
    } else {
        let mask = (1u64 << bits) - 1;
        value & mask
    }
}

/// A group of (width, value) pairs padded with a final field so the
/// widths sum to a multiple of 8.
fn group_strategy() -> impl Strategy<Value = Vec<(u8, u64)>> {
    prop::collection::vec((1u8..=64, any::<u64>()), 1..12).prop_map(|fields| {
        let mut fields: Vec<(u8, u64)> = fields
            .into_iter()
            .map(|(bits, value)| (bits, mask_value(bits, value)))
            .collect();
        let total: usize = fields.iter().map(|(bits, _)| usize::from(*bits)).sum();
        let pad = (8 - total % 8) % 8;
        if pad > 0 {
            fields.push((pad as u8, 0));
        }
        fields
    })
}

proptest! {
    #[test]
    fn prop_group_roundtrip(fields in group_strategy()) {
        let widths: Vec<u8> = fields.iter().map(|(bits, _)| *bits).collect();
        let values: Vec<u64> = fields.iter().map(|(_, value)| *value).collect();

        let bytes = pack_group(&values, &widths).unwrap();
        let total: usize = widths.iter().map(|&w| usize::from(w)).sum();
        prop_assert_eq!(bytes.len() * 8, total);

        let (decoded, len) = unpack_group(&bytes, 0, &widths).unwrap();
        prop_assert_eq!(len, bytes.len());
        prop_assert_eq!(decoded, values);
    }

    #[test]
    fn prop_oversized_value_rejected(bits in 1u8..64, excess in 0u64..1024) {
        let value = (1u64 << bits).saturating_add(excess);
        let mut writer = BitWriter::new();
        let err = writer.write_bits(value, bits).unwrap_err();
        prop_assert_eq!(err, BitError::ValueOutOfRange { value, bits });
        prop_assert_eq!(writer.bits_written(), 0);
    }

    #[test]
    fn prop_reader_never_overreads(data in prop::collection::vec(any::<u8>(), 0..16), bits in 0u8..=64) {
        let mut reader = BitReader::new(&data);
        let available = reader.bits_remaining();
        match reader.read_bits(bits) {
            Ok(_) => prop_assert!(usize::from(bits) <= available),
            Err(BitError::UnexpectedEof { .. }) => prop_assert!(usize::from(bits) > available),
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }
}
