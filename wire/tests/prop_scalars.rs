use proptest::prelude::*;
use wire::{read_u16, read_u32, read_u8, write_u16, write_u32, write_u8, ByteOrder};

fn order_strategy() -> impl Strategy<Value = ByteOrder> {
    prop_oneof![Just(ByteOrder::Little), Just(ByteOrder::Big)]
}

proptest! {
    #[test]
    fn prop_scalar_sequence_roundtrip(
        order in order_strategy(),
        byte in any::<u8>(),
        word in any::<u16>(),
        long in any::<u32>(),
    ) {
        let mut out = Vec::new();
        write_u8(&mut out, u64::from(byte)).unwrap();
        write_u16(&mut out, u64::from(word), order).unwrap();
        write_u32(&mut out, u64::from(long), order).unwrap();
        prop_assert_eq!(out.len(), 7);

        prop_assert_eq!(read_u8(&out, 0).unwrap(), byte);
        prop_assert_eq!(read_u16(&out, 1, order).unwrap(), word);
        prop_assert_eq!(read_u32(&out, 3, order).unwrap(), long);
    }

    #[test]
    fn prop_orders_are_mirror_images(long in any::<u32>()) {
        let little = ByteOrder::Little.encode_u32(long);
        let mut big = ByteOrder::Big.encode_u32(long);
        big.reverse();
        prop_assert_eq!(little, big);
    }
}
