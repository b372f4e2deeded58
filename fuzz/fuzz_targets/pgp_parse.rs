#![no_main]

use formats::PgpParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(parser) = PgpParser::new() else {
        return;
    };
    if let Ok(packets) = parser.parse_all(data) {
        let encoded: Vec<u8> = packets
            .iter()
            .flat_map(|packet| parser.encode_packet(packet).expect("decoded packet re-encodes"))
            .collect();
        assert_eq!(encoded, data);
    }
});
