#![no_main]

use formats::GifParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(parser) = GifParser::new() else {
        return;
    };
    if let Ok((file, used)) = parser.parse(data) {
        assert!(used <= data.len());
        let encoded = parser.encode(&file).expect("decoded file re-encodes");
        assert_eq!(encoded, &data[..used]);
    }
});
