#![no_main]

use codec::{unpack, ProcfieldTable};
use libfuzzer_sys::fuzz_target;
use schema::{Format, FormatLimits};

fuzz_target!(|data: &[u8]| {
    // Split the input into a format string and a buffer to run it against.
    let split = data.iter().position(|b| *b == 0).unwrap_or(data.len());
    let Ok(source) = std::str::from_utf8(&data[..split]) else {
        return;
    };
    let Ok(format) = Format::parse_with_limits(source, &FormatLimits::for_testing()) else {
        return;
    };
    let reparsed: Format = format.to_string().parse().expect("rendered format parses");
    assert_eq!(reparsed.ops(), format.ops());
    assert_eq!(reparsed.byte_order(), format.byte_order());

    let buffer = data.get(split + 1..).unwrap_or_default();
    if format.procfield_names().next().is_none() {
        if let Ok((values, used)) = unpack(&format, buffer, 0, &ProcfieldTable::new()) {
            assert_eq!(values.len(), format.slot_count());
            assert_eq!(used, format.fixed_size());
        }
    }
});
