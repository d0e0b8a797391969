#![no_main]

use libfuzzer_sys::fuzz_target;
use marquee_core::{decode_record, encode_record};

fuzz_target!(|data: &[u8]| {
    let Ok(record) = decode_record(data) else {
        return;
    };
    assert!(record.encoded_len() <= data.len());

    if let Ok(buf) = encode_record(&record) {
        assert_eq!(buf[..], data[..buf.len()]);
        assert_eq!(decode_record(&buf).ok(), Some(record));
    }
});
