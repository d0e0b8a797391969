#![no_main]

use libfuzzer_sys::fuzz_target;
use marquee_core::{sort_listed, KeyedBuffer, RecordKey};

// Arbitrary windows must sort without panicking and keep every entry.
fuzz_target!(|data: &[u8]| {
    let mut entries: Vec<KeyedBuffer> = data
        .chunks(7)
        .enumerate()
        .map(|(i, chunk)| KeyedBuffer {
            key: RecordKey::new([i as u8; 32]),
            data: chunk.repeat(3).into(),
        })
        .collect();
    let total = entries.len();
    sort_listed(&mut entries);
    assert_eq!(entries.len(), total);
});
