#![no_main]

use libfuzzer_sys::fuzz_target;
use wire::{decode_message, encode_message, Limits, MAX_MESSAGE_SIZE};

fuzz_target!(|data: &[u8]| {
    let limits = Limits::default();
    let Ok(message) = decode_message(data, &limits) else {
        return;
    };

    // Anything that decodes re-encodes to the same bytes.
    let mut buf = [0u8; MAX_MESSAGE_SIZE];
    let len = encode_message(&message, &mut buf).expect("decoded message encodes");
    assert_eq!(&buf[..len], data);
    assert_eq!(decode_message(&buf[..len], &limits), Ok(message));
});
