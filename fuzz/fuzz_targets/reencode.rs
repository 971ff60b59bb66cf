#![no_main]

use libfuzzer_sys::fuzz_target;
use bertree::{Mode, Value};

fuzz_target!(|data: &[u8]| {
    // Whatever decodes must round-trip: re-encoding in the mode it was
    // decoded in and decoding again has to produce an equal value, and
    // the canonical conversion has to be idempotent.
    for mode in [Mode::Ber, Mode::Dl, Mode::Der] {
        let Ok(value) = Value::decode(data, mode) else {
            continue
        };
        let encoded = value.to_vec(mode);
        let reread = Value::decode(encoded.as_slice(), mode)
            .expect("re-encoded value failed to decode");
        assert_eq!(reread, value);

        let der = value.to_der();
        assert_eq!(
            der.to_vec(Mode::Ber), value.to_vec(Mode::Der)
        );
        assert_eq!(der.to_der().to_vec(Mode::Ber), der.to_vec(Mode::Ber));
    }
});
