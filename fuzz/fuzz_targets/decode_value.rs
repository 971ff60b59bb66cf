#![no_main]

use libfuzzer_sys::fuzz_target;
use bertree::{Mode, Value};

fuzz_target!(|data: &[u8]| {
    let _ = Value::decode(data, Mode::Ber);
    let _ = Value::decode(data, Mode::Dl);
    let _ = Value::decode(data, Mode::Der);
});
