#![no_main]

use libfuzzer_sys::fuzz_target;
use bertree::Mode;
use bertree::decode::{Entry, StreamParser};

fuzz_target!(|data: &[u8]| {
    // Drive the pull interface without materialising: enter every
    // constructed value and skip its content.
    let mut parser = StreamParser::new(data, Mode::Ber);
    loop {
        match parser.next_value() {
            Ok(Some(Entry::Primitive(_))) => { }
            Ok(Some(Entry::Constructed(mut cons))) => {
                let _ = cons.skip_rest();
            }
            Ok(None) => break,
            Err(_) => break,
        }
    }
});
