#![no_main]

use libfuzzer_sys::fuzz_target;
use vkbd_web::input_parser::parse_encoded_input_to_event;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    // Must never panic; errors are fine.
    let _ = parse_encoded_input_to_event(json);
});
