#![no_main]

use libfuzzer_sys::fuzz_target;
use osu_replay::{ReplayDecoder, ReplayEncoder};

fuzz_target!(|data: &[u8]| {
    if let Ok(replay) = ReplayDecoder::new().decode(data) {
        let _ = ReplayEncoder::new().encode(&replay);
    }
});
