#![no_main]

use libfuzzer_sys::fuzz_target;
use osu_model::{BeatmapDecoder, encode};

fuzz_target!(|data: &[u8]| {
    let Ok(beatmap) = BeatmapDecoder::new().decode(data) else {
        return;
    };
    // anything that decodes must encode and decode again
    let encoded = encode(&beatmap);
    let _ = BeatmapDecoder::new().decode(&encoded);
});
