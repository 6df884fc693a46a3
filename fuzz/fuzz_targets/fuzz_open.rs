#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    let mut tmp = tempfile::Builder::new()
        .suffix(".safetensors")
        .tempfile()
        .unwrap();
    tmp.write_all(data).unwrap();

    let mapped = match stensor::MmapReader::open(tmp.path()) {
        Ok(m) => m,
        Err(_) => return,
    };

    let names: Vec<String> = mapped.names().map(str::to_string).collect();
    for name in &names {
        let view = mapped.tensor(name).unwrap();
        let _ = view.as_slice::<f32>();
    }
});
