#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = stensor::header::decode(data) {
        let encoded = stensor::header::encode(&header).unwrap();
        assert_eq!(stensor::header::decode(&encoded).unwrap(), header);
    }
});
