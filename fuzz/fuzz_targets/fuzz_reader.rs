#![no_main]
use libfuzzer_sys::fuzz_target;
use stensor::{Reader, Writer};

fuzz_target!(|data: &[u8]| {
    // Expect rejection almost always; only crashes or OOMs matter.
    let reader = match Reader::parse(data) {
        Ok(r) => r,
        Err(_) => return,
    };

    // Every accepted blob must survive a rewrite.
    let mut writer = Writer::new();
    if let Some(metadata) = reader.metadata() {
        writer.set_metadata(metadata.clone());
    }
    for (name, view) in reader.iter() {
        let _ = view.to_vec::<f32>();
        writer.add_view(name, view).unwrap();
    }
    let blob = writer.finish().unwrap();
    let again = Reader::parse(&blob).unwrap();
    assert_eq!(again.len(), reader.len());
    for (name, view) in reader.iter() {
        assert_eq!(again.tensor(name).unwrap(), view);
    }
});
