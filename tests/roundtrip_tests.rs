use half::{bf16, f16};

use stensor::{Dtype, Metadata, Reader, TensorOrder, TensorView, Writer, WriterConfig, serialize};

mod common;
use common::data_generators::*;

// ----- Shape tests -----

#[test]
fn rt_dense_f32_1d() {
    let data = make_f32_data(1024);
    let mut w = Writer::new();
    w.add("v", &[1024], &data).unwrap();
    let blob = w.finish().unwrap();
    let r = Reader::parse(&blob).unwrap();
    assert_eq!(r.read_as::<f32>("v").unwrap(), data);
}

#[test]
fn rt_dense_f32_4d() {
    let data = make_f32_data(8 * 3 * 4 * 4);
    let mut w = Writer::new();
    w.add("x", &[8, 3, 4, 4], &data).unwrap();
    let blob = w.finish().unwrap();
    let r = Reader::parse(&blob).unwrap();
    assert_eq!(r.tensor("x").unwrap().shape(), &[8, 3, 4, 4]);
    assert_eq!(r.read_as::<f32>("x").unwrap(), data);
}

#[test]
fn rt_scalar() {
    let data: Vec<f32> = vec![42.0];
    let mut w = Writer::new();
    w.add("s", &[], &data).unwrap();
    let blob = w.finish().unwrap();
    let r = Reader::parse(&blob).unwrap();
    let view = r.tensor("s").unwrap();
    assert!(view.shape().is_empty());
    assert_eq!(view.num_elements(), 1);
    assert_eq!(r.read_as::<f32>("s").unwrap(), vec![42.0]);
}

#[test]
fn rt_zero_dimension() {
    let empty: Vec<f64> = Vec::new();
    let after = make_u8_data(3);
    let mut w = Writer::new();
    w.add("empty", &[4, 0], &empty).unwrap();
    w.add("after", &[3], &after).unwrap();
    let blob = w.finish().unwrap();
    let r = Reader::parse(&blob).unwrap();
    assert_eq!(r.info("empty").unwrap().data_offsets, (0, 0));
    assert!(r.tensor("empty").unwrap().data().is_empty());
    assert_eq!(r.read_as::<u8>("after").unwrap(), after);
}

// ----- Dtype tests -----

#[test]
fn rt_all_dtypes() {
    let f64_data = make_f64_data(5);
    let f32_data = make_f32_data(5);
    let f16_data = make_f16_data(5);
    let bf16_data = make_bf16_data(5);
    let i64_data = make_i64_data(5);
    let i32_data = make_i32_data(5);
    let i16_data = make_i16_data(5);
    let i8_data = make_i8_data(5);
    let u64_data = make_u64_data(5);
    let u32_data = make_u32_data(5);
    let u16_data = make_u16_data(5);
    let u8_data = make_u8_data(5);
    let bool_data = make_bool_data(5);

    let mut w = Writer::new();
    w.add("f64", &[5], &f64_data).unwrap();
    w.add("f32", &[5], &f32_data).unwrap();
    w.add("f16", &[5], &f16_data).unwrap();
    w.add("bf16", &[5], &bf16_data).unwrap();
    w.add("i64", &[5], &i64_data).unwrap();
    w.add("i32", &[5], &i32_data).unwrap();
    w.add("i16", &[5], &i16_data).unwrap();
    w.add("i8", &[5], &i8_data).unwrap();
    w.add("u64", &[5], &u64_data).unwrap();
    w.add("u32", &[5], &u32_data).unwrap();
    w.add("u16", &[5], &u16_data).unwrap();
    w.add("u8", &[5], &u8_data).unwrap();
    w.add_bytes("bool", vec![5], Dtype::Bool, bool_data.as_slice())
        .unwrap();
    let blob = w.finish().unwrap();

    let r = Reader::parse(&blob).unwrap();
    assert_eq!(r.len(), 13);
    assert_eq!(r.read_as::<f64>("f64").unwrap(), f64_data);
    assert_eq!(r.read_as::<f32>("f32").unwrap(), f32_data);
    assert_eq!(r.read_as::<f16>("f16").unwrap(), f16_data);
    assert_eq!(r.read_as::<bf16>("bf16").unwrap(), bf16_data);
    assert_eq!(r.read_as::<i64>("i64").unwrap(), i64_data);
    assert_eq!(r.read_as::<i32>("i32").unwrap(), i32_data);
    assert_eq!(r.read_as::<i16>("i16").unwrap(), i16_data);
    assert_eq!(r.read_as::<i8>("i8").unwrap(), i8_data);
    assert_eq!(r.read_as::<u64>("u64").unwrap(), u64_data);
    assert_eq!(r.read_as::<u32>("u32").unwrap(), u32_data);
    assert_eq!(r.read_as::<u16>("u16").unwrap(), u16_data);
    assert_eq!(r.read_as::<u8>("u8").unwrap(), u8_data);
    assert_eq!(
        r.read_as::<bool>("bool").unwrap(),
        vec![false, true, false, true, false]
    );

    for (name, view) in r.iter() {
        assert_eq!(view.dtype().as_str().to_lowercase(), name);
        assert_eq!(view.num_elements(), 5);
    }
}

#[test]
fn rt_sample_fixture_with_i64() {
    // Same tensors as the reference Python fixture (torch defaults to int64).
    let ints: Vec<i64> = vec![-1, 0, 1, 2];
    let floats: Vec<f32> = vec![-1.0, 0.0, 1.0, 2.0];
    let mut w = Writer::new();
    w.add("some_ints", &[1, 4], &ints).unwrap();
    w.add("some_floats", &[1, 2, 2], &floats).unwrap();
    let blob = w.finish().unwrap();

    let r = Reader::parse(&blob).unwrap();
    assert_eq!(r.tensor("some_ints").unwrap().shape(), &[1, 4]);
    assert_eq!(r.read_as::<i64>("some_ints").unwrap(), ints);
    assert_eq!(r.tensor("some_floats").unwrap().shape(), &[1, 2, 2]);
    assert_eq!(r.read_as::<f32>("some_floats").unwrap(), floats);
}

// ----- Layout tests -----

#[test]
fn rt_payload_is_concatenated_in_order() {
    let a = vec![1u8, 2];
    let b = vec![3u8, 4, 5];
    let mut w = Writer::new();
    w.add("a", &[2], &a).unwrap();
    w.add("b", &[3], &b).unwrap();
    let blob = w.finish().unwrap();
    let r = Reader::parse(&blob).unwrap();
    assert_eq!(r.payload(), &[1, 2, 3, 4, 5]);
    assert_eq!(r.header_len() % 8, 0);
    assert_eq!(blob.len(), 8 + r.header_len() + 5);
}

#[test]
fn rt_lexicographic_order() {
    let z = make_u16_data(2);
    let a = make_u16_data(3);
    let mut w = Writer::with_config(WriterConfig::new().order(TensorOrder::Lexicographic));
    w.add("zeta", &[2], &z).unwrap();
    w.add("alpha", &[3], &a).unwrap();
    let blob = w.finish().unwrap();
    let r = Reader::parse(&blob).unwrap();
    assert_eq!(r.names().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
    assert_eq!(r.info("alpha").unwrap().data_offsets, (0, 6));
    assert_eq!(r.info("zeta").unwrap().data_offsets, (6, 10));
}

#[test]
fn rt_insertion_order_is_deterministic() {
    let data = make_f32_data(4);
    let build = || {
        let mut w = Writer::new();
        w.add("b", &[4], &data).unwrap();
        w.add("a", &[2, 2], &data).unwrap();
        w.insert_metadata("k", "v");
        w.finish().unwrap()
    };
    assert_eq!(build(), build());
}

#[test]
fn rt_parse_is_idempotent() {
    let data = make_i32_data(6);
    let mut w = Writer::new();
    w.add("t", &[2, 3], &data).unwrap();
    let blob = w.finish().unwrap();
    let first = Reader::parse(&blob).unwrap();
    let second = Reader::parse(&blob).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.tensor("t").unwrap(), second.tensor("t").unwrap());
}

#[test]
fn rt_reader_views_feed_writer() {
    let data = make_f32_data(6);
    let mut w = Writer::new();
    w.add("w", &[2, 3], &data).unwrap();
    w.insert_metadata("format", "pt");
    let blob = w.finish().unwrap();

    let r = Reader::parse(&blob).unwrap();
    let mut copy = Writer::new();
    if let Some(metadata) = r.metadata() {
        copy.set_metadata(metadata.clone());
    }
    for (name, view) in r.iter() {
        copy.add_view(name, view).unwrap();
    }
    assert_eq!(copy.finish().unwrap(), blob);
}

#[test]
fn rt_serialize_helper() {
    let bytes = u32_le_bytes(&make_u32_data(4));
    let view = TensorView::new(Dtype::U32, vec![2, 2], bytes.as_slice()).unwrap();
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), "test".to_string());

    let blob = serialize([("m", view)], Some(metadata)).unwrap();
    let r = Reader::parse(&blob).unwrap();
    assert_eq!(r.read_as::<u32>("m").unwrap(), make_u32_data(4));
    assert_eq!(r.metadata().unwrap()["source"], "test");
}

#[test]
fn rt_unicode_names() {
    let data = make_u8_data(2);
    let mut w = Writer::new();
    w.add("layer.0/重み", &[2], &data).unwrap();
    w.add("quote\"name", &[2], &data).unwrap();
    let blob = w.finish().unwrap();
    let r = Reader::parse(&blob).unwrap();
    assert_eq!(r.read_as::<u8>("layer.0/重み").unwrap(), data);
    assert_eq!(r.read_as::<u8>("quote\"name").unwrap(), data);
}
