#![allow(dead_code)]

pub mod blob_builder;
pub mod data_generators;
