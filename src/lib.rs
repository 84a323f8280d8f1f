#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

pub mod arbitrary;
pub mod config;
pub mod driver;
pub mod error;
pub mod generate;
pub mod property;
pub mod random;
pub mod reproduce;
pub mod seq;
pub mod shrink;
pub mod state;
pub mod strategy;

pub use arbitrary::{arbitrary, Arbitrary};
pub use config::Configuration;
pub use driver::{reproduce_property, test_property, Listener, Metadata, NullListener, TestParams, TestResult};
pub use error::{ConfigurationError, GenerationFailure, SerializationError};
pub use generate::{
    container, container_of, element, element_of, in_range, negative, non_negative, non_zero, one_of, positive,
    sized_element, sized_one_of, tuple2, tuple3, tuple4, tuple5, tuple6, unique, unique_by, weighted_element,
    weighted_one_of, with_size, Gen,
};
pub use property::{discard_if, tag, to_property, CaseDescription, CaseResult, IntoCaseResult};
pub use random::Random;
pub use reproduce::Reproduce;
pub use seq::Seq;
pub use shrink::{find_local_min, walk_path, Shrinkable};
