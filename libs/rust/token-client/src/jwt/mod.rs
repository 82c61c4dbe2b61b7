//! Client assertion construction (RFC 7523).

pub mod assertion;
pub mod builder;
pub mod claims;

pub use assertion::{Assertion, SigningInput};
pub use builder::{
    AssertionBuilder, Clock, FixedClock, JtiGenerator, RandomJti, SystemClock, build_signing_input,
};
pub use claims::{ASSERTION_SKEW_SECONDS, Claims, Header};
