pub mod normalizer;
pub mod short_code;
