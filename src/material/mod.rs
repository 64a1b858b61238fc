pub mod kind;
pub mod pattern;
