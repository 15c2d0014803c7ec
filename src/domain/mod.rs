pub mod entity;
pub mod kind;
pub mod rules;
