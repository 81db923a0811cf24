pub mod inspect;
pub mod open_flags;
