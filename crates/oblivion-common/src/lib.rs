#![allow(clippy::too_many_arguments, clippy::float_cmp, clippy::needless_range_loop)]

pub mod q_shared;
