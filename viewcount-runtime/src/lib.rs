// you don't want your application runtime to randomly crash
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub use crate::{
    function::{CounterFunction, Function},
    table::Table,
};

pub mod config;
pub mod error;
pub mod function;
pub mod http;
pub mod kv;
pub mod logs;
pub mod server;
pub mod table;
