#[macro_use]
extern crate diesel;

pub mod actions;
pub mod models;
pub mod runner;
#[rustfmt::skip]
pub mod schema;
pub mod sql_funcs;
