pub mod client;
mod memory;
mod postgres;
mod record;
