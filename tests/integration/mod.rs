/// Integration tests run against both storage backends

mod backend_parity;
mod basic_integration;
mod check_ins;
mod support;
