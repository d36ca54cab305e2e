/// Unit tests for the public domain API

mod basic_tests;
mod streak_properties;
