//! Tests for the authentication helpers

mod token_tests;
