mod async_manager_tests;
mod mocks;
