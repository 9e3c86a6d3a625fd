pub mod fixtures;
pub mod test_utils;

mod game_tests;
