pub mod assertions;
pub mod fixtures;
pub mod logging;

pub use assertions::{assert_blocked, assert_contains, assert_silent};
pub use fixtures::GitRepo;
pub use logging::init_test_logging;
