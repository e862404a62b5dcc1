//! Pagetest runner
//!
//! Turns browser test pages into host-framework test results:
//! - Discovers fixture pages under a root directory
//! - Runs each fixture in the bundled headless browser via a driver script
//! - Decodes the order-preserving JSON payload the driver prints
//! - Flattens decoded results into one test entity per assertion
//! - Executes entities through the built-in harness
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  discovery::discover_sorted(root, suffix) -> [fixture]       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  SuiteCollector<E: FixtureExecutor>                          │
//! │    ├── HeadlessRunner::run(fixture) -> RawOutput             │
//! │    │     executable driver.js fixture.html [timeout]         │
//! │    └── decode::decode(stdout) -> SuiteResult                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │  flatten::flatten([SuiteResult]) -> [TestEntity]             │
//! │  harness::execute([TestEntity]) -> SuiteRun                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod collector;
pub mod decode;
pub mod discovery;
pub mod flatten;
pub mod harness;
pub mod headless;
pub mod platform;

pub use collector::SuiteCollector;
pub use decode::{decode, encode};
pub use discovery::{discover, discover_sorted, DEFAULT_FIXTURE_SUFFIX};
pub use flatten::flatten;
pub use harness::Harness;
pub use headless::{FixtureExecutor, HeadlessConfig, HeadlessRunner, RawOutput};
pub use platform::Platform;
