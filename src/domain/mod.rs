pub mod capture_policy;
pub mod resolver;
pub mod rule_engine;
pub mod trial;

pub use resolver::{resolve_open_path, OpenPath};
pub use rule_engine::RuleEngine;
