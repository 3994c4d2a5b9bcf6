pub mod merger;

pub use merger::{
    assert_valid_config, assert_valid_keys, hoist_wildcard, merge, ConfigMap, WILDCARD,
};
