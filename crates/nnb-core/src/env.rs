//! Environment overrides for configuration.
//!
//! ```ignore
//! use nnb_core::env::{env_get, env_get_bool};
//!
//! let capacity: usize = env_get("NNB_EVENTS_CAPACITY", 256);
//! let subscribe_all = env_get_bool("NNB_SUBSCRIBE_ALL", true);
//! ```

use std::str::FromStr;

/// Parse `key` as `T`; unset or unparsable values yield `default`.
#[inline]
pub fn env_get<T: FromStr>(key: &str, default: T) -> T {
    env_get_opt(key).unwrap_or(default)
}

/// `Some(T)` when `key` is set and parses.
#[inline]
pub fn env_get_opt<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Boolean switch: `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`
/// (case-insensitive). Anything else, or unset, yields `default`.
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn unset_falls_back() {
        let v: usize = env_get("__NNB_TEST_UNSET__", 7);
        assert_eq!(v, 7);
        assert!(env_get_bool("__NNB_TEST_UNSET__", true));
        assert_eq!(env_get_opt::<u32>("__NNB_TEST_UNSET__"), None);
    }

    #[test]
    #[serial]
    fn parses_and_rejects() {
        std::env::set_var("__NNB_TEST_NUM__", " 512 ");
        assert_eq!(env_get("__NNB_TEST_NUM__", 0usize), 512);
        std::env::set_var("__NNB_TEST_NUM__", "lots");
        assert_eq!(env_get("__NNB_TEST_NUM__", 3usize), 3);
        std::env::remove_var("__NNB_TEST_NUM__");
    }

    #[test]
    #[serial]
    fn bool_garbage_keeps_default() {
        std::env::set_var("__NNB_TEST_BOOL__", "Off");
        assert!(!env_get_bool("__NNB_TEST_BOOL__", true));
        std::env::set_var("__NNB_TEST_BOOL__", "maybe");
        assert!(env_get_bool("__NNB_TEST_BOOL__", true));
        std::env::remove_var("__NNB_TEST_BOOL__");
    }
}
