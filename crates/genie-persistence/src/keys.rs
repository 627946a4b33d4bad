//! Redis key scheme (spec §4.6): `"{app_prefix}:{kind}:{class_name|∅}:{session_id}"`.
//! A direct port of `SessionLockManager._create_key` from
//! `examples/original_source/genie_flow/session_lock.py`: the object key
//! carries the model's class name, the lock and progress keys leave that
//! segment empty (hence the double colon).

pub const SESSION_MODEL_CLASS_NAME: &str = "SessionModel";

pub fn object_key(app_prefix: &str, class_name: &str, session_id: &str) -> String {
    format!("{app_prefix}:object:{class_name}:{session_id}")
}

pub fn lock_key(app_prefix: &str, session_id: &str) -> String {
    format!("{app_prefix}:lock::{session_id}")
}

pub fn progress_key(app_prefix: &str, session_id: &str) -> String {
    format!("{app_prefix}:progress::{session_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_spec_key_scheme() {
        assert_eq!(object_key("genieflow", "SessionModel", "s1"), "genieflow:object:SessionModel:s1");
        assert_eq!(lock_key("genieflow", "s1"), "genieflow:lock::s1");
        assert_eq!(progress_key("genieflow", "s1"), "genieflow:progress::s1");
    }
}
