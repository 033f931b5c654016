use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Holds the process env lock for one test. The listed keys start unset and
/// get their prior values back when the scope drops.
pub struct EnvScope {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvScope {
    pub fn new(keys: &[&'static str]) -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let saved = keys
            .iter()
            .map(|&key| {
                let prior = std::env::var(key).ok();
                std::env::remove_var(key);
                (key, prior)
            })
            .collect();
        Self { saved, _lock: lock }
    }

    pub fn set(&mut self, key: &'static str, value: &str) {
        assert!(
            self.saved.iter().any(|(k, _)| *k == key),
            "{key} is outside this env scope"
        );
        std::env::set_var(key, value);
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        for (key, prior) in self.saved.drain(..) {
            match prior {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}
