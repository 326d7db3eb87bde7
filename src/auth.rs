//! Access gate: opaque bearer tokens mapped to resolved caller identities.
//! Token issuance happens at login/registration; every lifecycle route
//! resolves its caller through here before touching the ledger.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::ids;
use crate::ledger::Caller;

pub struct SessionStore {
    tokens: Mutex<HashMap<String, Caller>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a fresh bearer token for the caller.
    pub fn issue(&self, caller: Caller) -> String {
        let token = ids::new_token();
        self.tokens.lock().unwrap().insert(token.clone(), caller);
        token
    }

    /// Resolves a bearer token back to the caller it was issued for.
    pub fn resolve(&self, token: &str) -> Option<Caller> {
        self.tokens.lock().unwrap().get(token).cloned()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
