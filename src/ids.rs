use rand::Rng;

/// Generates a 24-character hex id for slots, users and history records.
pub fn new_id() -> String {
    random_hex(12)
}

/// Generates an opaque bearer token for the session store.
pub fn new_token() -> String {
    random_hex(24)
}

fn random_hex(bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..bytes).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}
