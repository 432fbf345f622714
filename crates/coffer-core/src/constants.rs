/// Upper bound for a single entry payload (plaintext).
pub const MAX_DATA_SIZE: usize = 1024 * 1024;

pub const MAX_KEY_LEN: usize = 255;

/// Infix of keys produced by conflict forks: `{key}_conflict_{version}_{suffix}`.
pub const CONFLICT_MARKER: &str = "_conflict_";

pub const MIN_PASSWORD_LEN: usize = 8;
