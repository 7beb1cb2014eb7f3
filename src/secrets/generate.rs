//! Random values for secrets created without an explicit value.

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

/// Length of generated secret values.
pub const GENERATED_SECRET_LENGTH: usize = 32;

/// Generate an alphanumeric secret from the OS random number generator.
pub fn generate_secret_value() -> String {
    OsRng.sample_iter(&Alphanumeric).take(GENERATED_SECRET_LENGTH).map(char::from).collect()
}
