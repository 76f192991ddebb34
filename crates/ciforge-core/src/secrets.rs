//! Generated credentials for fresh deployments.

/// Random bytes behind each generated password (hex doubles the length).
const PASSWORD_BYTES: usize = 10;

/// Generate a random lowercase alphanumeric password.
pub fn generate_password() -> Result<String, getrandom::Error> {
    let mut buf = [0u8; PASSWORD_BYTES];
    getrandom::getrandom(&mut buf)?;
    Ok(hex::encode(buf))
}
