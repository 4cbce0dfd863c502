/// Opaque bearer token generation
///
/// Tokens are 20 bytes from the OS RNG, hex-encoded to 40 lowercase
/// characters. They carry no embedded structure; possession is the whole
/// credential. The value is stored verbatim in `auth_tokens` (see
/// `models::auth_token` for why it is not hashed).
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::token::{generate_token, is_valid_token_format, TOKEN_LENGTH};
///
/// let token = generate_token();
/// assert_eq!(token.len(), TOKEN_LENGTH);
/// assert!(is_valid_token_format(&token));
/// ```

use rand::RngCore;

/// Number of random bytes per token
const TOKEN_BYTES: usize = 20;

/// Length of a token string (hex doubles the byte count)
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Generates a new opaque bearer token
///
/// Uses `rand::thread_rng()` (cryptographically secure); the key space is
/// 2^160.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Checks whether a string is shaped like a token
///
/// A cheap pre-filter before hitting the database: 40 lowercase hex chars.
pub fn is_valid_token_format(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
