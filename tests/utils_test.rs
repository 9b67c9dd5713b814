use std::collections::HashSet;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use vorplay::utils::*;

#[test]
fn test_generate_session_token() {
    let token = generate_session_token();

    // 32 random bytes encode to 43 base64url characters without padding
    assert_eq!(token.len(), 43);
    assert_eq!(URL_SAFE_NO_PAD.decode(&token).unwrap().len(), SESSION_TOKEN_BYTES);
    assert!(
        token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    );
}

#[test]
fn test_session_tokens_are_unique() {
    let tokens: HashSet<String> = (0..100).map(|_| generate_session_token()).collect();
    assert_eq!(tokens.len(), 100);
}

#[test]
fn test_hash_session_token_is_stable() {
    let token = "test_token_123";
    assert_eq!(hash_session_token(token), hash_session_token(token));
    assert_ne!(hash_session_token(token), hash_session_token("test_token_124"));
    assert_ne!(hash_session_token(token), token);
}

#[test]
fn test_hash_session_token_known_value() {
    // SHA-256("abc"), base64url without padding
    assert_eq!(
        hash_session_token("abc"),
        "ungWv48Bz-pBQUDeXa4iI7ADYaOWF3qctBD_YfIAFa0"
    );
}

#[test]
fn test_join_artist_names() {
    assert_eq!(join_artist_names(["Daft Punk"]), "Daft Punk");
    assert_eq!(
        join_artist_names(["The Weeknd", "Daft Punk"]),
        "The Weeknd, Daft Punk"
    );
    assert_eq!(join_artist_names(Vec::<&str>::new()), "");
}
