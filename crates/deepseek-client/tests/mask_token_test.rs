//! Unit tests for [`deepseek_client::mask_token`].
//!
//! Session tokens are masked for safe logging: first 7 chars + `***` + last 4 chars.
//! Tokens of length ≤ 11 are fully masked as `***` to avoid leaking any segment.

use deepseek_client::mask_token;

/// **Test: Short or empty tokens are fully masked.**
#[test]
fn mask_token_short_returns_all_star() {
    assert_eq!(mask_token(""), "***");
    assert_eq!(mask_token("a"), "***");
    assert_eq!(mask_token("tok-1234"), "***");
    assert_eq!(mask_token("abcdefghijk"), "***");
}

/// **Test: Long tokens show first 7 and last 4 characters.**
#[test]
fn mask_token_long_shows_head_and_tail() {
    assert_eq!(mask_token("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJhbGc***load");
    assert_eq!(mask_token("abcdefghijkl"), "abcdefg***ijkl");
}

/// **Test: Non-ASCII tokens never panic on a char boundary.**
#[test]
fn mask_token_non_ascii_does_not_panic() {
    let masked = mask_token("ééééééééééééé");
    assert!(masked.contains("***"));
}
