//! Masking of secrets in diagnostic output.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static FORM_SECRET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(password|client_secret)=[^\s&]+").expect("Invalid regex pattern"));

static JSON_SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(access_token|refresh_token|password|client_secret)"\s*:\s*"[^"]*""#)
        .expect("Invalid regex pattern")
});

static BEARER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(Bearer) [^\s,]+").expect("Invalid regex pattern"));

/// Replaces password-bearing and token-bearing substrings with `******`.
///
/// Covers form fields (`password=...`, `client_secret=...`), JSON members
/// (`"access_token":"..."` and friends) and bearer header values. Apply it
/// to anything from the token exchange before it is logged.
///
/// # Example
///
/// ```
/// use fortify_lib::auth::mask_secrets;
///
/// assert_eq!(
///     mask_secrets("grant_type=password&username=jdoe&password=s3cret"),
///     "grant_type=password&username=jdoe&password=******"
/// );
/// ```
pub fn mask_secrets(text: &str) -> Cow<'_, str> {
    let rules: [(&Regex, &str); 3] = [
        (&*FORM_SECRET, "${1}=******"),
        (&*JSON_SECRET, r#""${1}":"******""#),
        (&*BEARER, "${1} ******"),
    ];

    let mut result = Cow::Borrowed(text);
    for (pattern, replacement) in rules {
        if pattern.is_match(&result) {
            let replaced = pattern.replace_all(&result, replacement).into_owned();
            result = Cow::Owned(replaced);
        }
    }
    result
}
