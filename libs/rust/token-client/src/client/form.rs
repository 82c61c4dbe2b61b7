//! `application/x-www-form-urlencoded` grant bodies.

use url::form_urlencoded::Serializer;

/// `grant_type` for the client-credentials grant.
pub const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";
/// `grant_type` for RFC 8693 token exchange.
pub const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
/// `client_assertion_type` for RFC 7523 JWT client authentication.
pub const JWT_BEARER_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
/// Scope requested on token exchange.
pub const EXCHANGE_SCOPE: &str = "openid";

/// Client-credentials grant authenticated with `assertion`.
pub fn client_credentials(client_id: &str, assertion: &str) -> String {
    Serializer::new(String::new())
        .append_pair("grant_type", CLIENT_CREDENTIALS_GRANT)
        .append_pair("client_assertion_type", JWT_BEARER_ASSERTION_TYPE)
        .append_pair("client_assertion", assertion)
        .append_pair("client_id", client_id)
        .finish()
}

/// Token exchange of `subject_token` for `requested_subject`, authenticated
/// as `client_id`.
pub fn token_exchange(
    subject_token: &str,
    requested_subject: &str,
    client_id: &str,
    assertion: &str,
) -> String {
    Serializer::new(String::new())
        .append_pair("subject_token", subject_token)
        .append_pair("requested_subject", requested_subject)
        .append_pair("client_id", client_id)
        .append_pair("grant_type", TOKEN_EXCHANGE_GRANT)
        .append_pair("scope", EXCHANGE_SCOPE)
        .append_pair("client_assertion_type", JWT_BEARER_ASSERTION_TYPE)
        .append_pair("client_assertion", assertion)
        .finish()
}
