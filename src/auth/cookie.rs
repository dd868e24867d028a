use axum_extra::extract::cookie::Cookie;

/// Name of the HTTP-only cookie carrying the identity token
pub const TOKEN_COOKIE: &str = "token";

/// Cookie that establishes a session. HTTP-only so page scripts never see the
/// token; `secure` follows configuration and is off by default.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .build()
}

/// Expired, empty `token` cookie with the same path as [`session_cookie`]
pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((TOKEN_COOKIE, "")).path("/").http_only(true).build();
    cookie.make_removal();
    cookie
}
