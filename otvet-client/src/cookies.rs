//! Cookie jar helpers.
//!
//! The portal session rides on two cookies: `Mpop`, the SSO ticket issued by
//! the auth endpoint for the whole parent domain, and `ot`, the signing token
//! scoped to the Q&A host. reqwest's [`Jar`] manages them during requests;
//! these helpers read values back out and seed a saved SSO ticket into a
//! fresh jar.

use reqwest::cookie::{CookieStore, Jar};
use url::{Host, Url};

/// SSO ticket cookie shared by the portal's services.
pub(crate) const SSO_COOKIE: &str = "Mpop";

/// Signing token cookie set by the Q&A host.
pub(crate) const TOKEN_COOKIE: &str = "ot";

/// Value of a cookie the jar would send to `url`, if any.
pub(crate) fn cookie_value(jar: &Jar, url: &Url, name: &str) -> Option<String> {
    let header = jar.cookies(url)?;
    let header = header.to_str().ok()?;
    header.split("; ").find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_owned())
    })
}

/// Registrable parent domain the SSO ticket should cover.
///
/// For the production host this is `mail.ru`, so that the ticket reaches both
/// the auth endpoint and the Q&A host. IP addresses and hosts without a
/// usable parent get `None`; the ticket then stays host-only, which is what
/// mock servers in tests need.
pub(crate) fn sso_domain(base: &Url) -> Option<String> {
    match base.host()? {
        Host::Domain(host) => {
            let (_, parent) = host.split_once('.')?;
            parent.contains('.').then(|| parent.to_owned())
        }
        _ => None,
    }
}

/// Seeds a saved SSO ticket into the jar.
pub(crate) fn install_sso_cookie(jar: &Jar, base: &Url, value: &str) {
    let cookie = match sso_domain(base) {
        Some(domain) => format!("{SSO_COOKIE}={value}; Domain=.{domain}; Path=/"),
        None => format!("{SSO_COOKIE}={value}; Path=/"),
    };
    jar.add_cookie_str(&cookie, base);
}
