//! Cookie parsing and the session jar used to keep request state across
//! the crawl.
//!
//! Cookies are keyed by `(name, domain)`, with `*` acting as a wildcard
//! domain and reversed-suffix matching used for subdomain lookups.

mod cookie;
mod jar;

pub use cookie::Cookie;
pub use jar::CookieJar;
