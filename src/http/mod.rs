pub mod dispatcher;
pub mod transport;

use reqwest::header::{HeaderMap, SET_COOKIE};

/// Collapse `Set-Cookie` response headers into a single `Cookie` line
/// (`name=value` pairs before the first `;`, joined with `"; "`).
///
/// Used by embedders that persist a session across processes, where the
/// in-memory cookie store does not survive. Returns `None` when the
/// response set no cookies.
pub fn cookie_line(headers: &HeaderMap) -> Option<String> {
    let mut pairs: Vec<String> = Vec::new();
    for val in headers.get_all(SET_COOKIE).iter() {
        if let Ok(s) = val.to_str() {
            let nv = s.split_once(';').map(|(nv, _)| nv).unwrap_or(s);
            if !nv.trim().is_empty() {
                pairs.push(nv.trim().to_string());
            }
        }
    }
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn collapses_set_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("himmel_session=abc; Path=/; HttpOnly"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("csrf=xyz; Path=/"));
        assert_eq!(
            cookie_line(&headers).as_deref(),
            Some("himmel_session=abc; csrf=xyz")
        );
    }

    #[test]
    fn no_cookies_is_none() {
        assert_eq!(cookie_line(&HeaderMap::new()), None);
    }
}
