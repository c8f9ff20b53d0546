use crate::domain_port::RequestContext;
use std::sync::Mutex;
use warp::http::HeaderMap;
use warp::http::header::{COOKIE, HeaderValue, SET_COOKIE};

/// [`RequestContext`] over the headers of a warp request. Tokens attached
/// during the request are kept as `Set-Cookie` values for the response.
pub struct HeaderRequestContext {
    headers: HeaderMap,
    set_cookies: Mutex<Vec<String>>,
}

impl HeaderRequestContext {
    pub fn new(headers: HeaderMap) -> Self {
        HeaderRequestContext {
            headers,
            set_cookies: Mutex::new(Vec::new()),
        }
    }

    fn header_token(&self, token_name: &str) -> Option<String> {
        self.headers
            .get(token_name)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn cookie_token(&self, token_name: &str) -> Option<String> {
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == token_name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Write attached tokens into `headers` as `Set-Cookie`.
    pub fn apply_cookies(&self, headers: &mut HeaderMap) {
        let cookies = match self.set_cookies.lock() {
            Ok(mut lock) => std::mem::take(&mut *lock),
            Err(_) => return,
        };
        for cookie in cookies {
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                headers.append(SET_COOKIE, value);
            }
        }
    }
}

impl RequestContext for HeaderRequestContext {
    fn current_token(&self, token_name: &str) -> Option<String> {
        self.header_token(token_name)
            .or_else(|| self.cookie_token(token_name))
    }

    fn attach_token(&self, token_name: &str, token: &str) {
        if let Ok(mut lock) = self.set_cookies.lock() {
            lock.push(format!("{}={}; Path=/; HttpOnly", token_name, token));
        }
    }
}
