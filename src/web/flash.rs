//! One-shot messages carried across a redirect in a short-lived cookie.

use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }

    fn parse(s: &str) -> Option<FlashLevel> {
        match s {
            "success" => Some(FlashLevel::Success),
            "info" => Some(FlashLevel::Info),
            "warning" => Some(FlashLevel::Warning),
            "danger" => Some(FlashLevel::Danger),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Danger, message)
    }

    pub fn css_class(&self) -> &'static str {
        self.level.as_str()
    }
}

/// Queues `message` for the next rendered page.
pub fn push(jar: CookieJar, level: FlashLevel, message: &str) -> CookieJar {
    let mut value = jar
        .get(FLASH_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap_or_default();
    if !value.is_empty() {
        value.push('&');
    }
    value.push_str(&encode(&Flash::new(level, message)));

    jar.add(
        Cookie::build((FLASH_COOKIE, value))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(cookie::time::Duration::minutes(5))
            .build(),
    )
}

/// Reads and clears the queued messages.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, Vec::new());
    };

    let flashes = decode(cookie.value());
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, flashes)
}

fn encode(flash: &Flash) -> String {
    format!("{}:{}", flash.level.as_str(), urlencoding::encode(&flash.message))
}

fn decode(value: &str) -> Vec<Flash> {
    value
        .split('&')
        .filter_map(|entry| {
            let (level, message) = entry.split_once(':')?;
            let level = FlashLevel::parse(level)?;
            let message = urlencoding::decode(message).ok()?;
            Some(Flash::new(level, message.into_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_messages_are_read_back_in_order() {
        let jar = push(CookieJar::new(), FlashLevel::Success, "Your notice has been posted!");
        let jar = push(jar, FlashLevel::Info, "A & B: done; 100%");

        let (jar, flashes) = take(jar);
        assert_eq!(flashes, vec![
            Flash::new(FlashLevel::Success, "Your notice has been posted!"),
            Flash::new(FlashLevel::Info, "A & B: done; 100%"),
        ]);
        assert!(jar.get(FLASH_COOKIE).map_or(true, |c| c.value().is_empty()));
    }

    #[test]
    fn tampered_entries_are_skipped() {
        let flashes = decode("bogus:hello&info:ok&nocolon");
        assert_eq!(flashes, vec![Flash::new(FlashLevel::Info, "ok")]);
    }
}
