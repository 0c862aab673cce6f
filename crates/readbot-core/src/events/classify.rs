use url::Url;

/// What one inbound message asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    SaveLink(String),
    Random,
    Remove(String),
    Start,
    Help,
    Unrecognized,
}

/// Classify message text. Links win over command keywords.
pub fn classify(text: &str) -> Event {
    let text = text.trim();
    if let Some(url) = parse_link(text) {
        return Event::SaveLink(url);
    }

    let mut parts = text.splitn(2, char::is_whitespace);
    let keyword = parts.next().map(normalize_keyword).unwrap_or_default();
    let rest = parts.next().unwrap_or("").trim();

    match keyword.as_str() {
        "random" | "rnd" if rest.is_empty() => Event::Random,
        "help" if rest.is_empty() => Event::Help,
        "start" => Event::Start,
        "remove" | "delete" => match parse_link(rest) {
            Some(url) => Event::Remove(url),
            None => Event::Unrecognized,
        },
        _ => Event::Unrecognized,
    }
}

/// An absolute URL with a host, exactly as the user sent it.
///
/// The original text is kept (not `Url`'s normalized form) so the user gets back
/// what they saved.
fn parse_link(text: &str) -> Option<String> {
    if text.is_empty() || text.contains(char::is_whitespace) {
        return None;
    }
    let url = Url::parse(text).ok()?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Some(text.to_string()),
        _ => None,
    }
}

/// `/Random@my_bot` -> `random`.
fn normalize_keyword(word: &str) -> String {
    let word = word.strip_prefix('/').unwrap_or(word);
    let word = word.split('@').next().unwrap_or(word);
    word.to_lowercase()
}
