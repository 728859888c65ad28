//! XSS filter applied to user-supplied text before it leaves the service.
//!
//! Tags on the whitelist survive with only their whitelisted attributes;
//! every other tag is escaped into inert text. Comments are dropped and
//! stray angle brackets in text are escaped. Running the filter on its own
//! output returns the same string.

const WHITELIST: &[(&str, &[&str])] = &[
    ("a", &["target", "href", "title"]),
    ("abbr", &["title"]),
    ("b", &[]),
    ("blockquote", &["cite"]),
    ("br", &[]),
    ("code", &[]),
    ("del", &["datetime"]),
    ("div", &[]),
    ("em", &[]),
    ("h1", &[]),
    ("h2", &[]),
    ("h3", &[]),
    ("h4", &[]),
    ("h5", &[]),
    ("h6", &[]),
    ("hr", &[]),
    ("i", &[]),
    ("img", &["src", "alt", "title", "width", "height"]),
    ("li", &[]),
    ("ol", &[]),
    ("p", &[]),
    ("pre", &[]),
    ("small", &[]),
    ("span", &[]),
    ("strong", &[]),
    ("sub", &[]),
    ("sup", &[]),
    ("u", &[]),
    ("ul", &[]),
];

const SAFE_URL_PREFIXES: &[&str] = &[
    "http://",
    "https://",
    "mailto:",
    "tel:",
    "data:image/",
    "#",
    "/",
    "./",
    "../",
];

pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        push_text(&mut out, &rest[..lt]);
        let candidate = &rest[lt..];

        if let Some(comment) = candidate.strip_prefix("<!--") {
            if let Some(end) = comment.find("-->") {
                rest = &comment[end + 3..];
                continue;
            }
        }

        match tag_end(candidate) {
            Some(end) => {
                out.push_str(&filter_tag(&candidate[..=end]));
                rest = &candidate[end + 1..];
            }
            None => {
                out.push_str("&lt;");
                rest = &candidate[1..];
            }
        }
    }

    push_text(&mut out, rest);
    out
}

pub fn sanitize_opt(input: Option<&str>) -> String {
    input.map(sanitize).unwrap_or_default()
}

fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_text(&mut out, text);
    out
}

/// Byte offset of the `>` closing the tag that `s` starts with, if `s`
/// starts with something shaped like a tag.
fn tag_end(s: &str) -> Option<usize> {
    let looks_like_tag = match s[1..].chars().next() {
        Some('/') => s[2..].chars().next().is_some_and(|c| c.is_ascii_alphabetic()),
        Some(c) => c.is_ascii_alphabetic(),
        None => false,
    };
    if !looks_like_tag {
        return None;
    }

    let mut quote = None;
    for (i, c) in s.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return Some(i),
                '<' => return None,
                _ => {}
            },
        }
    }
    None
}

fn allowed_attributes(tag: &str) -> Option<&'static [&'static str]> {
    WHITELIST
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, attrs)| *attrs)
}

fn filter_tag(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let (closing, body) = match inner.strip_prefix('/') {
        Some(body) => (true, body),
        None => (false, inner),
    };
    let name_end = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    let name = body[..name_end].to_ascii_lowercase();

    let Some(allowed) = allowed_attributes(&name) else {
        return escape_text(raw);
    };
    if closing {
        return format!("</{}>", name);
    }

    let attrs_src = &body[name_end..];
    let mut out = format!("<{}", name);
    for (attr, value) in parse_attrs(attrs_src) {
        if !allowed.contains(&attr.as_str()) {
            continue;
        }
        match value {
            None => {
                out.push(' ');
                out.push_str(&attr);
            }
            Some(value) => {
                let value = decode_attr(&value);
                if is_url_attr(&attr) && !is_safe_url(&value) {
                    continue;
                }
                out.push_str(&format!(" {}=\"{}\"", attr, escape_attr(&value)));
            }
        }
    }
    if attrs_src.trim_end().ends_with('/') {
        out.push_str(" /");
    }
    out.push('>');
    out
}

fn parse_attrs(src: &str) -> Vec<(String, Option<String>)> {
    let mut attrs = Vec::new();
    let mut rest = src;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }

        let name_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start_matches(|c: char| c.is_ascii_whitespace());

        let Some(after_eq) = rest.strip_prefix('=') else {
            if !name.is_empty() {
                attrs.push((name, None));
            }
            continue;
        };

        let after_eq = after_eq.trim_start_matches(|c: char| c.is_ascii_whitespace());
        let (value, remaining) = match after_eq.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let quoted = &after_eq[1..];
                match quoted.find(q) {
                    Some(end) => (&quoted[..end], &quoted[end + 1..]),
                    None => (quoted, ""),
                }
            }
            _ => {
                let end = after_eq
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            }
        };

        if !name.is_empty() {
            attrs.push((name, Some(value.to_string())));
        }
        rest = remaining;
    }

    attrs
}

fn is_url_attr(attr: &str) -> bool {
    matches!(attr, "href" | "src" | "cite")
}

fn is_safe_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    !compact.is_empty() && SAFE_URL_PREFIXES.iter().any(|p| compact.starts_with(p))
}

fn decode_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

fn escape_attr(value: &str) -> String {
    value
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
