//! Message rendering: Markdown to HTML, with syntax colouring for fenced
//! code blocks.
//!
//! Raw HTML in message text is never passed through; it is escaped like
//! any other text.  Link and image targets are kept only for `http`,
//! `https`, `mailto` and scheme-less (relative) URLs; any other target is
//! replaced with `#`.

use coderchat_shared::constants::CODE_FENCE;
use lazy_static::lazy_static;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

const THEME: &str = "base16-ocean.dark";
const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

lazy_static! {
    static ref SYNTAX_SET: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEME_SET: ThemeSet = ThemeSet::load_defaults();
}

/// Render message text to an HTML fragment.
///
/// Fenced code blocks are syntax-coloured only when the text contains a
/// fence delimiter; everything else is plain formatted Markdown.
pub fn render_content(text: &str) -> String {
    let highlight = text.contains(CODE_FENCE);
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);

    let mut events: Vec<Event<'_>> = Vec::new();
    // Open fenced block: its info string and the code collected so far.
    let mut fenced: Option<(CowStr<'_>, String)> = None;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) if highlight => {
                fenced = Some((info, String::new()));
            }
            Event::Text(chunk) if fenced.is_some() => {
                if let Some((_, code)) = fenced.as_mut() {
                    code.push_str(&chunk);
                }
            }
            Event::End(TagEnd::CodeBlock) => match fenced.take() {
                Some((info, code)) => events.extend(highlight_block(info, code)),
                None => events.push(Event::End(TagEnd::CodeBlock)),
            },
            Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => events.push(Event::Start(Tag::Link {
                link_type,
                dest_url: safe_url(dest_url),
                title,
                id,
            })),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => events.push(Event::Start(Tag::Image {
                link_type,
                dest_url: safe_url(dest_url),
                title,
                id,
            })),
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(text.len() * 2);
    html::push_html(&mut out, events.into_iter());
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let Some((scheme, _)) = url.split_once(':') else {
        return url;
    };
    // A colon after a path, query or fragment delimiter is not a scheme.
    if scheme.contains(|c| matches!(c, '/' | '?' | '#')) {
        return url;
    }

    // Browsers ignore whitespace and control characters inside a scheme.
    let scheme: String = scheme
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if SAFE_SCHEMES.contains(&scheme.as_str()) {
        url
    } else {
        tracing::debug!(scheme = %scheme, "dropping link with unsafe scheme");
        CowStr::Borrowed("#")
    }
}

fn highlight_block<'a>(info: CowStr<'a>, code: String) -> Vec<Event<'a>> {
    let lang = info.split_whitespace().next().unwrap_or("");
    let syntax = SYNTAX_SET
        .find_syntax_by_token(lang)
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

    let highlighted = THEME_SET
        .themes
        .get(THEME)
        .ok_or_else(|| format!("theme {THEME} missing"))
        .and_then(|theme| {
            highlighted_html_for_string(&code, &SYNTAX_SET, syntax, theme)
                .map_err(|e| e.to_string())
        });

    match highlighted {
        Ok(html) => vec![Event::Html(html.into())],
        Err(e) => {
            tracing::warn!(error = %e, lang, "syntax highlighting failed, rendering plain");
            vec![
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))),
                Event::Text(code.into()),
                Event::End(TagEnd::CodeBlock),
            ]
        }
    }
}
