use pulldown_cmark::{html, Options, Parser};

/// Separates the general description of a pull request from its release notes.
pub(crate) const RELEASE_MARKER: &str = "## Release notes";

/// Pull the release notes out of a pull request `body`.
///
/// The body is split on every `marker` and the notes are the last piece, so quoting an earlier
/// description that contains the marker doesn't matter. Without a marker (or a body) the result
/// is `fallback`. The text comes back as raw markdown.
pub(crate) fn extract_notes(body: Option<&str>, marker: &str, fallback: &str) -> String {
    body.filter(|body| body.contains(marker))
        .and_then(|body| body.split(marker).last())
        .unwrap_or(fallback)
        .to_string()
}

/// Markdown notes as HTML, with entities decoded for both the document and the email.
pub(crate) fn render_content(notes: &str) -> String {
    if notes.is_empty() {
        return String::new();
    }
    decode_entities(&render_markdown(notes))
}

fn render_markdown(notes: &str) -> String {
    let parser = Parser::new_ext(
        notes,
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
    );
    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);
    rendered
}

pub(crate) fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
