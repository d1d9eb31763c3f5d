//! Server-rendered page templates.

/// Viewer bootstrap page.
///
/// The browser-side viewer reads everything it needs from the `data-`
/// attributes of `#folio-viewer`. This page is the only response that ever
/// carries a token secret.
///
/// Placeholders (all HTML-escaped before substitution):
/// - `{title}` - Document filename shown in the title
/// - `{filename}` - Document filename
/// - `{token}` - Capability token id
/// - `{secret}` - Base64 codec secret for the token
/// - `{entitlement}` - `full` or `preview`
/// - `{content_url}` - Gateway endpoint the viewer fetches from
pub const VIEWER_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="referrer" content="no-referrer">
<meta name="robots" content="noindex, nofollow">
<title>{title}</title>
</head>
<body>
<div id="folio-viewer"
     data-filename="{filename}"
     data-token="{token}"
     data-secret="{secret}"
     data-entitlement="{entitlement}"
     data-content-url="{content_url}"></div>
<noscript>This document viewer requires JavaScript.</noscript>
</body>
</html>
"#;

/// Values rendered into [`VIEWER_PAGE`].
pub struct ViewerPage<'a> {
    pub filename: &'a str,
    pub token: &'a str,
    pub secret: &'a str,
    pub entitlement: &'a str,
    pub content_url: &'a str,
}

/// Escape a string for safe use in HTML content and quoted attributes.
///
/// Braces are escaped too so substituted values can never form a
/// placeholder for a later substitution.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}

/// Render the viewer page.
pub fn render_viewer(page: &ViewerPage<'_>) -> String {
    let filename = escape_html(page.filename);
    VIEWER_PAGE
        .replace("{title}", &filename)
        .replace("{filename}", &filename)
        .replace("{token}", &escape_html(page.token))
        .replace("{secret}", &escape_html(page.secret))
        .replace("{entitlement}", &escape_html(page.entitlement))
        .replace("{content_url}", &escape_html(page.content_url))
}
