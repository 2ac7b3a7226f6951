use proptest::prelude::*;
use richmark::{is_safe, parse_from_markdown, render_to_markdown, sanitize, AllowListPolicy};

const HTML_PIECES: &str = concat!(
    r#"(<p>|</p>|<b>|</b>|<em>|</em>|<ul>|<li>|</li>|</ul>|<script>|</script>|<style>|"#,
    r#"<a href="|<a href='|<img src=|" |' |>|<|/|=|&amp;|&lt;|&#58;|&|javascript:|"#,
    r#"onclick=|https://x.io/|#top|<!--|-->|<table><tr><td>|<pre><code>|[a-z ]|\n)*"#,
);

const MARKDOWN_PIECES: &str = concat!(
    r#"(\*\*|\*|_|~~|`|\[|\]|\(|\)|!|# |> |- |1\. |- \[x\] |```|\n|\\|"#,
    r#"javascript:|<script>|onerror=|<img src=x |&#58;|eval\(|https://x.io|/p|[a-z ])*"#,
);

fn inline_run() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[a-z]{1,6}",
        "[a-z]{1,6}".prop_map(|w| format!("<strong>{w}</strong>")),
        "[a-z]{1,6}".prop_map(|w| format!("<em>{w}</em>")),
        "[a-z]{1,6}".prop_map(|w| format!("<s>{w}</s>")),
        "[a-z]{1,6}".prop_map(|w| format!("<code>{w}</code>")),
    ];
    prop::collection::vec((piece, any::<bool>()), 1..6).prop_map(|pieces| {
        let mut html = String::new();
        for (i, (piece, spaced)) in pieces.iter().enumerate() {
            if i > 0 && *spaced {
                html.push(' ');
            }
            html.push_str(piece);
        }
        html
    })
}

fn list_item() -> impl Strategy<Value = String> {
    (inline_run(), any::<Option<bool>>()).prop_map(|(content, task)| match task {
        Some(checked) => {
            format!(r#"<li data-type="taskItem" data-checked="{checked}">{content}</li>"#)
        }
        None => format!("<li>{content}</li>"),
    })
}

/// A paragraph, heading or quote, optionally followed by a list
fn section() -> impl Strategy<Value = String> {
    let lead = prop_oneof![
        inline_run().prop_map(|content| format!("<p>{content}</p>")),
        (1u8..=6, inline_run())
            .prop_map(|(level, content)| format!("<h{level}>{content}</h{level}>")),
        inline_run().prop_map(|content| format!("<blockquote><p>{content}</p></blockquote>")),
    ];
    let list = prop::option::of((any::<bool>(), prop::collection::vec(list_item(), 1..5)));
    (lead, list).prop_map(|(lead, list)| match list {
        Some((ordered, items)) => {
            let tag = if ordered { "ol" } else { "ul" };
            format!("{lead}<{tag}>{}</{tag}>", items.concat())
        }
        None => lead,
    })
}

proptest! {
    #[test]
    fn sanitize_is_idempotent(html in HTML_PIECES) {
        let policy = AllowListPolicy::default();
        let once = sanitize(&html, &policy);
        prop_assert_eq!(sanitize(&once, &policy), once);
    }

    #[test]
    fn sanitized_html_is_safe(html in HTML_PIECES) {
        let clean = sanitize(&html, &AllowListPolicy::default());
        prop_assert!(is_safe(clean.as_str()), "{}", clean);
    }

    #[test]
    fn parsed_markdown_is_safe(markdown in MARKDOWN_PIECES) {
        let html = parse_from_markdown(markdown.as_str());
        let lower = html.to_lowercase();
        prop_assert!(!lower.contains("<script"), "{}", html);
        prop_assert!(!lower.contains("javascript:"), "{}", html);
        prop_assert!(is_safe(html.as_str()), "{}", html);
    }

    #[test]
    fn rendered_markdown_parses_back_safely(html in HTML_PIECES) {
        let markdown = render_to_markdown(html.as_str());
        let reparsed = parse_from_markdown(markdown.as_str());
        prop_assert!(is_safe(reparsed.as_str()), "{}", reparsed);
    }

    #[test]
    fn rendered_markdown_is_a_fixed_point(sections in prop::collection::vec(section(), 1..4)) {
        let html = sections.concat();
        let markdown = render_to_markdown(html.as_str());
        let reparsed = parse_from_markdown(markdown.as_str());
        prop_assert_eq!(render_to_markdown(reparsed.as_str()), markdown, "html: {}", html);
    }
}
