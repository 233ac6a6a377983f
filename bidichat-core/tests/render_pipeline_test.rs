use bidichat_core::{
    BidiChatConfig, LocaleProvider, MessageRenderer, SafeRenderer, SharedLocale, TextPipeline,
};
use std::sync::Arc;

const LRI: char = '\u{2066}';
const PDI: char = '\u{2069}';

fn renderer() -> MessageRenderer {
    MessageRenderer::from_config(&BidiChatConfig::default())
}

#[test]
fn test_escaped_arabic_with_url_renders_rtl() {
    let html = renderer().render_text("مرحبا \\u0628\\u0643 Github.com/test شكرا");
    assert!(html.starts_with("<div class=\"markdown-body\" dir=\"rtl\">"));
    assert!(html.contains(&format!("مرحبا بك {LRI}Github.com/test{PDI} شكرا")));
    assert!(html.contains("<p dir=\"rtl\">"));
    assert!(!html.contains("\\u0628"));
}

#[test]
fn test_glued_bullet_after_sentence_becomes_list() {
    let html = renderer().render_text("Intro. - item1");
    assert!(html.contains("<p dir=\"ltr\">Intro.</p>"));
    assert!(html.contains("<ul><li dir=\"ltr\">item1</li></ul>"));
}

#[test]
fn test_script_and_event_handlers_are_stripped() {
    let html = renderer().render_text(
        "سلام دنیا\n\n<script>alert(document.cookie)</script>\n\n<b onclick=\"steal()\">پررنگ</b>",
    );
    assert!(!html.contains("<script"));
    assert!(!html.contains("alert"));
    assert!(!html.contains("onclick"));
    assert!(html.contains("<b>پررنگ</b>"));
}

#[test]
fn test_links_are_hardened() {
    let html = renderer().render_text("[سایت](https://example.com) و [بد](javascript:alert(1))");
    assert!(html.contains(
        "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer nofollow\" dir=\"auto\">سایت</a>"
    ));
    assert!(!html.contains("javascript:"));
}

#[test]
fn test_inline_code_is_not_isolated() {
    let html = renderer().render_text("سلام دنیا `print(x)` خداحافظ");
    assert!(html.contains("<code dir=\"ltr\">print(x)</code>"));
}

#[test]
fn test_neutral_content_follows_live_locale() {
    let locale = Arc::new(SharedLocale::new("en"));
    let pipeline = TextPipeline::default();
    let renderer = SafeRenderer::new(*pipeline.classifier(), locale.clone());

    let view = pipeline.run("2024");
    assert!(renderer.render(&view).contains("dir=\"ltr\""));

    locale.set("ar-EG");
    assert_eq!(locale.locale(), "ar-EG");
    assert!(
        renderer
            .render(&view)
            .starts_with("<div class=\"markdown-body\" dir=\"rtl\">")
    );
}

#[test]
fn test_normalized_view_is_stable_under_rerun() {
    let pipeline = TextPipeline::default();
    let samples = [
        "مقدمه. - اول\\n- دوم",
        "مقدمه. - ا. - ب",
        "Intro. - a. - b",
        "x: 1. a2. b3. c",
        "موارد اول2. ب3. ج",
    ];
    for sample in samples {
        let once = pipeline.run(sample);
        let twice = pipeline.run(&once.text);
        assert_eq!(once.text, twice.text, "unstable for {sample:?}");
        assert_eq!(once.is_rtl, twice.is_rtl);
    }
}
