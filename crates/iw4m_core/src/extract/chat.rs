use serde::Serialize;

use super::nodes_text;
use crate::document::Document;

mod selectors {
    pub const LINE: &str = "div.text-truncate";
    pub const SPAN: &str = "span";
    pub const COLORCODE: &str = "colorcode";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatLine {
    pub origin: String,
    pub message: String,
}

/// Recent chat from the home page. The first span of a line names the
/// speaker and the second carries the message; lines missing either are
/// dropped.
pub fn chat_lines(document: &Document) -> Vec<ChatLine> {
    document
        .find(selectors::LINE)
        .iter()
        .filter_map(|line| {
            let spans = line.find(selectors::SPAN);
            let colored = |index| {
                spans
                    .nth(index)
                    .map(|span| nodes_text(&span.find(selectors::COLORCODE)))
                    .unwrap_or_default()
            };
            let origin = colored(0);
            let message = colored(1);
            (!origin.is_empty() && !message.is_empty()).then_some(ChatLine { origin, message })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_lines_with_speaker_and_message() {
        let document = Document::parse(
            r#"
<div class="text-truncate"><span><colorcode>^1Rex</colorcode></span> &mdash; <span><colorcode>gg  all</colorcode></span></div>
<div class="text-truncate"><span><colorcode>Quiet</colorcode></span></div>
<div class="text-truncate"><span>no tag</span><span><colorcode>orphan</colorcode></span></div>
<div class="text-truncate"><span><colorcode>Nova</colorcode></span><span><colorcode> !rules </colorcode></span></div>
"#,
        )
        .expect("parse");

        assert_eq!(
            chat_lines(&document),
            vec![
                ChatLine {
                    origin: "^1Rex".to_string(),
                    message: "gg all".to_string()
                },
                ChatLine {
                    origin: "Nova".to_string(),
                    message: "!rules".to_string()
                },
            ]
        );
    }

    #[test]
    fn empty_page_has_no_chat() {
        let document = Document::parse("<body></body>").expect("parse");
        assert!(chat_lines(&document).is_empty());
    }
}
