//! TwiML rendering
//!
//! Turns a provider-neutral `VoiceScript` into the XML document Twilio
//! executes on a live call.

use std::fmt::Write;

use axum::http::header;
use axum::response::{IntoResponse, Response};

use bluebuddy::{VoiceInstruction, VoiceScript};

pub fn render(script: &VoiceScript) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
    for instruction in &script.instructions {
        // Writing into a String cannot fail
        let _ = match instruction {
            VoiceInstruction::Say { text, voice } => match voice {
                Some(voice) => write!(
                    xml,
                    r#"<Say voice="{}">{}</Say>"#,
                    escape(voice),
                    escape(text)
                ),
                None => write!(xml, "<Say>{}</Say>", escape(text)),
            },
            VoiceInstruction::GatherSpeech {
                timeout_secs,
                action_url,
            } => write!(
                xml,
                r#"<Gather input="speech" timeout="{}" speechTimeout="auto" bargeIn="true" action="{}" method="POST"/>"#,
                timeout_secs,
                escape(action_url)
            ),
            VoiceInstruction::Redirect { url } => {
                write!(xml, r#"<Redirect method="POST">{}</Redirect>"#, escape(url))
            }
            VoiceInstruction::Hangup => write!(xml, "<Hangup/>"),
        };
    }
    xml.push_str("</Response>");
    xml
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// TwiML response body
pub struct Twiml(pub VoiceScript);

impl IntoResponse for Twiml {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, "application/xml")],
            render(&self.0),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_answer_document() {
        let script = VoiceScript::new()
            .say("Hello Jane! This is Blue Buddy calling to check in!", Some("alice"))
            .gather_speech(5, "https://buddy.example/voice/1/speech")
            .redirect("https://buddy.example/voice/1/answer");

        assert_eq!(
            render(&script),
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#,
                r#"<Say voice="alice">Hello Jane! This is Blue Buddy calling to check in!</Say>"#,
                r#"<Gather input="speech" timeout="5" speechTimeout="auto" bargeIn="true" action="https://buddy.example/voice/1/speech" method="POST"/>"#,
                r#"<Redirect method="POST">https://buddy.example/voice/1/answer</Redirect>"#,
                "</Response>"
            )
        );
    }

    #[test]
    fn test_render_hang_up() {
        let script = VoiceScript::new().say("Goodbye", None).hangup();
        assert!(render(&script).ends_with("<Say>Goodbye</Say><Hangup/></Response>"));
    }

    #[test]
    fn test_spoken_text_is_escaped() {
        let script = VoiceScript::new().say("Salt & pepper <b>\"now\"</b>", None);
        assert!(render(&script)
            .contains("<Say>Salt &amp; pepper &lt;b&gt;&quot;now&quot;&lt;/b&gt;</Say>"));
    }
}
