//! Property tests for CLI output normalisation

use netinv_core::text;
use proptest::prelude::*;

/// Printable device output lines without control characters
fn line_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 :./()-]{0,40}"
}

proptest! {
    /// Property: Cleaned output contains no escape, CR or backspace bytes
    #[test]
    fn clean_output_strips_control_sequences(
        lines in prop::collection::vec(line_strategy(), 0..10),
        color in 30u8..38,
    ) {
        let raw = lines
            .iter()
            .map(|l| format!("\x1b[{color}m{l} \x08\x1b[0m\r"))
            .collect::<Vec<_>>()
            .join("\n");
        let cleaned = text::clean_output(&raw);

        prop_assert!(!cleaned.contains('\x1b'));
        prop_assert!(!cleaned.contains('\r'));
        prop_assert!(!cleaned.contains('\x08'));
    }

    /// Property: Cleaning twice changes nothing
    #[test]
    fn clean_output_is_idempotent(raw in "[ -~\r\n]{0,200}") {
        let once = text::clean_output(&raw);
        prop_assert_eq!(text::clean_output(&once), once.clone());
    }

    /// Property: Plain lines survive cleaning apart from trailing spaces
    #[test]
    fn clean_output_keeps_plain_text(lines in prop::collection::vec(line_strategy(), 1..10)) {
        let raw = lines.join("\n");
        let expected = lines.iter().map(|l| l.trim_end()).collect::<Vec<_>>().join("\n");
        prop_assert_eq!(text::clean_output(&raw), expected);
    }

    /// Property: The echoed command never stays in the body
    #[test]
    fn split_response_drops_echo(
        body in prop::collection::vec("[a-z0-9 :]{1,30}", 0..5),
        hostname in "[a-z][a-z0-9-]{0,15}",
    ) {
        let command = "show version";
        let output = format!("{hostname}#{command}\n{}\n{hostname}#", body.join("\n"));
        let (text_body, prompt) = text::split_response(&output, command);

        prop_assert_eq!(prompt, format!("{hostname}#"));
        prop_assert!(!text_body.lines().any(|l| l.ends_with(command)));
    }

    /// Property: Ordinary output is never mistaken for a CLI rejection
    #[test]
    fn plain_output_is_not_cli_error(lines in prop::collection::vec("[A-Za-z0-9 .:/]{0,40}", 0..6)) {
        let text = lines.join("\n");
        prop_assume!(!text.to_lowercase().contains("invalid command"));
        prop_assert!(!text::is_cli_error(&text));
    }
}
