//! User-facing message catalog
//!
//! Messages are numbered templates with positional `{0}`, `{1}`, ...
//! placeholders. The orchestrator only formats through [`Messages`], so a
//! host can plug in its own translations.

/// Numbered message templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// No engine executable configured
    EngineNotConfigured = 0,
    /// Engine bundle missing; `{0}` is the expected location
    BundleNotFound = 1,
    /// Page failed; `{0}` is the title, `{1}` the engine error
    PageFailed = 2,
    /// Drain task did not finish; `{0}` is the title, `{1}` the cause
    TaskAborted = 3,
    /// Converter failed; `{0}` is the output path, `{1}` the cause
    ConversionFailed = 4,
    /// Engine could not be started; `{0}` is the executable, `{1}` the cause
    SpawnFailed = 5,
}

impl MessageId {
    /// Stable message number
    pub fn number(self) -> u32 {
        self as u32
    }
}

/// Localization provider
pub trait Messages: Send + Sync {
    /// Format a message with positional arguments
    fn format(&self, id: MessageId, args: &[&str]) -> String;
}

/// Built-in English catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishMessages;

impl EnglishMessages {
    fn template(id: MessageId) -> &'static str {
        match id {
            MessageId::EngineNotConfigured => {
                "No engine executable configured. Set `engine.executable` in umlpress.toml."
            }
            MessageId::BundleNotFound => {
                "Engine bundle not found. Install it at \"{0}\" or set `engine.bundle` in umlpress.toml."
            }
            MessageId::PageFailed => "Error rendering \"{0}\":\n{1}",
            MessageId::TaskAborted => "Rendering \"{0}\" was aborted: {1}",
            MessageId::ConversionFailed => "Failed to convert \"{0}\": {1}",
            MessageId::SpawnFailed => "Failed to start \"{0}\": {1}",
        }
    }
}

impl Messages for EnglishMessages {
    fn format(&self, id: MessageId, args: &[&str]) -> String {
        fill_template(Self::template(id), args)
    }
}

/// Substitute `{N}` placeholders; unknown indices are left as is
pub fn fill_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let arg = after.find('}').and_then(|end| {
            after[..end]
                .parse::<usize>()
                .ok()
                .and_then(|i| args.get(i))
                .map(|value| (value, end))
        });
        match arg {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template() {
        assert_eq!(fill_template("{0} -> {1}", &["a", "b"]), "a -> b");
        assert_eq!(fill_template("{1}{0}{1}", &["x", "y"]), "yxy");
    }

    #[test]
    fn test_fill_template_keeps_unknown_placeholders() {
        assert_eq!(fill_template("{2} {name} {", &["a"]), "{2} {name} {");
    }

    #[test]
    fn test_message_numbers_are_stable() {
        assert_eq!(MessageId::EngineNotConfigured.number(), 0);
        assert_eq!(MessageId::BundleNotFound.number(), 1);
        assert_eq!(MessageId::PageFailed.number(), 2);
    }

    #[test]
    fn test_english_page_failed() {
        let msg = EnglishMessages.format(MessageId::PageFailed, &["flow", "Syntax Error?"]);
        assert_eq!(msg, "Error rendering \"flow\":\nSyntax Error?");
    }

    #[test]
    fn test_english_bundle_not_found_mentions_location() {
        let msg = EnglishMessages.format(MessageId::BundleNotFound, &["/opt/plantuml.jar"]);
        assert!(msg.contains("/opt/plantuml.jar"));
    }
}
