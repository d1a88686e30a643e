use unicode_normalization::UnicodeNormalization;

pub trait Preprocessor {
    // Default Korean preprocessor
    fn process(&self, text: &str) -> String {
        let text = text.trim();

        if text.is_empty() {
            return String::new();
        }

        // Hangul must be composed (NFC) for stable keys and prompts
        let text: String = text.nfc().collect();

        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

pub struct DefaultPreprocessor;
impl Preprocessor for DefaultPreprocessor {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_jamo_and_collapses_whitespace() {
        // 가 written as separate jamo
        let decomposed = "\u{1100}\u{1161}다  \n";

        assert_eq!(DefaultPreprocessor.process(decomposed), "가다");
        assert_eq!(DefaultPreprocessor.process("안녕  하세요"), "안녕 하세요");
        assert_eq!(DefaultPreprocessor.process("   "), "");
    }
}
