/// Build the instruction sent to the generative model.
///
/// Both inputs are interpolated verbatim. The caller rejects empty text
/// before getting here.
pub fn build_translation_prompt(source_text: &str, target_language: &str) -> String {
    format!(
        r#"You are an AI-powered language translator. Translate the text below into the target language accurately and in context, keeping its meaning, tone and structure.

## Translation Rules

### Accuracy:
- The translation must be precise, natural and appropriate to the context
- Keep the original meaning, intent and nuance
- Avoid literal translations that read badly in the target language

### Fluency:
- The result must be grammatically correct and fluent in the target language

### No additions:
- Translate ONLY the given text
- Do not add words, phrases, notes or explanations

### Tone:
- Keep the same level of formality or informality as the original

### Short or ambiguous input:
- If the text is too short or unclear to translate meaningfully, ask for more context instead of guessing

## Input

- Text: "{}"
- Target Language: "{}"

## Output

Reply with the translated text ONLY, with no explanations, extra words or formatting."#,
        source_text, target_language
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_prompt_contains_inputs() {
        let prompt = build_translation_prompt("Hello", "French");
        assert!(prompt.contains("Hello"));
        assert!(prompt.contains("French"));
    }

    #[test]
    fn test_prompt_rules() {
        let prompt = build_translation_prompt("Hello", "French");
        assert!(prompt.contains("Translate ONLY the given text"));
        assert!(prompt.contains("formality"));
        assert!(prompt.contains("Do not add"));
        assert!(prompt.contains("ask for more context"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(
            build_translation_prompt("Good morning", "Hindi"),
            build_translation_prompt("Good morning", "Hindi")
        );
    }

    #[test]
    fn test_special_characters_preserved() {
        let text = "He said \"hi\" & left <b>{now}</b>\n\tbye";
        let prompt = build_translation_prompt(text, "German");
        assert!(prompt.contains(text));
    }

    #[test]
    fn test_unknown_language_passed_verbatim() {
        let prompt = build_translation_prompt("Hello", "Old Norse");
        assert!(prompt.contains("Target Language: \"Old Norse\""));
    }

    proptest! {
        #[test]
        fn prop_prompt_embeds_both_inputs(text in ".+", language in ".*") {
            let prompt = build_translation_prompt(&text, &language);
            prop_assert!(prompt.contains(&text));
            prop_assert!(prompt.contains(&language));
        }
    }
}
