use tabrus_core::types::Direction;

/// Translations per glossary word shown to the model.
const GLOSSARY_SENSES: usize = 3;

/// One resolved word offered to the model as dictionary context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryLine {
    pub word: String,
    pub translations: Vec<String>,
}

const GRAMMAR_TAB: &str = "ГРАММАТИКА ТАБАСАРАНСКОГО ЯЗЫКА:
- Агглютинативный язык (суффиксы добавляются к корню)
- Эргативный строй (субъект переходного глагола в эргативе)
- Развитая система местных падежей
- Порядок слов: SOV (подлежащее-дополнение-сказуемое)

ЧАСТЫЕ СУФФИКСЫ:
- -ар/-ер: множественное число
- -ин: родительный падеж
- -из: дательный падеж
- -на: эргативный падеж
- -хъ: локатив (внутри)
- -ъ: локатив (на поверхности)";

const GRAMMAR_RUS: &str = "ГРАММАТИКА ТАБАСАРАНСКОГО ЯЗЫКА:
- Агглютинативный язык (суффиксы добавляются к корню)
- Порядок слов: SOV (подлежащее-дополнение-сказуемое)
- Глагол ставится в конце предложения";

/// Prompt for one contextual translation: task line, grammar sketch,
/// dictionary glossary, retrieved examples as few-shot pairs, then the text.
pub fn build_prompt(text: &str, direction: Direction, examples: &[(String, String)], glossary: &[GlossaryLine], max_glossary: usize) -> String {
    let (role, grammar, task) = match direction {
        Direction::TabRus => ("Ты эксперт-переводчик с табасаранского языка на русский.", GRAMMAR_TAB, "Переведи на русский язык, сохраняя смысл:"),
        Direction::RusTab => ("Ты эксперт-переводчик с русского языка на табасаранский.", GRAMMAR_RUS, "Переведи на табасаранский язык:"),
    };

    let lines: Vec<String> = glossary
        .iter()
        .filter(|g| !g.translations.is_empty())
        .take(max_glossary)
        .map(|g| {
            let senses: Vec<&str> = g.translations.iter().take(GLOSSARY_SENSES).map(String::as_str).collect();
            format!("• {}: {}", g.word, senses.join(", "))
        })
        .collect();
    let context = if lines.is_empty() { "Контекст из словаря отсутствует.".to_string() } else { lines.join("\n") };

    let mut prompt = format!("{role}\n\n{grammar}\n\nСЛОВАРНЫЙ КОНТЕКСТ:\n{context}\n\n");
    if !examples.is_empty() {
        prompt.push_str("ПРИМЕРЫ ПЕРЕВОДОВ:\n");
        for (source, target) in examples { prompt.push_str(&format!("• \"{}\" → \"{}\"\n", source, target)); }
        prompt.push('\n');
    }
    prompt.push_str(&format!("{task}\n\"{text}\"\n\nОтветь ТОЛЬКО переводом, без пояснений."));
    prompt
}

/// Trim the model's reply and drop one pair of surrounding quotes.
/// `None` when nothing is left.
pub fn clean_reply(raw: &str) -> Option<String> {
    let mut text = raw.trim();
    for (open, close) in [('"', '"'), ('«', '»'), ('“', '”'), ('\'', '\'')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
            break;
        }
    }
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_direction_glossary_and_examples() {
        let glossary = vec![
            GlossaryLine { word: "салам".into(), translations: vec!["привет".into(), "здравствуй".into(), "мир".into(), "лишнее".into()] },
            GlossaryLine { word: "xyzzy".into(), translations: vec![] },
        ];
        let examples = vec![("Узу чвас ава".to_string(), "Я здесь".to_string())];
        let p = build_prompt("Салам, гъвелчи", Direction::TabRus, &examples, &glossary, 10);
        assert!(p.contains("на русский"));
        assert!(p.contains("• салам: привет, здравствуй, мир\n"));
        assert!(!p.contains("лишнее"));
        assert!(!p.contains("xyzzy"));
        assert!(p.contains("• \"Узу чвас ава\" → \"Я здесь\""));
        assert!(p.ends_with("\"Салам, гъвелчи\"\n\nОтветь ТОЛЬКО переводом, без пояснений."));
    }

    #[test]
    fn prompt_without_context() {
        let p = build_prompt("Я здесь", Direction::RusTab, &[], &[], 10);
        assert!(p.contains("на табасаранский"));
        assert!(p.contains("Контекст из словаря отсутствует."));
        assert!(!p.contains("ПРИМЕРЫ"));
    }

    #[test]
    fn glossary_is_capped() {
        let glossary: Vec<GlossaryLine> = (0..5).map(|i| GlossaryLine { word: format!("w{i}"), translations: vec!["t".into()] }).collect();
        let p = build_prompt("x", Direction::TabRus, &[], &glossary, 2);
        assert!(p.contains("• w1: t") && !p.contains("• w2: t"));
    }

    #[test]
    fn reply_cleanup() {
        assert_eq!(clean_reply("  \"Привет, друг\" \n").as_deref(), Some("Привет, друг"));
        assert_eq!(clean_reply("«Я здесь»").as_deref(), Some("Я здесь"));
        assert_eq!(clean_reply("Он сказал \"да\"").as_deref(), Some("Он сказал \"да\""));
        assert_eq!(clean_reply("\"").as_deref(), Some("\""));
        assert_eq!(clean_reply("  \"\" "), None);
        assert_eq!(clean_reply(""), None);
    }
}
