//! Text helpers shared by enum parsing, the chatbot and the CV heuristics.

/// Lowercases and folds French diacritics (`é` → `e`, `ç` → `c`, `œ` → `oe`).
pub fn fold(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'â' | 'ä' | 'á' | 'ã' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'î' | 'ï' | 'í' | 'ì' => out.push('i'),
            'ô' | 'ö' | 'ó' | 'ò' | 'õ' => out.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => out.push('u'),
            'ÿ' => out.push('y'),
            'ç' => out.push('c'),
            'ñ' => out.push('n'),
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            other => out.push(other),
        }
    }
    out
}

/// `fold` plus punctuation replaced by single spaces. Keeps `+`, `#` and `.`
/// inside words so skills like `c++`, `c#` and `node.js` survive.
pub fn normalize(input: &str) -> String {
    let folded = fold(input);
    let mut out = String::with_capacity(folded.len());
    let chars: Vec<char> = folded.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let keep = c.is_alphanumeric()
            || c == '+'
            || c == '#'
            || (c == '.'
                && i > 0
                && chars[i - 1].is_alphanumeric()
                && chars.get(i + 1).is_some_and(|n| n.is_alphanumeric()));
        out.push(if keep { c } else { ' ' });
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `needle` (already normalized) appears in `haystack` on word boundaries.
pub fn contains_words(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let padded_hay = format!(" {haystack} ");
    let padded_needle = format!(" {needle} ");
    padded_hay.contains(&padded_needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_french_accents() {
        assert_eq!(fold("Rémunération Confirmé Français"), "remuneration confirme francais");
        assert_eq!(fold("Cœur"), "coeur");
    }

    #[test]
    fn test_normalize_drops_punctuation_but_keeps_skill_symbols() {
        assert_eq!(normalize("Qui connaît C++, C# ou Node.js ?"), "qui connait c++ c# ou node.js");
    }

    #[test]
    fn test_normalize_trailing_dot_is_removed() {
        assert_eq!(normalize("Quel est le salaire de Dupont."), "quel est le salaire de dupont");
    }

    #[test]
    fn test_contains_words_respects_boundaries() {
        assert!(contains_words("qui connait java", "java"));
        assert!(!contains_words("qui connait javascript", "java"));
        assert!(contains_words("jean dupont est dispo", "jean dupont"));
        assert!(!contains_words("anything", ""));
    }
}
