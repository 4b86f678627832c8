//! Value naming for emitted code.
use std::collections::{HashMap, HashSet};
use lazy_static::lazy_static;

/// Words a minified name must never take: target keywords and literals,
/// plus the names the emitted factory itself binds.
pub static RESERVED_WORD_LIST: &'static [&'static str] = &[
    "as", "do", "if", "in", "of", "for", "let", "new", "try", "var",
    "case", "else", "enum", "eval", "null", "this", "true", "void", "with",
    "await", "break", "catch", "class", "const", "false", "super", "throw",
    "while", "yield", "delete", "export", "import", "public", "return",
    "static", "switch", "typeof", "default", "extends", "finally", "package",
    "private", "continue", "debugger", "function", "arguments", "interface",
    "protected", "implements", "instanceof", "undefined", "NaN", "Infinity",
    "props", "state", "render", "construct", "mount", "patch",
    "structuredClone", "__cached", "__templates",
];

lazy_static! {
    pub static ref RESERVED_WORDS: HashSet<&'static str> = {
        HashSet::from_iter(
            RESERVED_WORD_LIST.to_vec()
        )
    };
}

/// Bijective base-26: `0 -> a`, `25 -> z`, `26 -> aa`, `27 -> ab`.
pub fn short_name(index: usize) -> String {
    let mut index = index;
    let mut letters = Vec::new();
    loop {
        letters.push((b'a' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Identifier-like words of an opaque expression, e.g. `a`, `b` and `c` in
/// `a.b(c + 1)`. Over-approximates; property names are included.
pub fn identifiers(text: &str) -> impl Iterator<Item = &str> {
    text.split(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == '$'))
        .filter(|word| {
            word.chars()
                .next()
                .map(|ch| !ch.is_ascii_digit())
                .unwrap_or(false)
        })
}

/// Maps IR names to emitted names. Without minification names pass through,
/// except that a name the template's code also uses gets `_` appended until
/// it is free.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    minify: bool,
    assigned: HashMap<String, String>,
    next: usize,
    taken: HashSet<String>,
}

impl NameMap {
    /// `taken` are words used by the template's own code; emitted names
    /// avoid them so expressions are never shadowed.
    pub fn new(minify: bool, taken: HashSet<String>) -> Self {
        NameMap {
            minify,
            taken,
            ..NameMap::default()
        }
    }

    pub fn get(&mut self, name: &str) -> String {
        if let Some(emitted) = self.assigned.get(name) {
            return emitted.clone();
        }
        let emitted = if self.minify {
            self.next_short()
        } else {
            let mut candidate = name.to_owned();
            while self.taken.contains(&candidate) || RESERVED_WORDS.contains(candidate.as_str()) {
                candidate.push('_');
            }
            candidate
        };
        self.assigned.insert(name.to_owned(), emitted.clone());
        emitted
    }

    fn next_short(&mut self) -> String {
        loop {
            let candidate = short_name(self.next);
            self.next += 1;
            if !RESERVED_WORDS.contains(candidate.as_str()) && !self.taken.contains(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn base_26_sequence() {
        let names: Vec<String> = [0, 1, 25, 26, 27, 51, 52, 701, 702]
            .iter()
            .map(|x| short_name(*x))
            .collect();
        assert_eq!(names, vec!["a", "b", "z", "aa", "ab", "az", "ba", "zz", "aaa"]);
    }

    #[test]
    fn first_use_order_and_stability() {
        let mut names = NameMap::new(true, HashSet::new());
        assert_eq!(names.get("el0"), "a");
        assert_eq!(names.get("const0"), "b");
        assert_eq!(names.get("el0"), "a");
        assert_eq!(names.get("text0"), "c");
    }

    #[test]
    fn taken_and_reserved_words_are_skipped() {
        let taken = identifiers("a.c + 1").map(String::from).collect();
        let mut names = NameMap::new(true, taken);
        assert_eq!(names.get("x0"), "b");
        assert_eq!(names.get("x1"), "d");
        for ix in 0..200 {
            let short = names.get(&format!("y{}", ix));
            assert!(!RESERVED_WORDS.contains(short.as_str()), "{}", short);
        }
    }

    #[test]
    fn pass_through_without_minify() {
        let mut names = NameMap::new(false, HashSet::new());
        assert_eq!(names.get("el0"), "el0");
        assert_eq!(names.get("const0"), "const0");
    }

    #[test]
    fn pass_through_steps_around_taken_words() {
        let taken = ["expr0", "expr0_", "el1"].iter().map(|x| x.to_string()).collect();
        let mut names = NameMap::new(false, taken);
        assert_eq!(names.get("expr0"), "expr0__");
        assert_eq!(names.get("el1"), "el1_");
        assert_eq!(names.get("el0"), "el0");
        assert_eq!(names.get("expr0"), "expr0__");
    }

    #[test]
    fn expression_identifiers() {
        let words: Vec<&str> = identifiers("item.price * 2 + $total(x_1)").collect();
        assert_eq!(words, vec!["item", "price", "$total", "x_1"]);
    }
}
