/// Reduce a statically quoted shell word to its literal value.
///
/// `ls`, `'ls'` and `l"s"` all yield `ls`. Returns `None` when the text does
/// not form exactly one non-empty word (unbalanced quotes, embedded
/// whitespace splitting it in two, or `''`).
pub fn static_word(text: &str) -> Option<String> {
    let mut words = shlex::split(text)?;
    if words.len() != 1 {
        return None;
    }
    let word = words.pop()?;
    if word.is_empty() { None } else { Some(word) }
}
