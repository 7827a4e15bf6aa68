//! The UTF-8 code-point deletion neighborhood of a string up to depth `d`.
use std::collections::HashSet;

/// Enumerates the set of strings obtainable from `s` by deleting between 0
/// and `depth` UTF-8 code points, inclusive.
///
/// Operates on code points, not bytes (`"café"` with `depth = 1` deletes the
/// accented character as a single unit). The input itself is always present
/// (depth 0). Recursion stops descending once the remaining string is at
/// most 2 code points long — very short strings are not further eroded,
/// matching the engine's rule. The result is deduplicated: deleting two
/// equal neighbouring characters produces the same string only once.
pub fn string_neighborhood(s: &str, depth: u64) -> HashSet<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut out = HashSet::new();
    let mut expanded: HashSet<(String, u64)> = HashSet::new();
    visit(&chars, depth, &mut out, &mut expanded);
    out
}

/// `expanded` memoizes on `(content, depth_remaining)`: the same character
/// sequence is always reached with the same remaining depth regardless of
/// deletion order (it is fixed by how many characters have already been
/// removed), so once a sequence has been expanded once there is no need to
/// expand it again.
fn visit(
    chars: &[char],
    depth_remaining: u64,
    out: &mut HashSet<String>,
    expanded: &mut HashSet<(String, u64)>,
) {
    let current: String = chars.iter().collect();
    if !expanded.insert((current.clone(), depth_remaining)) {
        return;
    }
    out.insert(current);

    if depth_remaining == 0 || chars.len() <= 2 {
        return;
    }

    for i in 0..chars.len() {
        let mut next = Vec::with_capacity(chars.len() - 1);
        next.extend_from_slice(&chars[..i]);
        next.extend_from_slice(&chars[i + 1..]);
        visit(&next, depth_remaining - 1, out, expanded);
    }
}
