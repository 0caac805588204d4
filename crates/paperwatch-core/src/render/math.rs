/// Pad the outermost `$…$` span with one space on each side where it touches
/// a character that is neither whitespace nor `*`. The math itself is left as is.
pub fn pretty_math(s: &str) -> String {
    let (Some(start), Some(end)) = (s.find('$'), s.rfind('$')) else {
        return s.to_string();
    };
    if start == end {
        return s.to_string();
    }

    let before = &s[..start];
    let math = &s[start..=end];
    let after = &s[end + 1..];

    let mut out = String::with_capacity(s.len() + 2);
    out.push_str(before);
    if before.chars().next_back().is_some_and(needs_space) {
        out.push(' ');
    }
    out.push_str(math);
    if after.chars().next().is_some_and(needs_space) {
        out.push(' ');
    }
    out.push_str(after);
    out
}

fn needs_space(c: char) -> bool {
    !c.is_whitespace() && c != '*'
}
