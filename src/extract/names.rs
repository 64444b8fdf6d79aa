//! Static names of suites and tests: string literal values and the leading
//! chunk of template literals.

use tree_sitter::Node;

/// Value of a quoted string literal, with escape sequences decoded.
pub fn string_value(node: Node, source: &str) -> String {
    let (start, end) = (node.start_byte(), node.end_byte());
    if end < start + 2 {
        return String::new();
    }
    unescape(source.get(start + 1..end - 1).unwrap_or(""))
}

/// Text of a template literal up to its first `${...}` substitution.
pub fn template_head(node: Node, source: &str) -> String {
    let start = node.start_byte() + 1;
    let mut cursor = node.walk();
    let end = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "template_substitution")
        .map(|c| c.start_byte())
        .unwrap_or_else(|| node.end_byte().saturating_sub(1));
    if end < start {
        return String::new();
    }
    unescape(source.get(start..end).unwrap_or(""))
}

/// Decode the escape sequences of a string or template body.
pub fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(&escaped) = chars.get(i) else {
            out.push('\\');
            break;
        };
        i += 1;
        match escaped {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            'x' => match read_hex(&chars, i, 2) {
                Some(code) => {
                    out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                    i += 2;
                }
                None => out.push('x'),
            },
            'u' => match read_unicode(&chars, i) {
                Some((code, consumed)) => {
                    i += consumed;
                    out.push(combine_surrogates(code, &chars, &mut i));
                }
                None => out.push('u'),
            },
            // Line continuations contribute nothing.
            '\r' => {
                if chars.get(i) == Some(&'\n') {
                    i += 1;
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }

    out
}

fn read_hex(chars: &[char], at: usize, len: usize) -> Option<u32> {
    let digits: String = chars.get(at..at + len)?.iter().collect();
    u32::from_str_radix(&digits, 16).ok()
}

/// Parse the part after `\u`: either `XXXX` or `{X...}`.
fn read_unicode(chars: &[char], at: usize) -> Option<(u32, usize)> {
    if chars.get(at) == Some(&'{') {
        let close = chars[at..].iter().position(|&c| c == '}')?;
        let digits: String = chars[at + 1..at + close].iter().collect();
        let code = u32::from_str_radix(&digits, 16).ok()?;
        return Some((code, close + 1));
    }
    read_hex(chars, at, 4).map(|code| (code, 4))
}

/// Join a `\uD83D\uDE00`-style pair; a lone surrogate becomes U+FFFD.
fn combine_surrogates(high: u32, chars: &[char], i: &mut usize) -> char {
    if !(0xD800..=0xDBFF).contains(&high) {
        return char::from_u32(high).unwrap_or('\u{fffd}');
    }
    if chars.get(*i) == Some(&'\\') && chars.get(*i + 1) == Some(&'u') {
        if let Some((low, consumed)) = read_unicode(chars, *i + 2) {
            if (0xDC00..=0xDFFF).contains(&low) {
                *i += 2 + consumed;
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(code).unwrap_or('\u{fffd}');
            }
        }
    }
    '\u{fffd}'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dialect;
    use crate::parser;

    fn first_argument_name(source: &str) -> String {
        let tree = parser::parse(source, Dialect::JavaScript).unwrap();
        let call = tree.root().named_child(0).unwrap().named_child(0).unwrap();
        let args = call.child_by_field_name("arguments").unwrap();
        let arg = args.named_child(0).unwrap();
        match arg.kind() {
            "template_string" => template_head(arg, tree.source()),
            _ => string_value(arg, tree.source()),
        }
    }

    #[test]
    fn test_plain_strings() {
        assert_eq!(first_argument_name(r#"it("double");"#), "double");
        assert_eq!(first_argument_name("it('single');"), "single");
        assert_eq!(first_argument_name("it('');"), "");
    }

    #[test]
    fn test_string_escapes_are_decoded() {
        assert_eq!(first_argument_name(r#"it("it\'s \"quoted\"");"#), "it's \"quoted\"");
        assert_eq!(first_argument_name(r#"it("tab\there");"#), "tab\there");
        assert_eq!(first_argument_name(r#"it("ét\u{e9}");"#), "été");
        assert_eq!(first_argument_name(r#"it("\x41BC");"#), "ABC");
    }

    #[test]
    fn test_template_head_stops_at_substitution() {
        assert_eq!(first_argument_name("it(`case ${n}`);"), "case ");
        assert_eq!(first_argument_name("it(`${n} first`);"), "");
        assert_eq!(first_argument_name("it(`no substitutions`);"), "no substitutions");
        assert_eq!(first_argument_name("it(`a\\`b ${x} c`);"), "a`b ");
    }

    #[test]
    fn test_non_ascii_names() {
        assert_eq!(first_argument_name("it('ünïcödé ✓');"), "ünïcödé ✓");
    }

    #[test]
    fn test_unescape_surrogate_pairs() {
        assert_eq!(unescape(r"\uD83D\uDE00"), "😀");
        assert_eq!(unescape(r"\uD83D"), "\u{fffd}");
    }

    #[test]
    fn test_unescape_line_continuation() {
        assert_eq!(unescape("one \\\ntwo"), "one two");
        assert_eq!(unescape("one \\\r\ntwo"), "one two");
    }

    #[test]
    fn test_unescape_passthrough() {
        assert_eq!(unescape("no escapes"), "no escapes");
        assert_eq!(unescape(r"\q"), "q");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }
}
