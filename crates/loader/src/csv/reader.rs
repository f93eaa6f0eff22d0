//! Record tokenizer for delimiter-separated text.

/// Field and record separators of one CSV flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Dialect {
    pub delimiter: char,
    pub enclosure: char,
    pub escape: Option<char>,
}

impl Default for Dialect {
    fn default() -> Self {
        Self { delimiter: ',', enclosure: '"', escape: Some('\\') }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// After the closing enclosure of a quoted field.
    Closed,
}

/// Splits `text` into records. `\r\n`, `\n` and `\r` end a record outside
/// enclosures; lines without any content are skipped.
pub(crate) fn records(text: &str, dialect: Dialect) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut state = State::FieldStart;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Quoted => {
                if dialect.escape == Some(c) && c != dialect.enclosure {
                    field.push(c);
                    if let Some(next) = chars.next() {
                        field.push(next);
                    }
                } else if c == dialect.enclosure {
                    if chars.peek() == Some(&dialect.enclosure) {
                        chars.next();
                        field.push(c);
                    } else {
                        state = State::Closed;
                    }
                } else {
                    field.push(c);
                }
            }
            _ if c == dialect.delimiter => {
                record.push(std::mem::take(&mut field));
                state = State::FieldStart;
            }
            _ if c == '\n' || c == '\r' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                finish(&mut records, &mut record, &mut field);
                state = State::FieldStart;
            }
            State::FieldStart if c == dialect.enclosure => state = State::Quoted,
            _ => {
                field.push(c);
                state = State::Unquoted;
            }
        }
    }
    if state != State::FieldStart || !record.is_empty() {
        finish(&mut records, &mut record, &mut field);
    }
    records
}

fn finish(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    record.push(std::mem::take(field));
    let record = std::mem::take(record);
    if record.len() == 1 && record[0].is_empty() {
        return;
    }
    records.push(record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn split(text: &str) -> Vec<Vec<String>> {
        records(text, Dialect::default())
    }

    fn rows(expected: &[&[&str]]) -> Vec<Vec<String>> {
        expected.iter().map(|r| r.iter().map(|f| f.to_string()).collect()).collect()
    }

    #[rstest]
    #[case("a,b,c", &[&["a", "b", "c"][..]])]
    #[case("a,b\n1,2\n", &[&["a", "b"][..], &["1", "2"][..]])]
    #[case("a,b\r\n1,2\r3,4", &[&["a", "b"][..], &["1", "2"][..], &["3", "4"][..]])]
    #[case("a,,c", &[&["a", "", "c"][..]])]
    #[case("a,", &[&["a", ""][..]])]
    #[case("a\n\n\nb", &[&["a"][..], &["b"][..]])]
    #[case("", &[])]
    fn plain_records(#[case] text: &str, #[case] expected: &[&[&str]]) {
        assert_eq!(split(text), rows(expected));
    }

    #[rstest]
    #[case(r#""a,b",c"#, &[&["a,b", "c"][..]])]
    #[case(r#""say ""hi""",x"#, &[&[r#"say "hi""#, "x"][..]])]
    #[case("\"two\nlines\",x", &[&["two\nlines", "x"][..]])]
    #[case(r#""a\"b",c"#, &[&[r#"a\"b"#, "c"][..]])]
    #[case(r#""a"b,c"#, &[&["ab", "c"][..]])]
    #[case(r#"x"y,z"#, &[&[r#"x"y"#, "z"][..]])]
    fn enclosed_fields(#[case] text: &str, #[case] expected: &[&[&str]]) {
        assert_eq!(split(text), rows(expected));
    }

    #[test]
    fn custom_dialect() {
        let dialect = Dialect { delimiter: ';', enclosure: '\'', escape: None };
        assert_eq!(records("'a;b';c\\", dialect), rows(&[&["a;b", "c\\"]]));
    }
}
