/// Parses `KEY=VALUE` pairs for repeatable options. The key must not be empty;
/// the value may be.
pub fn parse_key_value(input: &str) -> Result<(String, String), String> {
    let (key, value) = input.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got `{input}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{input}`"));
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a=b", ("a", "b"))]
    #[case(" json = urn:carica-json-dom.2013 ", ("json", "urn:carica-json-dom.2013"))]
    #[case("0=first", ("0", "first"))]
    #[case("key=", ("key", ""))]
    #[case("k=v=w", ("k", "v=w"))]
    fn accepts_pairs(#[case] input: &str, #[case] expected: (&str, &str)) {
        let (key, value) = parse_key_value(input).unwrap();
        assert_eq!((key.as_str(), value.as_str()), expected);
    }

    #[rstest]
    #[case("novalue")]
    #[case("=value")]
    fn rejects_malformed(#[case] input: &str) {
        assert!(parse_key_value(input).is_err());
    }
}
