//! Minimal CSV tokenizer for dashboard imports.
//!
//! Each line is scanned once with an "inside quote" flag: `"` toggles the flag,
//! `,` outside quotes ends a field, anything else is appended. Fields are
//! trimmed. Lines yielding fewer than two fields are dropped as noise.
//!
//! Not supported: `""` escapes inside quoted fields and newlines inside quoted
//! fields. An unterminated quote swallows the rest of its line.

/// Parse CSV text into rows of trimmed fields.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    text.split('\n')
        .map(parse_line)
        .filter(|row| row.len() > 1)
        .collect()
}

fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut in_quote = false;
    let mut current = String::new();

    for ch in line.chars() {
        match ch {
            '"' => in_quote = !in_quote,
            ',' if !in_quote => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    // Only a non-empty tail is flushed, so "a,b," has two fields.
    if !current.is_empty() {
        fields.push(current.trim().to_string());
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_comma_stays_in_field() {
        let rows = parse_csv("\"Doe, John\",Manager,5000");
        assert_eq!(rows, vec![vec!["Doe, John", "Manager", "5000"]]);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let rows = parse_csv(" name , role ,income\n  Ana ,CEO,  100 ");
        assert_eq!(rows[0], vec!["name", "role", "income"]);
        assert_eq!(rows[1], vec!["Ana", "CEO", "100"]);
    }

    #[test]
    fn test_short_and_blank_lines_are_dropped() {
        let rows = parse_csv("name,role\n\njustone\nAna,CEO\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["Ana", "CEO"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let rows = parse_csv("name,role\r\nAna,CEO\r\n");
        assert_eq!(rows, vec![vec!["name", "role"], vec!["Ana", "CEO"]]);
    }

    #[test]
    fn test_trailing_comma_does_not_add_empty_field() {
        assert_eq!(parse_csv("a,b,"), vec![vec!["a", "b"]]);
        // A whitespace tail is non-empty before trimming and yields an empty field.
        assert_eq!(parse_csv("a,b, "), vec![vec!["a", "b", ""]]);
    }

    #[test]
    fn test_interior_empty_fields_are_kept() {
        assert_eq!(parse_csv("a,,c"), vec![vec!["a", "", "c"]]);
    }

    #[test]
    fn test_unterminated_quote_swallows_rest_of_line() {
        let rows = parse_csv("a,\"b,c,d\nx,y");
        assert_eq!(rows[0], vec!["a", "b,c,d"]);
        // The quote state does not leak into the next line.
        assert_eq!(rows[1], vec!["x", "y"]);
    }

    #[test]
    fn test_doubled_quotes_are_not_escapes() {
        assert_eq!(parse_csv("\"say \"\"hi\"\"\",x"), vec![vec!["say hi", "x"]]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_csv("").is_empty());
    }
}
