// Parser for the legacy positional input: ("A,B,C", "1,2,3", "bar")

use super::lexer::{list_cell, number_literal, ws};
use crate::error::{ChartError, Result};
use nom::{
    character::complete::char,
    combinator::{all_consuming, map},
    multi::separated_list1,
    IResult,
};

/// Parse a comma separated list of category labels
/// Format: `A, B ,C` -> ["A", "B", "C"]
pub fn parse_category_list(input: &str) -> IResult<&str, Vec<String>> {
    separated_list1(char(','), map(list_cell, |s: &str| s.trim().to_string()))(input)
}

/// Parse a comma separated list of numbers
/// Format: `10, 20.5,-3` -> [10.0, 20.5, -3.0]
pub fn parse_value_list(input: &str) -> IResult<&str, Vec<f64>> {
    separated_list1(char(','), ws(number_literal))(input)
}

/// Split both axis strings and check they line up.
pub fn parse_legacy_axes(x_csv: &str, y_csv: &str) -> Result<(Vec<String>, Vec<f64>)> {
    let (_, categories) = all_consuming(parse_category_list)(x_csv)
        .map_err(|e| ChartError::malformed(format!("x axis data '{}': {:?}", x_csv, e)))?;

    let (_, values) = all_consuming(parse_value_list)(y_csv).map_err(|_| {
        ChartError::malformed(format!("y axis data '{}' is not a list of numbers", y_csv))
    })?;

    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(ChartError::malformed(format!(
            "y axis value '{}' is not a finite number",
            bad
        )));
    }

    if categories.len() != values.len() {
        return Err(ChartError::malformed(format!(
            "x and y data must have the same length (x: {}, y: {})",
            categories.len(),
            values.len()
        )));
    }

    Ok((categories, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_list_trims() {
        let (rest, cats) = parse_category_list(" A , B,C ").unwrap();
        assert_eq!(rest, "");
        assert_eq!(cats, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_parse_value_list() {
        let (rest, values) = parse_value_list("10, 20.5 ,-3").unwrap();
        assert_eq!(rest, "");
        assert_eq!(values, vec![10.0, 20.5, -3.0]);
    }

    #[test]
    fn test_parse_legacy_axes_ok() {
        let (cats, values) = parse_legacy_axes("1月,2月,3月", "120,150,180").unwrap();
        assert_eq!(cats, vec!["1月", "2月", "3月"]);
        assert_eq!(values, vec![120.0, 150.0, 180.0]);
    }

    #[test]
    fn test_parse_legacy_axes_length_mismatch() {
        let err = parse_legacy_axes("A,B,C", "1,2").unwrap_err();
        assert!(matches!(err, ChartError::MalformedInput { .. }));
        assert!(err.to_string().contains("same length"));
    }

    #[test]
    fn test_parse_legacy_axes_non_numeric() {
        let err = parse_legacy_axes("A,B", "1,abc").unwrap_err();
        assert!(matches!(err, ChartError::MalformedInput { .. }));
    }

    #[test]
    fn test_parse_legacy_axes_trailing_comma() {
        // "1,2," leaves an empty numeric cell
        assert!(parse_legacy_axes("A,B,", "1,2,").is_err());
    }
}
