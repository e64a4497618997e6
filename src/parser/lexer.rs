// Shared token parsers

use nom::{
    bytes::complete::take_till,
    character::complete::multispace0,
    error::ParseError,
    number::complete::double,
    sequence::delimited,
    IResult,
};

/// Wrap a parser so surrounding whitespace is ignored
pub fn ws<'a, F, O, E>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: FnMut(&'a str) -> IResult<&'a str, O, E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse a floating point literal (e.g. `10`, `-2.5`, `1e3`)
pub fn number_literal(input: &str) -> IResult<&str, f64> {
    double(input)
}

/// Raw text up to (not including) the next comma
pub fn list_cell(input: &str) -> IResult<&str, &str> {
    take_till(|c| c == ',')(input)
}
