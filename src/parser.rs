//! Catalog value parsers using nom.
//!
//! Two kinds of catalog text need structure before code generation:
//!
//! ```text
//! int(10) unsigned                      -> SqlType { name: "int", params: ["10"], unsigned }
//! enum('draft','live')                  -> SqlType { name: "enum", params: ["draft", "live"] }
//! timestamp with time zone              -> SqlType { name: "timestamp with time zone" }
//! CREATE UNIQUE INDEX users_email_key ON public.users USING btree (email)
//!                                       -> IndexDef { unique: true, columns: ["email"] }
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, opt},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::error::{GenError, GenResult};
use crate::schema::SqlType;

/// Words that qualify a numeric type rather than name it.
const MODIFIERS: [&str; 3] = ["unsigned", "signed", "zerofill"];

/// Column list recovered from a PostgreSQL index definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub unique: bool,
    pub columns: Vec<String>,
}

/// Parse a column type as reported by the catalog.
pub fn parse_sql_type(input: &str) -> GenResult<SqlType> {
    let input = input.trim();

    match sql_type(input) {
        Ok(("", ty)) => Ok(ty),
        Ok((remaining, _)) => Err(GenError::parse(
            input.len() - remaining.len(),
            format!("Unexpected trailing content in type: '{}'", remaining),
        )),
        Err(e) => Err(GenError::parse(0, format!("Type parse failed: {:?}", e))),
    }
}

/// Parse a `pg_indexes.indexdef` value.
///
/// Expression indexes (`lower(email)`) are rejected: they have no plain
/// column list to query by.
pub fn parse_index_def(input: &str) -> GenResult<IndexDef> {
    let input = input.trim();

    match index_def(input) {
        Ok((_, def)) => Ok(def),
        Err(e) => Err(GenError::parse(0, format!("Index definition parse failed: {:?}", e))),
    }
}

fn sql_type(input: &str) -> IResult<&str, SqlType> {
    let (input, head) = separated_list1(multispace1, word)(input)?;
    let (input, _) = multispace0(input)?;
    let (input, params) = opt(params)(input)?;
    let (input, tail) = many0(preceded(multispace1, word))(input)?;
    let (input, array) = opt(preceded(multispace0, tag("[]")))(input)?;

    let mut name_words = Vec::new();
    let mut unsigned = false;
    for w in head.into_iter().chain(tail) {
        let w = w.to_ascii_lowercase();
        if MODIFIERS.contains(&w.as_str()) {
            unsigned |= w == "unsigned";
        } else {
            name_words.push(w);
        }
    }

    Ok((
        input,
        SqlType {
            name: name_words.join(" "),
            params: params.unwrap_or_default(),
            unsigned,
            array: array.is_some(),
        },
    ))
}

/// Parse a type word (`int`, `varchar`, `precision`).
fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// Parse `(10, 2)` or `('a','b')`.
fn params(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        char('('),
        separated_list0(tuple((multispace0, char(','), multispace0)), param),
        preceded(multispace0, char(')')),
    )(input)
}

fn param(input: &str) -> IResult<&str, String> {
    let (input, _) = multispace0(input)?;
    alt((quoted, map(word, |s| s.to_string())))(input)
}

/// Parse a single-quoted literal, unescaping doubled quotes.
fn quoted(input: &str) -> IResult<&str, String> {
    let (input, _) = char('\'')(input)?;
    let (input, parts) = many0(alt((
        take_while1(|c| c != '\''),
        map(tag("''"), |_| "'"),
    )))(input)?;
    let (input, _) = char('\'')(input)?;
    Ok((input, parts.concat()))
}

fn index_def(input: &str) -> IResult<&str, IndexDef> {
    let (input, _) = tag_no_case("CREATE")(input)?;
    let (input, unique) = opt(preceded(multispace1, tag_no_case("UNIQUE")))(input)?;
    let (input, _) = preceded(multispace1, tag_no_case("INDEX"))(input)?;
    let (input, _) = take_until_no_case(input, " USING ")?;
    let (input, _) = tuple((multispace1, tag_no_case("USING"), multispace1, word, multispace0))(input)?;
    let (input, columns) = delimited(
        char('('),
        separated_list1(tuple((multispace0, char(','), multispace0)), index_column),
        char(')'),
    )(input)?;

    Ok((
        input,
        IndexDef {
            unique: unique.is_some(),
            columns,
        },
    ))
}

/// Skip ahead to `needle` (case-insensitive) without consuming it.
fn take_until_no_case<'a>(input: &'a str, needle: &str) -> IResult<&'a str, &'a str> {
    match input.to_ascii_uppercase().find(needle) {
        Some(pos) => Ok((&input[pos..], &input[..pos])),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TakeUntil,
        ))),
    }
}

/// Parse one index key: `email`, `"Email"`, `created_at DESC NULLS LAST`.
fn index_column(input: &str) -> IResult<&str, String> {
    let (input, name) = alt((
        map(delimited(char('"'), take_while(|c| c != '"'), char('"')), |s: &str| s.to_string()),
        map(word, |s| s.to_string()),
    ))(input)?;
    // Ordering and collation words; an opening paren here means an expression.
    let (input, _) = many0(pair(
        multispace1,
        take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '"'),
    ))(input)?;
    Ok((input, name))
}
