//! Rule text parser
//!
//! Parses the textual rule form into [`Rule`] / [`Antecedent`] values:
//!
//! ```text
//!   rule       := "if" expr "then" consequent ("," consequent)*
//!   expr       := and_term (("or" | "|") and_term)*
//!   and_term   := not_term (("and" | "&") not_term)*
//!   not_term   := "not" not_term | "(" expr ")" | condition
//!   condition  := name "is" name
//!   consequent := name "is" name ("with" number)?
//! ```
//!
//! NOT binds tighter than AND, AND tighter than OR; parentheses override.
//! Keywords are lowercase and reserved, so a variable or term cannot be
//! named `is`, `and`, `not` and so on. The parser checks syntax only;
//! variable and term references are validated when the rule is added to a
//! rule base.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, opt, recognize, value, verify},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, pair, preceded, tuple},
};

use crate::rule::{Antecedent, Consequent, Rule};

/// Parser error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Unexpected trailing input: '{rest}'")]
    TrailingInput { rest: String },

    #[error("Unexpected end of input")]
    UnexpectedEof,
}

/// Words the grammar claims for itself
const KEYWORDS: &[&str] = &["if", "then", "is", "and", "or", "not", "with"];

fn syntax(full: &str, err: nom::Err<nom::error::Error<&str>>, message: &str) -> ParseError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => ParseError::Syntax {
            position: full.len() - e.input.len(),
            message: message.to_string(),
        },
        nom::Err::Incomplete(_) => ParseError::UnexpectedEof,
    }
}

// ============================================================================
// Tokens
// ============================================================================

fn ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

fn ws1(input: &str) -> IResult<&str, &str> {
    multispace1(input)
}

/// A word: letter or underscore, then letters, digits, underscores
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

/// An identifier that is not a reserved keyword
fn name(input: &str) -> IResult<&str, &str> {
    verify(identifier, |w: &str| !KEYWORDS.contains(&w))(input)
}

/// A specific keyword, matched as a whole word
fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    verify(identifier, move |w: &str| w == kw)
}

// ============================================================================
// Grammar
// ============================================================================

/// `<variable> is <term>` leaf
fn condition(input: &str) -> IResult<&str, Antecedent> {
    map(
        tuple((name, delimited(ws1, keyword("is"), ws1), name)),
        |(variable, _, term)| Antecedent::is(variable, term),
    )(input)
}

fn primary(input: &str) -> IResult<&str, Antecedent> {
    alt((
        delimited(pair(char('('), ws), or_expr, pair(ws, char(')'))),
        condition,
    ))(input)
}

fn not_term(input: &str) -> IResult<&str, Antecedent> {
    alt((
        map(preceded(pair(keyword("not"), ws), not_term), Antecedent::not),
        primary,
    ))(input)
}

fn and_op(input: &str) -> IResult<&str, ()> {
    delimited(
        ws,
        alt((value((), keyword("and")), value((), char('&')))),
        ws,
    )(input)
}

fn or_op(input: &str) -> IResult<&str, ()> {
    delimited(
        ws,
        alt((value((), keyword("or")), value((), char('|')))),
        ws,
    )(input)
}

fn and_term(input: &str) -> IResult<&str, Antecedent> {
    let (input, first) = not_term(input)?;
    let (input, rest) = many0(preceded(and_op, not_term))(input)?;
    Ok((input, rest.into_iter().fold(first, |acc, rhs| acc.and(rhs))))
}

fn or_expr(input: &str) -> IResult<&str, Antecedent> {
    let (input, first) = and_term(input)?;
    let (input, rest) = many0(preceded(or_op, and_term))(input)?;
    Ok((input, rest.into_iter().fold(first, |acc, rhs| acc.or(rhs))))
}

/// `<variable> is <term> [with <weight>]`
fn consequent(input: &str) -> IResult<&str, Consequent> {
    map(
        tuple((
            name,
            delimited(ws1, keyword("is"), ws1),
            name,
            opt(preceded(delimited(ws1, keyword("with"), ws1), double)),
        )),
        |(variable, _, term, weight)| match weight {
            Some(w) => Consequent::new(variable, term).with_weight(w),
            None => Consequent::new(variable, term),
        },
    )(input)
}

// ============================================================================
// Entry points
// ============================================================================

/// Parse a full `if ... then ...` rule
pub fn parse_rule(text: &str) -> Result<Rule, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::UnexpectedEof);
    }
    let (rest, _) = ws(text).map_err(|e| syntax(text, e, "expected rule"))?;
    let (rest, _) = keyword("if")(rest).map_err(|e| syntax(text, e, "expected 'if'"))?;
    let (rest, _) = ws(rest).map_err(|e| syntax(text, e, "expected antecedent"))?;
    let (rest, antecedent) =
        or_expr(rest).map_err(|e| syntax(text, e, "expected antecedent expression"))?;
    let (rest, _) = ws(rest).map_err(|e| syntax(text, e, "expected 'then'"))?;
    let (rest, _) = keyword("then")(rest).map_err(|e| syntax(text, e, "expected 'then'"))?;
    let (rest, _) = ws(rest).map_err(|e| syntax(text, e, "expected consequent"))?;
    let (rest, consequents) = separated_list1(delimited(ws, char(','), ws), consequent)(rest)
        .map_err(|e| syntax(text, e, "expected consequent"))?;
    let (rest, _) = ws(rest).map_err(|e| syntax(text, e, "expected end of rule"))?;
    if !rest.is_empty() {
        return Err(ParseError::TrailingInput {
            rest: rest.to_string(),
        });
    }
    Ok(Rule {
        label: None,
        antecedent,
        consequents,
    })
}

/// Parse a bare antecedent expression
pub fn parse_antecedent(text: &str) -> Result<Antecedent, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::UnexpectedEof);
    }
    let (rest, _) = ws(text).map_err(|e| syntax(text, e, "expected expression"))?;
    let (rest, antecedent) =
        or_expr(rest).map_err(|e| syntax(text, e, "expected antecedent expression"))?;
    let (rest, _) = ws(rest).map_err(|e| syntax(text, e, "expected end of input"))?;
    if !rest.is_empty() {
        return Err(ParseError::TrailingInput {
            rest: rest.to_string(),
        });
    }
    Ok(antecedent)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_rule() {
        let rule =
            parse_rule("if water_level is low and rice_quantity is low then cooking_time is short")
                .unwrap();
        let expected = Rule::when(
            Antecedent::is("water_level", "low").and(Antecedent::is("rice_quantity", "low")),
        )
        .then("cooking_time", "short");
        assert_eq!(rule, expected);
    }

    #[test]
    fn test_parse_weighted_consequent() {
        let rule = parse_rule("if water_level is high then cooking_time is long with 0.8").unwrap();
        assert_eq!(rule.consequents.len(), 1);
        assert_eq!(rule.consequents[0].variable, "cooking_time");
        assert_eq!(rule.consequents[0].term, "long");
        assert!((rule.consequents[0].weight - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_parse_multiple_consequents() {
        let rule =
            parse_rule("if water_level is high then cooking_time is long, steam_vent is open with 0.5")
                .unwrap();
        assert_eq!(rule.consequents.len(), 2);
        assert_eq!(rule.consequents[0].weight, 1.0);
        assert_eq!(rule.consequents[1].variable, "steam_vent");
        assert!((rule.consequents[1].weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_precedence_not_over_and_over_or() {
        let parsed =
            parse_antecedent("alarm is on or door is open and not light is off").unwrap();
        let expected = Antecedent::is("alarm", "on").or(
            Antecedent::is("door", "open").and(Antecedent::is("light", "off").not()),
        );
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_symbol_operators() {
        let parsed = parse_antecedent("a is x & b is y | c is z").unwrap();
        let expected = Antecedent::is("a", "x")
            .and(Antecedent::is("b", "y"))
            .or(Antecedent::is("c", "z"));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let parsed = parse_antecedent("(a is x or b is y) and c is z").unwrap();
        let expected = Antecedent::is("a", "x")
            .or(Antecedent::is("b", "y"))
            .and(Antecedent::is("c", "z"));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_not_variants() {
        let parsed = parse_antecedent("not not a is x").unwrap();
        assert_eq!(parsed, Antecedent::is("a", "x").not().not());

        let parsed = parse_antecedent("not (a is x and b is y)").unwrap();
        let expected = Antecedent::is("a", "x").and(Antecedent::is("b", "y")).not();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_display_round_trip() {
        let original = Antecedent::is("water_level", "low")
            .or(Antecedent::is("water_level", "high"))
            .and(Antecedent::is("rice_quantity", "medium").not());
        let reparsed = parse_antecedent(&original.to_string()).unwrap();
        assert_eq!(reparsed, original);

        let rule = Rule::when(Antecedent::is("water_level", "high"))
            .then_weighted("cooking_time", "long", 0.75);
        let reparsed = parse_rule(&rule.to_string()).unwrap();
        assert_eq!(reparsed, rule);
    }

    #[test]
    fn test_whitespace_tolerance() {
        let rule =
            parse_rule("  if   water_level is low   then   cooking_time is short  ").unwrap();
        assert_eq!(rule.consequents[0].term, "short");
    }

    #[test]
    fn test_missing_then() {
        let err = parse_rule("if water_level is low cooking_time is short").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }), "got {:?}", err);
    }

    #[test]
    fn test_trailing_input() {
        let err = parse_rule("if a is x then b is y garbage").unwrap_err();
        match err {
            ParseError::TrailingInput { rest } => assert_eq!(rest, "garbage"),
            other => panic!("expected trailing input error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_rule(""), Err(ParseError::UnexpectedEof)));
        assert!(matches!(parse_antecedent("   "), Err(ParseError::UnexpectedEof)));
    }

    #[test]
    fn test_keywords_are_reserved() {
        assert!(parse_antecedent("not is low").is_err());
        assert!(parse_rule("if and is x then b is y").is_err());
    }

    #[test]
    fn test_bad_weight_literal() {
        let err = parse_rule("if a is x then b is y with fast").unwrap_err();
        // 'with fast' fails the weight branch, leaving 'with fast' trailing
        assert!(matches!(
            err,
            ParseError::TrailingInput { .. } | ParseError::Syntax { .. }
        ));
    }

    #[test]
    fn test_error_position_points_into_input() {
        let text = "if a is x then ???";
        match parse_rule(text).unwrap_err() {
            ParseError::Syntax { position, .. } => {
                assert!(position <= text.len());
                assert!(position >= text.find("then").unwrap());
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }
}
