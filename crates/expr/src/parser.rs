//! A `nom`-based parser for the cell expression language.
use super::ast::{BinaryOperator, Expression, PathSegment, Selection, UnaryOperator};
use crate::error::ExprError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{alpha1, char, multispace0, u64 as nom_u64},
    combinator::{map, recognize},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded},
};
use serde_json::{Value, json};

// --- Main Public Parser ---

pub fn parse_expression(input: &str) -> Result<Expression, ExprError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(ExprError::Parse(
            input.to_string(),
            format!("Parser did not consume all input. Remainder: '{}'", rem),
        )),
        Err(e) => Err(ExprError::Parse(input.to_string(), e.to_string())),
    }
}

// --- Precedence ladder ---
// or < and < equality < relational < additive < multiplicative < unary

fn expression(input: &str) -> IResult<&str, Expression> {
    or_expr(input)
}

fn binary_chain<'a>(
    mut operand: impl FnMut(&'a str) -> IResult<&'a str, Expression>,
    mut operator: impl FnMut(&'a str) -> IResult<&'a str, BinaryOperator>,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression> {
    move |input| {
        let (mut input, mut left) = operand(input)?;
        loop {
            let Ok((rest, op)) = operator(input) else {
                return Ok((input, left));
            };
            let (rest, right) = operand(rest)?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
            input = rest;
        }
    }
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(and_expr, |i| {
        map(ws(keyword("or")), |_| BinaryOperator::Or).parse(i)
    })(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(equality_expr, |i| {
        map(ws(keyword("and")), |_| BinaryOperator::And).parse(i)
    })(input)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(relational_expr, |i| {
        ws(alt((
            map(tag("=="), |_| BinaryOperator::Equals),
            map(tag("!="), |_| BinaryOperator::NotEquals),
            map(tag("="), |_| BinaryOperator::Equals),
        )))
        .parse(i)
    })(input)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(additive_expr, |i| {
        ws(alt((
            map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
            map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
            map(tag("<"), |_| BinaryOperator::LessThan),
            map(tag(">"), |_| BinaryOperator::GreaterThan),
        )))
        .parse(i)
    })(input)
}

fn additive_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(multiplicative_expr, |i| {
        ws(alt((
            map(tag("+"), |_| BinaryOperator::Plus),
            map(tag("-"), |_| BinaryOperator::Minus),
        )))
        .parse(i)
    })(input)
}

fn multiplicative_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(unary_expr, |i| {
        ws(alt((
            map(tag("*"), |_| BinaryOperator::Multiply),
            map(tag("/"), |_| BinaryOperator::Divide),
            map(tag("%"), |_| BinaryOperator::Modulo),
        )))
        .parse(i)
    })(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    alt((
        map(preceded(ws(char('-')), unary_expr), |expr| Expression::Unary {
            op: UnaryOperator::Minus,
            expr: Box::new(expr),
        }),
        map(preceded(ws(keyword("not")), unary_expr), |expr| Expression::Unary {
            op: UnaryOperator::Not,
            expr: Box::new(expr),
        }),
        primary,
    ))
    .parse(input)
}

fn primary(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        delimited(char('('), expression, ws(char(')'))),
        map(literal, Expression::Literal),
        function_call, // Must be before selection to parse `func()` not `func`
        map(selection, Expression::Selection),
    )))
    .parse(input)
}

// --- Literal Parsers ---

fn boolean(input: &str) -> IResult<&str, Value> {
    alt((
        map(keyword("true"), |_| json!(true)),
        map(keyword("false"), |_| json!(false)),
    ))
    .parse(input)
}

fn null(input: &str) -> IResult<&str, Value> {
    map(keyword("null"), |_| json!(null)).parse(input)
}

fn string_literal(input: &str) -> IResult<&str, Value> {
    alt((
        map(delimited(char('\''), is_not("'"), char('\'')), |s: &str| json!(s)),
        map(tag("''"), |_| json!("")),
    ))
    .parse(input)
}

fn number(input: &str) -> IResult<&str, Value> {
    // Reject a leading sign so `-x` stays a unary expression.
    if input.starts_with(['-', '+']) {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }
    map(double, Value::from).parse(input)
}

fn literal(input: &str) -> IResult<&str, Value> {
    alt((null, boolean, number, string_literal)).parse(input)
}

// --- Path/Selection Parser ---

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// Matches a bare word exactly, refusing to match a prefix of a longer
/// identifier (so `or` never matches inside `order`).
fn keyword(word: &'static str) -> impl Fn(&str) -> IResult<&str, &str> {
    move |input| {
        let (rest, matched) = tag(word).parse(input)?;
        if rest.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            )));
        }
        Ok((rest, matched))
    }
}

fn key_segment(input: &str) -> IResult<&str, PathSegment> {
    map(preceded(char('.'), identifier), |s| {
        PathSegment::Key(s.to_string())
    })
    .parse(input)
}

fn index_segment(input: &str) -> IResult<&str, PathSegment> {
    map(delimited(char('['), nom_u64, char(']')), |i| {
        PathSegment::Index(i as usize)
    })
    .parse(input)
}

fn path_segment(input: &str) -> IResult<&str, PathSegment> {
    alt((key_segment, index_segment)).parse(input)
}

fn selection(input: &str) -> IResult<&str, Selection> {
    map(
        pair(identifier, many0(path_segment)),
        |(start, mut rest)| {
            let mut segments = vec![PathSegment::Key(start.to_string())];
            segments.append(&mut rest);
            Selection { segments }
        },
    )
    .parse(input)
}

// --- Function Call Parser ---

fn function_call(input: &str) -> IResult<&str, Expression> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        char(')'),
    )
    .parse(input)?;

    Ok((
        input,
        Expression::FunctionCall {
            name: name.to_string(),
            args,
        },
    ))
}

/// A combinator that takes a parser `inner` and produces a parser that consumes surrounding whitespace.
fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}
