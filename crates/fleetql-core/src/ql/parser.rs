//! RSQL parser implementation using pest.

use pest::iterators::Pair;
use pest::Parser as PestParser;
use pest_derive::Parser;
use tracing::debug;

use super::ast::{Argument, Comparison, FieldPath, FilterExpression, Literal, Operator};
use super::error::{ParseError, ParseErrorKind};

#[derive(Parser)]
#[grammar = "ql/grammar.pest"]
pub(crate) struct RsqlGrammar;

/// RSQL filter parser.
pub struct Parser;

impl Parser {
    /// Parses an RSQL filter string into a syntax tree.
    ///
    /// No schema is consulted; see [`crate::ql::bind`] for field validation.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a valid RSQL expression.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use fleetql_core::ql::Parser;
    ///
    /// let expr = Parser::parse("name==DS1*,version=in=(1.0,2.0)")?;
    /// ```
    pub fn parse(input: &str) -> Result<FilterExpression, ParseError> {
        if input.trim().is_empty() {
            return Err(ParseError::syntax(0, "", "Empty filter expression"));
        }

        let pairs = RsqlGrammar::parse(Rule::query, input).map_err(|e| {
            let position = match e.location {
                pest::error::InputLocation::Pos(p) => p,
                pest::error::InputLocation::Span((s, _)) => s,
            };
            ParseError::new(
                ParseErrorKind::SyntaxError,
                position,
                input.get(position..).unwrap_or("").chars().take(50).collect::<String>(),
                e.variant.message().to_string(),
            )
        })?;

        let or_expr = pairs
            .into_iter()
            .next()
            .and_then(|query| query.into_inner().find(|p| p.as_rule() == Rule::or_expr))
            .ok_or_else(|| ParseError::syntax(0, input, "Expected filter expression"))?;

        let expr = Self::parse_or_expr(or_expr)?;
        debug!(query = input, "parsed filter expression");
        Ok(expr)
    }

    fn parse_or_expr(pair: Pair<'_, Rule>) -> Result<FilterExpression, ParseError> {
        let mut branches = pair
            .into_inner()
            .filter(|p| p.as_rule() == Rule::and_expr)
            .map(Self::parse_and_expr)
            .collect::<Result<Vec<_>, _>>()?;

        match branches.len() {
            0 => Err(ParseError::syntax(0, "", "Expected condition")),
            1 => Ok(branches.remove(0)),
            _ => Ok(FilterExpression::Or(branches)),
        }
    }

    fn parse_and_expr(pair: Pair<'_, Rule>) -> Result<FilterExpression, ParseError> {
        let mut terms = pair
            .into_inner()
            .filter(|p| matches!(p.as_rule(), Rule::group | Rule::comparison))
            .map(Self::parse_primary)
            .collect::<Result<Vec<_>, _>>()?;

        match terms.len() {
            0 => Err(ParseError::syntax(0, "", "Expected condition")),
            1 => Ok(terms.remove(0)),
            _ => Ok(FilterExpression::And(terms)),
        }
    }

    fn parse_primary(pair: Pair<'_, Rule>) -> Result<FilterExpression, ParseError> {
        match pair.as_rule() {
            Rule::group => {
                let position = pair.as_span().start();
                let inner = pair
                    .into_inner()
                    .next()
                    .ok_or_else(|| ParseError::syntax(position, "(", "Empty group"))?;
                Self::parse_or_expr(inner)
            }
            Rule::comparison => Self::parse_comparison(pair).map(FilterExpression::Comparison),
            _ => Err(ParseError::unexpected_token(
                pair.as_span().start(),
                pair.as_str(),
                "comparison or group",
            )),
        }
    }

    fn parse_comparison(pair: Pair<'_, Rule>) -> Result<Comparison, ParseError> {
        let position = pair.as_span().start();
        let text = pair.as_str().to_string();
        let mut inner = pair.into_inner();

        let selector = inner
            .next()
            .ok_or_else(|| ParseError::unexpected_token(position, &text, "field name"))?;
        let comparator = inner
            .next()
            .ok_or_else(|| ParseError::unexpected_token(position, &text, "operator"))?;
        let arguments = inner
            .next()
            .ok_or_else(|| ParseError::unexpected_token(position, &text, "value"))?;

        let field = FieldPath::parse(selector.as_str());
        if field.segments().iter().any(String::is_empty) {
            return Err(ParseError::syntax(
                position,
                selector.as_str(),
                format!("Invalid field path '{}'", selector.as_str()),
            ));
        }

        let operator = Operator::from_token(comparator.as_str()).ok_or_else(|| {
            ParseError::unsupported_operator(
                comparator.as_span().start(),
                comparator.as_str(),
                format!("Unknown operator '{}'", comparator.as_str()),
            )
        })?;

        let argument = Self::parse_arguments(arguments)?;
        if matches!(argument, Argument::List(_)) && !operator.takes_list() {
            return Err(ParseError::unexpected_token(
                position,
                text,
                &format!("a single value for operator '{operator}'"),
            ));
        }

        Ok(Comparison {
            field,
            operator,
            argument,
            position,
        })
    }

    fn parse_arguments(pair: Pair<'_, Rule>) -> Result<Argument, ParseError> {
        let position = pair.as_span().start();
        let inner = pair
            .into_inner()
            .next()
            .ok_or_else(|| ParseError::unexpected_token(position, "", "value"))?;

        if inner.as_rule() == Rule::argument_list {
            Ok(Argument::List(
                inner.into_inner().map(Self::parse_literal).collect(),
            ))
        } else {
            Ok(Argument::Single(Self::parse_literal(inner)))
        }
    }

    fn parse_literal(pair: Pair<'_, Rule>) -> Literal {
        let raw = pair.as_str();
        match pair.as_rule() {
            Rule::double_quoted => Literal::quoted(unquote(raw, '"')),
            Rule::single_quoted => Literal::quoted(unquote(raw, '\'')),
            _ => Literal::bare(raw),
        }
    }
}

/// Removes surrounding quotes and resolves `\"`, `\'` and `\\`.
///
/// Other backslash sequences are kept verbatim so `\*` still reaches the binder.
fn unquote(raw: &str, quote: char) -> String {
    let inner = raw
        .strip_prefix(quote)
        .and_then(|s| s.strip_suffix(quote))
        .unwrap_or(raw);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next) if next == quote || next == '\\' => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}
