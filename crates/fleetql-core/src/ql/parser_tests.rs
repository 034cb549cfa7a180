//! Tests for the RSQL parser.

use super::*;

fn comparison(expr: &FilterExpression) -> &Comparison {
    match expr {
        FilterExpression::Comparison(c) => c,
        other => panic!("expected comparison, got {other:?}"),
    }
}

// =========================================================================
// Single comparisons
// =========================================================================

#[test]
fn test_parse_simple_equality() {
    // Arrange & Act
    let expr = Parser::parse("name==alpha").expect("valid");

    // Assert
    let c = comparison(&expr);
    assert_eq!(c.field.to_string(), "name");
    assert_eq!(c.operator, Operator::Eq);
    assert_eq!(c.argument, Argument::Single(Literal::bare("alpha")));
    assert_eq!(c.position, 0);
}

#[test]
fn test_parse_all_operator_spellings() {
    let cases = [
        ("id==1", Operator::Eq),
        ("id!=1", Operator::Ne),
        ("id=lt=1", Operator::Lt),
        ("id<1", Operator::Lt),
        ("id=le=1", Operator::Le),
        ("id<=1", Operator::Le),
        ("id=gt=1", Operator::Gt),
        ("id>1", Operator::Gt),
        ("id=ge=1", Operator::Ge),
        ("id>=1", Operator::Ge),
        ("id=in=1", Operator::In),
        ("id=out=1", Operator::Out),
        ("id=is=null", Operator::Is),
        ("id=not=null", Operator::Not),
        ("id=IN=1", Operator::In),
        ("id=Gt=1", Operator::Gt),
    ];

    for (query, expected) in cases {
        let expr = Parser::parse(query).unwrap_or_else(|e| panic!("{query}: {e}"));
        assert_eq!(comparison(&expr).operator, expected, "{query}");
    }
}

#[test]
fn test_parse_unknown_named_operator_is_rejected() {
    // Act
    let err = Parser::parse("name=like=foo").unwrap_err();

    // Assert
    assert_eq!(err.kind, ParseErrorKind::UnsupportedOperator);
    assert_eq!(err.fragment, "=like=");
    assert_eq!(err.position, 4);
}

#[test]
fn test_parse_value_list() {
    // Act
    let expr = Parser::parse("updateStatus=in=(pending, error ,in_sync)").expect("valid");

    // Assert
    let c = comparison(&expr);
    let texts: Vec<&str> = c.argument.literals().iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["pending", "error", "in_sync"]);
}

#[test]
fn test_parse_list_rejected_for_equality() {
    let err = Parser::parse("name==(a,b)").unwrap_err();

    assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
}

#[test]
fn test_parse_dotted_selector() {
    let expr = Parser::parse("distributionSet.name==DS1").expect("valid");

    let c = comparison(&expr);
    assert_eq!(c.field.segments(), &["distributionSet", "name"]);
    assert_eq!(c.field.head(), "distributionSet");
    assert_eq!(c.field.tail().as_deref(), Some("name"));
}

#[test]
fn test_parse_rejects_empty_path_segment() {
    assert!(Parser::parse("metadata..key==x").is_err());
    assert!(Parser::parse(".name==x").is_err());
}

// =========================================================================
// Quoting
// =========================================================================

#[test]
fn test_parse_quoted_values_keep_separators() {
    // Act
    let expr = Parser::parse(r#"description=="a,b;c (d)""#).expect("valid");

    // Assert
    let c = comparison(&expr);
    assert_eq!(c.argument, Argument::Single(Literal::quoted("a,b;c (d)")));
}

#[test]
fn test_parse_single_quoted_with_escaped_quote() {
    let expr = Parser::parse(r"name=='it\'s'").expect("valid");

    assert_eq!(
        comparison(&expr).argument,
        Argument::Single(Literal::quoted("it's"))
    );
}

#[test]
fn test_parse_quoted_keeps_star_escape() {
    let expr = Parser::parse(r#"name=="a\*b""#).expect("valid");

    assert_eq!(
        comparison(&expr).argument,
        Argument::Single(Literal::quoted(r"a\*b"))
    );
}

#[test]
fn test_parse_empty_quoted_value() {
    let expr = Parser::parse("description==''").expect("valid");

    assert_eq!(
        comparison(&expr).argument,
        Argument::Single(Literal::quoted(""))
    );
}

#[test]
fn test_quoted_null_is_not_null_keyword() {
    let expr = Parser::parse("name=='null'").expect("valid");
    let c = comparison(&expr);

    assert!(!c.argument.literals()[0].is_null_keyword());
}

// =========================================================================
// Logical structure
// =========================================================================

#[test]
fn test_parse_and_binds_tighter_than_or() {
    // Act
    let expr = Parser::parse("a==1;b==2,c==3").expect("valid");

    // Assert
    match expr {
        FilterExpression::Or(branches) => {
            assert_eq!(branches.len(), 2);
            assert!(matches!(&branches[0], FilterExpression::And(terms) if terms.len() == 2));
            assert!(matches!(&branches[1], FilterExpression::Comparison(_)));
        }
        other => panic!("expected OR at the root, got {other:?}"),
    }
}

#[test]
fn test_parse_parentheses_override_precedence() {
    let expr = Parser::parse("a==1;(b==2,c==3)").expect("valid");

    match expr {
        FilterExpression::And(terms) => {
            assert_eq!(terms.len(), 2);
            assert!(matches!(&terms[1], FilterExpression::Or(b) if b.len() == 2));
        }
        other => panic!("expected AND at the root, got {other:?}"),
    }
}

#[test]
fn test_parse_keyword_operators_and_whitespace() {
    // Arrange
    let keyword = Parser::parse("a==1 and b==2 or c==3").expect("valid");
    let symbolic = Parser::parse("a==1;b==2,c==3").expect("valid");

    // Assert - same tree modulo positions
    let strip = |e: &FilterExpression| {
        e.comparisons()
            .map(|c| (c.field.to_string(), c.operator))
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(&keyword), strip(&symbolic));
    assert!(matches!(keyword, FilterExpression::Or(_)));
}

#[test]
fn test_parse_keyword_prefix_in_value_is_not_an_operator() {
    let expr = Parser::parse("name==android;group==oregon").expect("valid");

    let values: Vec<String> = expr
        .comparisons()
        .map(|c| c.argument.literals()[0].text.clone())
        .collect();
    assert_eq!(values, vec!["android", "oregon"]);
}

#[test]
fn test_parse_spaces_around_operator() {
    let expr = Parser::parse("  name == alpha  ").expect("valid");

    assert_eq!(comparison(&expr).field.to_string(), "name");
}

// =========================================================================
// Errors
// =========================================================================

#[test]
fn test_parse_empty_input() {
    let err = Parser::parse("   ").unwrap_err();

    assert_eq!(err.kind, ParseErrorKind::SyntaxError);
}

#[test]
fn test_parse_reports_position_of_syntax_error() {
    // Act
    let err = Parser::parse("name==a;;b==c").unwrap_err();

    // Assert
    assert_eq!(err.kind, ParseErrorKind::SyntaxError);
    assert!(err.position >= 7, "position {} too early", err.position);
}

#[test]
fn test_parse_unbalanced_parentheses() {
    assert!(Parser::parse("(name==a").is_err());
    assert!(Parser::parse("name==a)").is_err());
}

#[test]
fn test_parse_missing_value() {
    assert!(Parser::parse("name==").is_err());
    assert!(Parser::parse("name").is_err());
}

#[test]
fn test_parse_unterminated_quote() {
    assert!(Parser::parse("name=='abc").is_err());
}
