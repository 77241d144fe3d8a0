use jstepper::interpreter::{Error, RuntimeError};
use jstepper::memory::value::Value;
use jstepper::{Session, SessionConfig};
use pretty_assertions::assert_eq;

/// Evaluate a single expression in a fresh session
fn eval(source: &str) -> Result<Value, Error> {
    let mut session = Session::new(SessionConfig::default());
    let doc = session.add_document("expr", source);
    let expr = session.parse_expression(doc)?;
    session.evaluate_expression(&expr)
}

fn eval_int(source: &str) -> i32 {
    match eval(source) {
        Ok(Value::Int(n)) => n,
        other => panic!("{} did not produce an int: {:?}", source, other),
    }
}

fn eval_bool(source: &str) -> bool {
    match eval(source) {
        Ok(Value::Bool(b)) => b,
        other => panic!("{} did not produce a boolean: {:?}", source, other),
    }
}

/// Run statements and read back an int variable
fn run_int(source: &str, name: &str) -> i32 {
    let mut session = Session::new(SessionConfig::default());
    let doc = session.add_document("test.java", source);
    let statements = session.parse_statements(doc).expect("Parsing failed");
    session
        .execute_statements(&statements)
        .expect("Execution failed");
    match session.lookup_toplevel(name).map(|binding| binding.value) {
        Some(Value::Int(n)) => n,
        other => panic!("'{}' is not an int variable: {:?}", name, other),
    }
}

#[test]
fn test_precedence_and_associativity() {
    assert_eq!(eval_int("1 + 2 * 3"), 7);
    assert_eq!(eval_int("(1 + 2) * 3"), 9);
    assert_eq!(eval_int("10 - 4 - 3"), 3);
    assert_eq!(eval_int("2 * 3 % 4"), 2);
    assert_eq!(eval_int("-3 + 5"), 2);
}

#[test]
fn test_division_truncates_toward_zero() {
    assert_eq!(eval_int("7 / 2"), 3);
    assert_eq!(eval_int("-7 / 2"), -3);
    assert_eq!(eval_int("7 / -2"), -3);
    assert_eq!(eval_int("-7 % 2"), -1);
    assert_eq!(eval_int("7 % -2"), 1);
}

#[test]
fn test_division_by_zero() {
    let error = eval("1 / 0").expect_err("division by zero should fail");
    assert!(matches!(
        error,
        Error::Execution {
            kind: RuntimeError::DivisionByZero {
                operation: "division"
            },
            ..
        }
    ));
    assert_eq!(error.to_string(), "division by zero");

    let error = eval("1 % 0").expect_err("remainder by zero should fail");
    assert_eq!(error.to_string(), "remainder by zero");
}

#[test]
fn test_overflow_wraps() {
    assert_eq!(eval_int("2147483647 + 1"), i32::MIN);
    assert_eq!(eval_int("-2147483647 - 2"), i32::MAX);
    assert_eq!(eval_int("(-2147483647 - 1) / -1"), i32::MIN);
    assert_eq!(eval_int("(-2147483647 - 1) % -1"), 0);
}

#[test]
fn test_shifts_and_bitwise() {
    assert_eq!(eval_int("1 << 33"), 2);
    assert_eq!(eval_int("-8 >> 1"), -4);
    assert_eq!(eval_int("-1 >>> 28"), 15);
    assert_eq!(eval_int("12 & 10"), 8);
    assert_eq!(eval_int("12 | 10"), 14);
    assert_eq!(eval_int("12 ^ 10"), 6);
    assert_eq!(eval_int("~0"), -1);
}

#[test]
fn test_boolean_operators() {
    assert!(eval_bool("true & !false"));
    assert!(eval_bool("true ^ false"));
    assert!(!eval_bool("true ^ true"));
    assert!(eval_bool("false | true"));
    assert!(eval_bool("1 < 2 && 2 <= 2"));
    assert!(eval_bool("3 != 4 || false"));
    assert!(!eval_bool("true == false"));
}

#[test]
fn test_compound_assignment_and_increments() {
    let source = "int x = 5;\nx += 3;\nx *= 2;\nx -= 1;\nx /= 3;\nx %= 4;\n";
    assert_eq!(run_int(source, "x"), 1);

    let source = "int i = 0;\nint a = i++;\nint b = ++i;\nint c = i--;\n";
    assert_eq!(run_int(source, "a"), 0);
    assert_eq!(run_int(source, "b"), 2);
    assert_eq!(run_int(source, "c"), 2);
    assert_eq!(run_int(source, "i"), 1);
}

#[test]
fn test_compound_assignment_on_elements() {
    let source = "int[] a = {1, 2, 3};\na[1] += 10;\na[2]++;\nint s = a[0] + a[1] + a[2];\n";
    assert_eq!(run_int(source, "s"), 17);
}
