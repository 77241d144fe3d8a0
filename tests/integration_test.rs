// Integration tests for the interpreter

use jstepper::interpreter::{CheckError, Error, RuntimeError};
use jstepper::memory::value::Value;
use jstepper::{Session, SessionConfig};
use pretty_assertions::assert_eq;

fn load(source: &str) -> (Session, Vec<std::rc::Rc<jstepper::parser::ast::Stmt>>) {
    let mut session = Session::new(SessionConfig::default());
    let doc = session.add_document("test.java", source);
    let statements = session.load_script(doc).expect("Loading failed");
    (session, statements)
}

fn run(source: &str) -> Session {
    let (mut session, statements) = load(source);
    let result = session.execute_statements(&statements);
    assert!(result.is_ok(), "Execution failed: {:?}", result);
    session
}

/// Run a program that must fail; returns the session and the error
fn run_failing(source: &str) -> (Session, Error) {
    let mut session = Session::new(SessionConfig::default());
    let doc = session.add_document("test.java", source);
    let error = match session.load_script(doc) {
        Ok(statements) => session
            .execute_statements(&statements)
            .expect_err("Execution should fail"),
        Err(error) => error,
    };
    (session, error)
}

fn int_var(session: &Session, name: &str) -> i32 {
    match session.lookup_toplevel(name).map(|binding| binding.value) {
        Some(Value::Int(n)) => n,
        other => panic!("'{}' is not an int variable: {:?}", name, other),
    }
}

fn bool_var(session: &Session, name: &str) -> bool {
    match session.lookup_toplevel(name).map(|binding| binding.value) {
        Some(Value::Bool(b)) => b,
        other => panic!("'{}' is not a boolean variable: {:?}", name, other),
    }
}

fn runtime_kind(error: &Error) -> &RuntimeError {
    match error {
        Error::Execution { kind, .. } => kind,
        other => panic!("expected an execution error, got {:?}", other),
    }
}

fn check_kind(error: &Error) -> &CheckError {
    match error {
        Error::Check { kind, .. } => kind,
        other => panic!("expected a type error, got {:?}", other),
    }
}

#[test]
fn test_simple_arithmetic() {
    let session = run(r#"
int x = 5;
int y = 10;
int z = x + y * 2;
"#);
    assert_eq!(int_var(&session, "z"), 25);
}

#[test]
fn test_method_call_and_recursion() {
    let session = run(r#"
int add(int a, int b) {
    return a + b;
}

int factorial(int n) {
    if (n <= 1) {
        return 1;
    }
    return n * factorial(n - 1);
}

int sum = add(3, 4);
int fact = factorial(5);
"#);
    assert_eq!(int_var(&session, "sum"), 7);
    assert_eq!(int_var(&session, "fact"), 120);
}

#[test]
fn test_class_with_constructor_and_methods() {
    let session = run(r#"
class Counter {
    int count;
    int step;

    Counter(int step) {
        this.step = step;
    }

    void tick() {
        count = count + step;
    }

    int value() {
        return count;
    }
}

Counter c = new Counter(3);
c.tick();
c.tick();
int v = c.value();
"#);
    assert_eq!(int_var(&session, "v"), 6);
}

#[test]
fn test_arrays_and_for_loops() {
    let session = run(r#"
int[] values = {4, 8, 15, 16, 23, 42};
int total = 0;
for (int i = 0; i < values.length; i++) {
    total += values[i];
}
int[] squares = new int[4];
for (int i = 0; i < squares.length; i++) {
    squares[i] = i * i;
}
int last = squares[3];
"#);
    assert_eq!(int_var(&session, "total"), 108);
    assert_eq!(int_var(&session, "last"), 9);
}

#[test]
fn test_fields_have_default_values() {
    let session = run(r#"
class Node {
    int value;
    boolean marked;
    Node next;
}

Node n = new Node();
int v = n.value;
boolean m = n.marked;
boolean noNext = n.next == null;
"#);
    assert_eq!(int_var(&session, "v"), 0);
    assert!(!bool_var(&session, "m"));
    assert!(bool_var(&session, "noNext"));
}

#[test]
fn test_block_scopes_end() {
    let session = run(r#"
int x = 1;
{
    int y = 2;
    x = x + y;
}
int y = 5;
"#);
    assert_eq!(int_var(&session, "x"), 3);
    assert_eq!(int_var(&session, "y"), 5);
}

#[test]
fn test_inner_declaration_shadows_outer() {
    let session = run(r#"
int x = 1;
int seen = 0;
if (x > 0) {
    int x = 5;
    x = x + 1;
    seen = x;
}
"#);
    assert_eq!(int_var(&session, "seen"), 6);
    assert_eq!(int_var(&session, "x"), 1);
}

#[test]
fn test_method_locals_shadow_toplevel() {
    let session = run(r#"
int x = 1;

int bump(int x) {
    x = x + 100;
    return x;
}

int r = bump(x);
"#);
    assert_eq!(int_var(&session, "r"), 101);
    assert_eq!(int_var(&session, "x"), 1);
}

#[test]
fn test_redeclaration_in_same_scope_is_rejected() {
    let (_, error) = run_failing(r#"
int x = 1;
int x = 2;
"#);
    assert!(error.is_static());
    assert!(matches!(
        check_kind(&error),
        CheckError::Duplicate { name, .. } if name == "x"
    ));
}

#[test]
fn test_integer_wraparound() {
    let session = run(r#"
int big = 2147483647;
int wrapped = big + 1;
int product = 65536 * 65536;
"#);
    assert_eq!(int_var(&session, "wrapped"), i32::MIN);
    assert_eq!(int_var(&session, "product"), 0);
}

#[test]
fn test_short_circuit_skips_right_operand() {
    let session = run(r#"
int zero = 0;
boolean ok = false && (1 / zero == 0);
boolean other = true || (1 / zero == 0);
"#);
    assert!(!bool_var(&session, "ok"));
    assert!(bool_var(&session, "other"));
}

const SHARED_ARRAY: &str = r#"
class Holder {
    int[] items;

    Holder(int[] items) {
        this.items = items;
    }

    int[] getItems() {
        return items;
    }
}

int[] a = {1, 2, 3};
Holder h = new Holder(a);
a[0] = 9;
int first = h.getItems()[0];
"#;

#[test]
fn test_stored_array_is_shared() {
    let session = run(SHARED_ARRAY);
    assert_eq!(int_var(&session, "first"), 9);
}

#[test]
fn test_cloned_array_is_independent() {
    let source = SHARED_ARRAY.replace("this.items = items;", "this.items = items.clone();");
    let session = run(&source);
    assert_eq!(int_var(&session, "first"), 1);
}

#[test]
fn test_arity_mismatch_message() {
    let (_, error) = run_failing(r#"
int add(int a, int b) {
    return a + b;
}

int r = add(1);
"#);
    assert_eq!(
        check_kind(&error),
        &CheckError::ArityMismatch {
            callee: "method 'add'".to_string(),
            expected: 2,
            found: 1,
        }
    );
    assert_eq!(
        error.to_string(),
        "method 'add' expects 2 argument(s) but 1 were given"
    );
}

#[test]
fn test_type_mismatch_explains_declaration() {
    let (_, error) = run_failing("int x = true;\n");
    assert_eq!(error.kind_name(), "Type error");
    assert!(
        error
            .to_string()
            .contains("variable 'x' is declared with type int"),
        "unexpected message: {}",
        error
    );
}

#[test]
fn test_runtime_error_keeps_earlier_effects() {
    let (session, error) = run_failing(r#"
int a = 1;
a = 2;
int b = a / 0;
"#);
    assert_eq!(
        runtime_kind(&error),
        &RuntimeError::DivisionByZero {
            operation: "division"
        }
    );
    assert_eq!(int_var(&session, "a"), 2);
    assert!(session.lookup_toplevel("b").is_none());
    assert_eq!(session.call_stack().depth(), 1);
    assert!(!session.is_suspended());
}

#[test]
fn test_null_dereference() {
    let (_, error) = run_failing(r#"
class Point {
    int x;
}

Point p = null;
int v = p.x;
"#);
    assert_eq!(runtime_kind(&error), &RuntimeError::NullDereference);
}

#[test]
fn test_index_out_of_bounds() {
    let (session, error) = run_failing(r#"
int[] a = new int[3];
a[3] = 1;
"#);
    assert_eq!(
        runtime_kind(&error),
        &RuntimeError::IndexOutOfBounds {
            index: 3,
            length: 3
        }
    );
    let loc = error.loc().expect("error should have a location");
    assert_eq!(session.sources().line_col(loc).0, 3);
}

#[test]
fn test_negative_array_length() {
    let (_, error) = run_failing("int n = -2;\nint[] a = new int[n];\n");
    assert_eq!(
        runtime_kind(&error),
        &RuntimeError::NegativeArrayLength { length: -2 }
    );
}

#[test]
fn test_oversized_array_is_reported() {
    let (session, error) = run_failing("int[] small = new int[2];\nint[] a = new int[2000000000];\n");
    assert_eq!(
        runtime_kind(&error),
        &RuntimeError::ArrayTooLarge {
            length: 2000000000,
            limit: 1 << 20
        }
    );
    let loc = error.loc().expect("error should have a location");
    assert_eq!(session.sources().line_col(loc).0, 2);
    assert_eq!(session.sources().snippet(loc), "2000000000");
    assert!(session.lookup_toplevel("small").is_some());
}

#[test]
fn test_configured_array_limit() {
    let mut session = Session::new(SessionConfig {
        max_array_length: 4,
        ..SessionConfig::default()
    });
    let doc = session.add_document("arrays.java", "int[] a = new int[4];\nint[] b = new int[5];\n");
    let statements = session.load_script(doc).expect("Loading failed");
    let error = session
        .execute_statements(&statements)
        .expect_err("second array exceeds the limit");
    assert_eq!(
        runtime_kind(&error),
        &RuntimeError::ArrayTooLarge { length: 5, limit: 4 }
    );
    assert!(session.lookup_toplevel("a").is_some());
}

#[test]
fn test_recursion_limit() {
    let (_, error) = run_failing(r#"
int forever(int n) {
    return forever(n + 1);
}

int r = forever(0);
"#);
    assert_eq!(
        runtime_kind(&error),
        &RuntimeError::StackOverflow { limit: 100 }
    );
}

#[test]
fn test_mutual_recursion() {
    let session = run(r#"
boolean isEven(int n) {
    if (n == 0) {
        return true;
    }
    return isOdd(n - 1);
}

boolean isOdd(int n) {
    if (n == 0) {
        return false;
    }
    return isEven(n - 1);
}

boolean a = isEven(10);
boolean b = isOdd(7);
boolean c = isEven(7);
"#);
    assert!(bool_var(&session, "a"));
    assert!(bool_var(&session, "b"));
    assert!(!bool_var(&session, "c"));
}

#[test]
fn test_mutual_recursion_limit() {
    let (_, error) = run_failing(r#"
int ping(int n) {
    return pong(n + 1);
}

int pong(int n) {
    return ping(n + 1);
}

int r = ping(0);
"#);
    assert_eq!(
        runtime_kind(&error),
        &RuntimeError::StackOverflow { limit: 100 }
    );
    assert_eq!(error.to_string(), "stack overflow: more than 100 nested calls");
}

#[test]
fn test_loop_iteration_limit() {
    let (session, error) = run_failing(r#"
int i = 0;
while (true) {
    i++;
}
"#);
    assert_eq!(
        runtime_kind(&error),
        &RuntimeError::TooManyIterations { limit: 1000 }
    );
    assert_eq!(int_var(&session, "i"), 1000);
}

#[test]
fn test_configured_limits() {
    let mut session = Session::new(SessionConfig {
        max_loop_iterations: 5,
        ..SessionConfig::default()
    });
    let doc = session.add_document("limits.java", "int i = 0;\nwhile (i < 10) {\n    i++;\n}\n");
    let statements = session.load_script(doc).expect("Loading failed");
    let error = session
        .execute_statements(&statements)
        .expect_err("loop should hit the limit");
    assert_eq!(
        runtime_kind(&error),
        &RuntimeError::TooManyIterations { limit: 5 }
    );
}

#[test]
fn test_assertion_failure() {
    let (_, error) = run_failing("int x = 3;\nassert x == 4;\n");
    assert_eq!(runtime_kind(&error), &RuntimeError::AssertionFailed);
}

#[test]
fn test_missing_return_is_a_runtime_error() {
    let (_, error) = run_failing(r#"
int sign(int n) {
    if (n > 0) {
        return 1;
    }
}

int a = sign(5);
int b = sign(0);
"#);
    assert_eq!(
        runtime_kind(&error),
        &RuntimeError::MissingReturn {
            method: "sign".to_string()
        }
    );
}

#[test]
fn test_evaluate_expression_sees_toplevel() {
    let mut session = run("int x = 21;\n");
    let doc = session.add_document("expr", "x * 2");
    let expr = session.parse_expression(doc).expect("Parsing failed");
    assert_eq!(session.evaluate_expression(&expr).ok(), Some(Value::Int(42)));
    assert_eq!(session.last_result(), Some(Value::Int(42)));
}

#[test]
fn test_statements_in_several_documents() {
    let mut session = run("int x = 1;\n");
    let doc = session.add_document("more", "x = x + 10;\nint y = x;\n");
    let statements = session.parse_statements(doc).expect("Parsing failed");
    session
        .execute_statements(&statements)
        .expect("Execution failed");
    assert_eq!(int_var(&session, "y"), 11);
}

#[test]
fn test_reset_is_deterministic() {
    let source = r#"
class Pair {
    int left;
    int right;
}

Pair p = new Pair();
p.left = 4;
int[] xs = {p.left, 2};
"#;
    let (mut session, statements) = load(source);
    session
        .execute_statements(&statements)
        .expect("Execution failed");
    session.collect_garbage();
    let first_heap = session.heap().visible_objects().len();
    let first_p = session.render_value(session.lookup_toplevel("p").map_or(Value::Null, |b| b.value));

    session.reset();
    assert!(session.lookup_toplevel("p").is_none());
    assert_eq!(session.heap().len(), 0);

    session
        .execute_statements(&statements)
        .expect("Execution after reset failed");
    session.collect_garbage();
    assert_eq!(session.heap().visible_objects().len(), first_heap);
    let second_p = session.render_value(session.lookup_toplevel("p").map_or(Value::Null, |b| b.value));
    assert_eq!(first_p, second_p);
    assert_eq!(first_p, "Pair#1");
}

#[test]
fn test_unreachable_objects_are_hidden() {
    let mut session = run(r#"
int[] a = new int[2];
a = new int[3];
"#);
    assert_eq!(session.heap().len(), 2);
    assert_eq!(session.collect_garbage(), 1);
    let visible = session.heap().visible_objects();
    assert_eq!(visible.len(), 1);
    assert_eq!(
        session.lookup_toplevel("a").map(|b| b.value),
        Some(Value::Ref(visible[0].0))
    );
}
