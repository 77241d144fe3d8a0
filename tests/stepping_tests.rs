// Suspension and resumption of executions

use jstepper::interpreter::{Error, Outcome, StepCommand, StepPoint};
use jstepper::memory::value::Value;
use jstepper::parser::ast::Stmt;
use jstepper::{Session, SessionConfig};
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn load(source: &str) -> (Session, Vec<Rc<Stmt>>) {
    let mut session = Session::new(SessionConfig::default());
    let doc = session.add_document("test.java", source);
    let statements = session.load_script(doc).expect("Loading failed");
    (session, statements)
}

fn suspended(outcome: Result<Outcome, Error>) -> StepPoint {
    match outcome {
        Ok(Outcome::Suspended(point)) => point,
        other => panic!("expected a suspension, got {:?}", other),
    }
}

/// Zero-based line of the range about to be evaluated
fn line_of(session: &Session, point: &StepPoint) -> usize {
    session.sources().line_index(point.instr_loc)
}

fn snippet(session: &Session, point: &StepPoint) -> String {
    session.sources().snippet(point.instr_loc).to_string()
}

const TWICE: &str = "int twice(int n) {
    int m = n * 2;
    return m;
}

int a = twice(3);
int b = a + 1;
";

#[test]
fn test_small_step_visits_operands_first() {
    let (mut session, statements) = load("int x = 1 + 2 * 3;\n");
    let first = suspended(session.start_statements(&statements, StepCommand::SmallStep));
    let mut visited = vec![snippet(&session, &first)];
    loop {
        match session.small_step() {
            Ok(Outcome::Suspended(point)) => visited.push(snippet(&session, &point)),
            Ok(Outcome::Completed(_)) => break,
            Err(error) => panic!("Execution failed: {}", error),
        }
    }
    assert_eq!(visited, vec!["1", "2", "3", "*", "+", "x"]);
    assert_eq!(
        session.lookup_toplevel("x").map(|b| b.value),
        Some(Value::Int(7))
    );
}

#[test]
fn test_step_stops_once_per_line() {
    let (mut session, statements) = load("int a = 1;\nint b = 2;\nint c = a + b;\n");
    let point = suspended(session.start_statements(&statements, StepCommand::Step));
    let mut lines = vec![line_of(&session, &point)];
    while let Outcome::Suspended(point) = session.step().expect("Execution failed") {
        lines.push(line_of(&session, &point));
    }
    assert_eq!(lines, vec![0, 1, 2]);
    assert!(!session.is_suspended());
}

#[test]
fn test_operands_are_visible_while_suspended() {
    let (mut session, statements) = load("int x = 40 + 2;\n");
    let mut point = suspended(session.start_statements(&statements, StepCommand::SmallStep));
    while snippet(&session, &point) != "+" {
        point = suspended(session.small_step());
    }
    let frame = session
        .call_stack()
        .current_frame()
        .expect("top-level frame should exist");
    assert_eq!(frame.operands, vec![Value::Int(40), Value::Int(2)]);
}

#[test]
fn test_step_enters_calls() {
    let (mut session, statements) = load(TWICE);
    let point = suspended(session.start_statements(&statements, StepCommand::Step));
    assert_eq!(line_of(&session, &point), 5);

    let point = suspended(session.step());
    assert_eq!(line_of(&session, &point), 1);
    assert_eq!(session.call_stack().depth(), 2);
    let frame = session
        .call_stack()
        .current_frame()
        .expect("callee frame should exist");
    assert_eq!(frame.title, "twice");
    assert!(frame.call_loc.is_some());
}

#[test]
fn test_step_over_does_not_enter_calls() {
    let (mut session, statements) = load(TWICE);
    suspended(session.start_statements(&statements, StepCommand::Step));

    let point = suspended(session.step_over());
    assert_eq!(line_of(&session, &point), 6);
    assert_eq!(session.call_stack().depth(), 1);
    assert_eq!(
        session.lookup_toplevel("a").map(|b| b.value),
        Some(Value::Int(6))
    );
}

#[test]
fn test_step_over_inside_callee_stays_in_callee() {
    let (mut session, statements) = load(TWICE);
    suspended(session.start_statements(&statements, StepCommand::Step));
    suspended(session.step());

    let point = suspended(session.step_over());
    assert_eq!(line_of(&session, &point), 2);
    assert_eq!(session.call_stack().depth(), 2);
}

#[test]
fn test_step_out_returns_to_caller() {
    let (mut session, statements) = load(TWICE);
    suspended(session.start_statements(&statements, StepCommand::Step));
    suspended(session.step());
    assert_eq!(session.call_stack().depth(), 2);

    let point = suspended(session.step_out());
    assert_eq!(session.call_stack().depth(), 1);
    assert_eq!(line_of(&session, &point), 5);
    // The call result waits on the operand stack for the declaration
    let frame = session
        .call_stack()
        .current_frame()
        .expect("top-level frame should exist");
    assert_eq!(frame.operands, vec![Value::Int(6)]);
}

#[test]
fn test_step_out_of_void_call_stops_at_next_statement() {
    let source = "class Counter {
    int count;

    void bump() {
        count++;
    }
}

Counter c = new Counter();
c.bump();
int seen = c.count;
";
    let (mut session, statements) = load(source);
    let mut point = suspended(session.start_statements(&statements, StepCommand::Step));
    while line_of(&session, &point) != 4 {
        point = suspended(session.step());
    }
    assert_eq!(session.call_stack().depth(), 2);

    let point = suspended(session.step_out());
    assert_eq!(line_of(&session, &point), 10);
    assert_eq!(session.call_stack().depth(), 1);
}

#[test]
fn test_step_out_at_top_level_runs_to_completion() {
    let (mut session, statements) = load("int a = 1;\nint b = a + 1;\n");
    suspended(session.start_statements(&statements, StepCommand::Step));
    assert_eq!(session.step_out().ok(), Some(Outcome::Completed(None)));
    assert_eq!(
        session.lookup_toplevel("b").map(|b| b.value),
        Some(Value::Int(2))
    );
}

#[test]
fn test_resume_runs_to_completion() {
    let (mut session, statements) = load(TWICE);
    suspended(session.start_statements(&statements, StepCommand::Step));
    assert_eq!(session.resume().ok(), Some(Outcome::Completed(None)));
    assert_eq!(
        session.lookup_toplevel("b").map(|b| b.value),
        Some(Value::Int(7))
    );
    assert_eq!(session.suspended_at(), None);
}

#[test]
fn test_stepping_an_expression() {
    let (mut session, _) = load("int x = 4;\n");
    let doc = session.add_document("expr", "x * x + 1");
    let expr = session.parse_expression(doc).expect("Parsing failed");
    suspended(session.start_expression(&expr, StepCommand::SmallStep));
    assert_eq!(
        session.resume().ok(),
        Some(Outcome::Completed(Some(Value::Int(17))))
    );
}

#[test]
fn test_commands_without_execution() {
    let (mut session, _) = load("int x = 1;\n");
    assert!(matches!(session.step(), Err(Error::NotSuspended)));
    assert!(matches!(session.small_step(), Err(Error::NotSuspended)));
    assert!(matches!(session.resume(), Err(Error::NotSuspended)));
}

#[test]
fn test_starting_while_suspended_is_rejected() {
    let (mut session, statements) = load("int x = 1;\nint y = 2;\n");
    suspended(session.start_statements(&statements, StepCommand::Step));
    assert!(matches!(
        session.start_statements(&statements, StepCommand::Continue),
        Err(Error::Busy)
    ));
    let doc = session.add_document("more", "int z = 3;\n");
    assert!(matches!(session.load_script(doc), Err(Error::Busy)));
    // The suspended execution is unaffected
    assert!(session.is_suspended());
    assert_eq!(session.resume().ok(), Some(Outcome::Completed(None)));
}

#[test]
fn test_reset_abandons_execution() {
    let (mut session, statements) = load(TWICE);
    suspended(session.start_statements(&statements, StepCommand::Step));
    suspended(session.step());
    session.reset();
    assert!(!session.is_suspended());
    assert_eq!(session.call_stack().depth(), 1);
    assert!(session.lookup_toplevel("a").is_none());

    // Declarations survive a reset
    let point = suspended(session.start_statements(&statements, StepCommand::Step));
    assert_eq!(line_of(&session, &point), 5);
}

#[test]
fn test_error_while_stepping_ends_execution() {
    let (mut session, statements) = load("int zero = 0;\nint x = 1 / zero;\nint y = 2;\n");
    suspended(session.start_statements(&statements, StepCommand::Step));
    let error = session.resume().expect_err("division by zero should fail");
    assert!(!error.is_static());
    assert!(!session.is_suspended());
    assert!(matches!(session.step(), Err(Error::NotSuspended)));
    assert!(session.lookup_toplevel("y").is_none());
}
