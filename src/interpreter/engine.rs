//! Execution engine
//!
//! A [`Session`] owns everything an interpreter run needs: the source
//! documents, the checked [`Program`], the call stack, the heap and the pending
//! work. There is no global state; dropping the session drops the machine.
//!
//! # Task machine
//!
//! Evaluation never recurses on the native stack. Pending work is a stack of
//! [`Task`]s: executing a statement or evaluating an expression schedules the
//! tasks for its parts followed by a continuation (apply, finish, branch, loop
//! test, ...). `Task::Eval` leaves exactly one value on the current frame's
//! operand stack.
//!
//! A [`Task::Step`] is a step point. When the current [`StepMode`] says so,
//! [`Session::run`] returns [`Outcome::Suspended`] with the remaining tasks
//! intact; a stepping command later continues from there. Resetting simply
//! drops the tasks.
//!
//! # Errors
//!
//! Any execution error tears the machine down to the top-level frame. Top-level
//! variables and heap mutations made before the error are kept.

use crate::interpreter::checker::{check_declarations, Checker};
use crate::interpreter::constants::{
    MAX_ARRAY_LENGTH, MAX_CALL_DEPTH, MAX_LOOP_ITERATIONS, TOPLEVEL_FRAME_TITLE,
};
use crate::interpreter::errors::{Error, RuntimeError};
use crate::interpreter::stepping::{Position, StepCommand, StepMode, StepPoint};
use crate::interpreter::type_system::Program;
use crate::memory::heap::{Heap, HeapObject};
use crate::memory::stack::{CallStack, FrameId, LocalBinding, ScopeId};
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::{Declaration, DocId, Expr, Loc, Stmt};
use crate::parser::source_map::SourceMap;
use crate::parser::{Parser, ParserOptions};
use log::{debug, info, trace};
use std::rc::Rc;

/// Evaluator limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum number of nested method calls
    pub max_call_depth: usize,
    /// Maximum number of iterations of one loop execution
    pub max_loop_iterations: usize,
    /// Maximum number of elements of one array
    pub max_array_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            max_call_depth: MAX_CALL_DEPTH,
            max_loop_iterations: MAX_LOOP_ITERATIONS,
            max_array_length: MAX_ARRAY_LENGTH,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Stopped at a step point; a stepping command continues
    Suspended(StepPoint),
    /// Ran to completion; carries the value of an evaluated expression
    Completed(Option<Value>),
}

/// Pending unit of work
#[derive(Debug, Clone)]
pub(crate) enum Task {
    /// Execute a statement
    Exec(Rc<Stmt>),
    /// Evaluate an expression, pushing its value
    Eval(Rc<Expr>),
    /// Evaluate the components of an assignment target (receiver; array and index)
    EvalTarget(Rc<Expr>),
    /// Potential suspension
    Step(StepPoint),
    /// Combine the already evaluated operands of an expression
    Apply(Rc<Expr>),
    /// Complete a statement whose operands are evaluated
    Finish(Rc<Stmt>),
    /// Decide whether the right operand of `&&`/`||` is needed
    ShortCircuit(Rc<Expr>),
    /// Pick the branch of an `if`
    Branch(Rc<Stmt>),
    /// Test a loop condition before running the body again
    LoopTest { stmt: Rc<Stmt>, iteration: usize },
    /// Close the scopes of a block
    ExitScope(ScopeId),
    /// Bottom of a method's tasks; `return` unwinds to here
    CallBoundary,
    /// Drop the value of an expression statement
    Discard,
    /// Push a value computed earlier (the new object after its constructor)
    PushValue(Value),
}

impl Task {
    pub(crate) fn step(loc: Loc, instr_loc: Loc) -> Task {
        Task::Step(StepPoint::new(loc, instr_loc))
    }

    fn name(&self) -> &'static str {
        match self {
            Task::Exec(_) => "exec",
            Task::Eval(_) => "eval",
            Task::EvalTarget(_) => "eval-target",
            Task::Step(_) => "step",
            Task::Apply(_) => "apply",
            Task::Finish(_) => "finish",
            Task::ShortCircuit(_) => "short-circuit",
            Task::Branch(_) => "branch",
            Task::LoopTest { .. } => "loop-test",
            Task::ExitScope(_) => "exit-scope",
            Task::CallBoundary => "call-boundary",
            Task::Discard => "discard",
            Task::PushValue(_) => "push",
        }
    }
}

/// An interpreter session
pub struct Session {
    pub(crate) config: SessionConfig,
    parser_options: ParserOptions,
    sources: SourceMap,
    pub(crate) program: Rc<Program>,
    pub(crate) call_stack: CallStack,
    pub(crate) heap: Heap,
    pub(crate) tasks: Vec<Task>,
    mode: StepMode,
    suspended: Option<StepPoint>,
    /// Whether the current run leaves a value on the top-level operand stack
    expects_result: bool,
    /// Value of the last evaluated expression, kept reachable for display
    last_result: Option<Value>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let mut call_stack = CallStack::new();
        call_stack.push_frame(TOPLEVEL_FRAME_TITLE.to_string(), None, None, None);
        Session {
            config,
            parser_options: ParserOptions::default(),
            sources: SourceMap::new(),
            program: Rc::new(Program::new()),
            call_stack,
            heap: Heap::new(),
            tasks: Vec::new(),
            mode: StepMode::Continue,
            suspended: None,
            expects_result: false,
            last_result: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn set_parser_options(&mut self, options: ParserOptions) {
        self.parser_options = options;
    }

    // ===== Sources and declarations =====

    /// Register a source document
    pub fn add_document(&mut self, name: impl Into<String>, text: impl Into<String>) -> DocId {
        self.sources.add(name, text)
    }

    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Parse and check a document of declarations, replacing the current program
    pub fn load_declarations(&mut self, doc: DocId) -> Result<(), Error> {
        self.ensure_idle()?;
        let declarations = Parser::new(doc, self.sources.text(doc), self.parser_options)
            .and_then(|mut parser| parser.parse_declarations())
            .inspect_err(log_error)?;
        self.install(&declarations)
    }

    /// Load a script: its declarations become the program and its top-level
    /// statements are returned, ready for [`Session::start_statements`]
    pub fn load_script(&mut self, doc: DocId) -> Result<Vec<Rc<Stmt>>, Error> {
        self.ensure_idle()?;
        let script = Parser::new(doc, self.sources.text(doc), self.parser_options)
            .and_then(|mut parser| parser.parse_script())
            .inspect_err(log_error)?;
        self.install(&script.declarations)?;
        Ok(script.statements)
    }

    /// Parse a document of top-level statements
    pub fn parse_statements(&self, doc: DocId) -> Result<Vec<Rc<Stmt>>, Error> {
        Parser::new(doc, self.sources.text(doc), self.parser_options)
            .and_then(|mut parser| parser.parse_statements())
            .inspect_err(log_error)
    }

    /// Parse a document holding a single expression
    pub fn parse_expression(&self, doc: DocId) -> Result<Rc<Expr>, Error> {
        Parser::new(doc, self.sources.text(doc), self.parser_options)
            .and_then(|mut parser| parser.parse_single_expression())
            .inspect_err(log_error)
    }

    fn install(&mut self, declarations: &[Declaration]) -> Result<(), Error> {
        let program = check_declarations(declarations).inspect_err(log_error)?;
        info!(
            "loaded {} classes and {} top-level methods",
            program.classes().len(),
            program.methods().len()
        );
        self.program = Rc::new(program);
        Ok(())
    }

    // ===== Starting executions =====

    /// Check top-level statements and start executing them
    pub fn start_statements(
        &mut self,
        statements: &[Rc<Stmt>],
        command: StepCommand,
    ) -> Result<Outcome, Error> {
        self.ensure_idle()?;
        let bindings = self.call_stack.toplevel_bindings();
        Checker::for_toplevel(&self.program, bindings.iter().map(|b| (b.name.as_str(), &b.ty)))
            .check_statements(statements)
            .inspect_err(log_error)?;

        debug!("starting {} statements ({:?})", statements.len(), command);
        self.tasks
            .extend(statements.iter().rev().map(|s| Task::Exec(Rc::clone(s))));
        self.expects_result = false;
        self.begin(command)
    }

    /// Check a top-level expression and start evaluating it
    pub fn start_expression(&mut self, expr: &Rc<Expr>, command: StepCommand) -> Result<Outcome, Error> {
        self.ensure_idle()?;
        let bindings = self.call_stack.toplevel_bindings();
        Checker::for_toplevel(&self.program, bindings.iter().map(|b| (b.name.as_str(), &b.ty)))
            .check_expression(expr)
            .inspect_err(log_error)?;

        debug!("starting expression ({:?})", command);
        self.tasks.push(Task::Eval(Rc::clone(expr)));
        self.expects_result = true;
        self.begin(command)
    }

    /// Execute top-level statements to completion
    pub fn execute_statements(&mut self, statements: &[Rc<Stmt>]) -> Result<(), Error> {
        self.start_statements(statements, StepCommand::Continue)
            .map(|_| ())
    }

    /// Evaluate a top-level expression to completion
    pub fn evaluate_expression(&mut self, expr: &Rc<Expr>) -> Result<Value, Error> {
        match self.start_expression(expr, StepCommand::Continue)? {
            Outcome::Completed(Some(value)) => Ok(value),
            _ => Err(Error::execution(
                expr.loc,
                RuntimeError::internal("expression produced no value"),
            )),
        }
    }

    fn ensure_idle(&self) -> Result<(), Error> {
        if self.suspended.is_some() || !self.tasks.is_empty() {
            return Err(Error::Busy);
        }
        Ok(())
    }

    fn begin(&mut self, command: StepCommand) -> Result<Outcome, Error> {
        self.mode = StepMode::capture(command, self.position(None));
        self.run()
    }

    // ===== Stepping commands =====

    /// Suspend at the very next step point
    pub fn small_step(&mut self) -> Result<Outcome, Error> {
        self.resume_with(StepCommand::SmallStep)
    }

    /// Suspend at the next line, entering calls
    pub fn step(&mut self) -> Result<Outcome, Error> {
        self.resume_with(StepCommand::Step)
    }

    /// Suspend at the next line without stopping inside calls
    pub fn step_over(&mut self) -> Result<Outcome, Error> {
        self.resume_with(StepCommand::StepOver)
    }

    /// Run until the current method returns to its caller
    pub fn step_out(&mut self) -> Result<Outcome, Error> {
        self.resume_with(StepCommand::StepOut)
    }

    /// Run to completion
    pub fn resume(&mut self) -> Result<Outcome, Error> {
        self.resume_with(StepCommand::Continue)
    }

    fn resume_with(&mut self, command: StepCommand) -> Result<Outcome, Error> {
        let point = self.suspended.take().ok_or(Error::NotSuspended)?;
        self.mode = StepMode::capture(command, self.position(Some(&point)));
        trace!("resuming with {:?}", command);
        self.run()
    }

    /// Abandon any execution and clear the top level and the heap.
    /// Declarations stay loaded.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.suspended = None;
        self.expects_result = false;
        self.last_result = None;
        self.mode = StepMode::Continue;
        self.call_stack.clear();
        self.call_stack
            .push_frame(TOPLEVEL_FRAME_TITLE.to_string(), None, None, None);
        self.heap.clear();
        info!("session reset");
    }

    // ===== Driver =====

    fn position(&self, point: Option<&StepPoint>) -> Position {
        Position {
            depth: self.call_stack.depth(),
            frame: self
                .call_stack
                .current_frame()
                .map_or(FrameId(0), |frame| frame.id),
            line: point.map(|p| (p.instr_loc.doc, self.sources.line_index(p.instr_loc))),
        }
    }

    /// Run tasks until a suspension, completion or error
    fn run(&mut self) -> Result<Outcome, Error> {
        while let Some(task) = self.tasks.pop() {
            let task = match task {
                Task::Step(point) => {
                    if self.mode.should_suspend(&self.position(Some(&point))) {
                        debug!("suspended at {}", self.sources.describe(point.instr_loc));
                        self.suspended = Some(point.clone());
                        return Ok(Outcome::Suspended(point));
                    }
                    continue;
                }
                task => task,
            };
            trace!("{} (depth {})", task.name(), self.call_stack.depth());
            if let Err(error) = self.dispatch(task) {
                log_error(&error);
                self.abort();
                return Err(error);
            }
        }
        self.complete()
    }

    fn dispatch(&mut self, task: Task) -> Result<(), Error> {
        match task {
            Task::Exec(stmt) => self.exec_stmt(&stmt),
            Task::Eval(expr) => self.eval_expr(&expr),
            Task::EvalTarget(expr) => self.eval_target(&expr),
            Task::Step(_) => Ok(()),
            Task::Apply(expr) => self.apply(&expr),
            Task::Finish(stmt) => self.finish_stmt(&stmt),
            Task::ShortCircuit(expr) => self.short_circuit(&expr),
            Task::Branch(stmt) => self.branch(&stmt),
            Task::LoopTest { stmt, iteration } => self.loop_test(&stmt, iteration),
            Task::ExitScope(scope) => {
                self.call_stack.exit_scope(scope);
                Ok(())
            }
            Task::CallBoundary => Err(Error::execution(
                Loc::default(),
                RuntimeError::internal("method body ended without returning"),
            )),
            Task::Discard => {
                self.call_stack.pop_operand();
                Ok(())
            }
            Task::PushValue(value) => {
                self.call_stack.push_operand(value);
                Ok(())
            }
        }
    }

    fn complete(&mut self) -> Result<Outcome, Error> {
        let result = if self.expects_result {
            let value = self.call_stack.pop_operand().ok_or_else(|| {
                Error::execution(
                    Loc::default(),
                    RuntimeError::internal("expression left no value"),
                )
            })?;
            Some(value)
        } else {
            None
        };
        self.expects_result = false;
        if result.is_some() {
            self.last_result = result;
        }
        debug!("execution completed");
        Ok(Outcome::Completed(result))
    }

    /// Tear the machine down to the top-level frame after an error
    fn abort(&mut self) {
        self.tasks.clear();
        self.call_stack.unwind_to_bottom();
        self.suspended = None;
        self.expects_result = false;
    }

    // ===== Inspection =====

    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    pub fn suspended_at(&self) -> Option<&StepPoint> {
        self.suspended.as_ref()
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn last_result(&self) -> Option<Value> {
        self.last_result
    }

    /// A top-level variable
    pub fn lookup_toplevel(&self, name: &str) -> Option<&LocalBinding> {
        self.call_stack
            .toplevel_bindings()
            .iter()
            .find(|binding| binding.name == name)
    }

    /// Recompute which heap objects are reachable; returns how many got hidden
    pub fn collect_garbage(&mut self) -> usize {
        let pending = self.tasks.iter().filter_map(|task| match task {
            Task::PushValue(value) => Some(*value),
            _ => None,
        });
        let roots: Vec<ObjectId> = self
            .call_stack
            .root_values()
            .chain(pending)
            .chain(self.last_result)
            .filter_map(|value| value.as_object())
            .collect();
        let hidden = self.heap.mark_visible(roots);
        debug!("reachability pass hid {} objects", hidden);
        hidden
    }

    /// Short display form of a value: `42`, `null`, `Point#3`, `int[]#4`
    pub fn render_value(&self, value: Value) -> String {
        match value {
            Value::Ref(id) => match self.heap.get(id) {
                Some(object) => format!("{}{}", object.ty(), id),
                None => id.to_string(),
            },
            other => other.to_string(),
        }
    }

    // ===== Helpers for the task handlers =====

    /// Schedule tasks to run in the given order
    pub(crate) fn schedule<const N: usize>(&mut self, tasks: [Task; N]) {
        self.tasks.extend(tasks.into_iter().rev());
    }

    pub(crate) fn schedule_all(&mut self, tasks: Vec<Task>) {
        self.tasks.extend(tasks.into_iter().rev());
    }

    pub(crate) fn push_value(&mut self, value: Value) {
        self.call_stack.push_operand(value);
    }

    pub(crate) fn pop_value(&mut self, loc: Loc) -> Result<Value, Error> {
        self.call_stack
            .pop_operand()
            .ok_or_else(|| internal(loc, "operand stack underflow"))
    }

    /// Pop `n` values, returned in evaluation order
    pub(crate) fn pop_values(&mut self, n: usize, loc: Loc) -> Result<Vec<Value>, Error> {
        self.call_stack
            .pop_operands(n)
            .ok_or_else(|| internal(loc, "operand stack underflow"))
    }

    pub(crate) fn pop_int(&mut self, loc: Loc) -> Result<i32, Error> {
        self.pop_value(loc)?
            .as_int()
            .ok_or_else(|| internal(loc, "expected an int operand"))
    }

    pub(crate) fn pop_bool(&mut self, loc: Loc) -> Result<bool, Error> {
        self.pop_value(loc)?
            .as_bool()
            .ok_or_else(|| internal(loc, "expected a boolean operand"))
    }

    pub(crate) fn object(&self, id: ObjectId, loc: Loc) -> Result<&HeapObject, Error> {
        self.heap
            .get(id)
            .ok_or_else(|| internal(loc, format!("dangling reference {}", id)))
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId, loc: Loc) -> Result<&mut HeapObject, Error> {
        self.heap
            .get_mut(id)
            .ok_or_else(|| internal(loc, format!("dangling reference {}", id)))
    }
}

pub(crate) fn internal(loc: Loc, message: impl Into<String>) -> Error {
    Error::execution(loc, RuntimeError::internal(message))
}

fn log_error(error: &Error) {
    debug!("{}: {}", error.kind_name(), error);
}
