use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Stdout, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::{Class, Function, Instance, Value, INITIALIZER};

/// How a statement finished.
///
/// `return` is ordinary control flow, not an error: it travels up through
/// blocks and loops as `Flow::Return` until the enclosing call consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Tree‑walking evaluator.
///
/// `print` output goes to `W` (stdout by default) so callers can capture it.
pub struct Interpreter<W: Write = Stdout> {
    globals: EnvRef,
    environment: EnvRef,
    /// Resolver side table: expression id → scope distance. Absent ⇒ global.
    locals: HashMap<ExprId, usize>,
    output: W,
}

impl Interpreter<Stdout> {
    /// Creates a new Interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Creates a new Interpreter writing to `output` and defines the native
    /// functions `clock` and `reverse`.
    pub fn with_output(output: W) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::global();

        debug!("Defining native functions 'clock' and 'reverse'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: |_args: &[Value]| {
                    // sub-second part of the wall clock, in [0, 1)
                    let timestamp: f64 = Utc::now().timestamp_subsec_millis() as f64 / 1000.0;
                    debug!("Native function 'clock' returned: {}", timestamp);
                    Ok(Value::Number(timestamp))
                },
            },
        );

        globals.borrow_mut().define(
            "reverse",
            Value::NativeFunction {
                name: "reverse",
                arity: 1,
                func: |args: &[Value]| match args.first() {
                    Some(Value::String(s)) => Ok(Value::String(s.chars().rev().collect())),
                    _ => Err("Argument must be a string.".to_string()),
                },
            },
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Record the scope distance the resolver computed for `id`.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Side table: {:?} -> {}", id, depth);
        self.locals.insert(id, depth);
    }

    /// Resolved distance of `id`, `None` for globals.
    pub fn resolved_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Interprets a list of statements (a "program"), stopping at the first
    /// runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes one top‑level declaration; a bare expression statement also
    /// has its value displayed.
    pub fn repl_execute(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Expression(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
            }
            other => {
                self.execute(other)?;
            }
        }

        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Variable '{}' defined with value: {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(&self.environment);
                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Run `statements` inside `environment`, restoring the current scope
    /// afterwards whether they complete, return or fail.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let mut result = Ok(Flow::Normal);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<Flow> {
        debug!("Declaring class '{}'", name.lexeme);

        // Placeholder so method bodies can mention the class by name.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(LoxError::runtime(token, "Superclass must be a class."));
                }
            },
            None => None,
        };

        let method_scope: EnvRef = match &superclass {
            Some(class) => {
                let scope = Environment::with_enclosing(&self.environment);
                scope
                    .borrow_mut()
                    .define("super", Value::Class(Rc::clone(class)));
                scope
            }
            None => Rc::clone(&self.environment),
        };

        let methods: HashMap<String, Function> = methods
            .iter()
            .map(|method| {
                let is_initializer = method.name.lexeme == INITIALIZER;
                let function = Function::new(Rc::clone(method), Rc::clone(&method_scope), is_initializer);
                (method.name.lexeme.clone(), function)
            })
            .collect();

        let class = Class {
            name: name.lexeme.clone(),
            superclass,
            methods,
        };

        info!("Class '{}' defined with {} method(s)", name.lexeme, class.methods.len());

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Class(Rc::new(class)));

        Ok(Flow::Normal)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal.clone())),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                if operator.token_type == TokenType::OR {
                    if left_val.is_truthy() {
                        return Ok(left_val);
                    }
                } else if !left_val.is_truthy() {
                    return Ok(left_val);
                }

                self.evaluate(right)
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.resolved_depth(*id) {
                    Some(distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                debug!("Assigned value {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee, paren, args)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.resolved_depth(id) {
            Some(distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    /// `super.method`: the superclass lives `distance` scopes out, the
    /// instance one scope closer.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        // Every `super` in a resolved program has a distance; the resolver
        // rejects the rest as static errors.
        let distance = self
            .resolved_depth(id)
            .ok_or_else(|| LoxError::runtime(keyword, "Unresolved 'super' reference."))?;

        let Value::Class(superclass) = Environment::get_at(&self.environment, distance, keyword)?
        else {
            return Err(LoxError::runtime(keyword, "Superclass must be a class."));
        };

        let this_token = Token::new(TokenType::THIS, "this", keyword.line);
        let object = Environment::get_at(&self.environment, distance.saturating_sub(1), &this_token)?;

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => return Ok(Value::Bool(left_val != right_val)),
            TokenType::PLUS => return add(operator, left_val, right_val),
            _ => {}
        }

        let (Value::Number(a), Value::Number(b)) = (&left_val, &right_val) else {
            return Err(LoxError::runtime(operator, "Operands must be numbers."));
        };
        let (a, b) = (*a, *b);

        match operator.token_type {
            TokenType::MINUS => Ok(Value::Number(a - b)),
            TokenType::STAR => Ok(Value::Number(a * b)),
            TokenType::SLASH => Ok(Value::Number(a / b)),
            TokenType::PERCENT => Ok(Value::Number(a % b)),
            TokenType::GREATER => Ok(Value::Bool(a > b)),
            TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
            TokenType::LESS => Ok(Value::Bool(a < b)),
            TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
            _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
        }
    }

    /// Invokes a callable: native function, user function, or class.
    fn call_value(&mut self, callee: Value, paren: &Token, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);
                check_arity(paren, arity, args.len())?;
                func(&args).map_err(|message| LoxError::runtime(paren, message))
            }

            Value::Function(function) => {
                check_arity(paren, function.arity(), args.len())?;
                self.call_function(&function, args)
            }

            Value::Class(class) => {
                check_arity(paren, class.arity(), args.len())?;
                debug!("Instantiating class '{}'", class.name);

                let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(&class))));

                if let Some(initializer) = class.find_method(INITIALIZER) {
                    let bound = initializer.bind(Value::Instance(Rc::clone(&instance)));
                    self.call_function(&bound, args)?;
                }

                Ok(Value::Instance(instance))
            }

            other => {
                debug!("Attempted to call a {}", other.type_name());
                Err(LoxError::runtime(
                    paren,
                    "Can only call functions and classes.",
                ))
            }
        }
    }

    /// Run `function` in a fresh activation scope enclosed by its closure.
    fn call_function(&mut self, function: &Function, args: Vec<Value>) -> Result<Value> {
        debug!("Calling user-defined function '{}'", function.name());

        let activation = Environment::with_enclosing(&function.closure);

        for (param, arg) in function.declaration.params.iter().zip(args) {
            activation.borrow_mut().define(&param.lexeme, arg);
        }

        let flow = self.execute_block(&function.declaration.body, activation)?;

        if function.is_initializer {
            let this_token = Token::new(TokenType::THIS, "this", function.declaration.name.line);
            return Environment::get_at(&function.closure, 0, &this_token);
        }

        let value = match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        };

        debug!("Function '{}' returned: {}", function.name(), value);
        Ok(value)
    }
}

fn check_arity(paren: &Token, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(LoxError::runtime(
            paren,
            format!("Expected {} arguments but got {}.", expected, got),
        ));
    }

    Ok(())
}

/// `+`: numeric sum, or concatenation of display forms when either side is
/// a string and the other a string or number.
fn add(operator: &Token, left: Value, right: Value) -> Result<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (Value::String(a), b @ Value::Number(_)) => Ok(Value::String(format!("{}{}", a, b))),
        (a @ Value::Number(_), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        _ => Err(LoxError::runtime(
            operator,
            "Operands must be number or string.",
        )),
    }
}
