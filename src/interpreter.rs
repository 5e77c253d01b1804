use std::{cell::RefCell, rc::Rc};

use crate::{
    callable::Function,
    environment::Environment,
    error::{self, ErrorCode},
    expr::Expr,
    stmt::Stmt,
    token::{Literal, Token},
    token_type::TokenType,
};

/// A runtime value. Everything the language touches at runtime is one of
/// these, behind an `Rc` so environments and expression results can share
/// without copying payloads.
#[derive(Debug)]
pub enum Value {
    String(String),
    Number(f64),
    Nil,
    Boolean(bool),
    Callable(Function),
}

#[derive(Debug)]
pub struct RuntimeError {
    pub code: ErrorCode,
    pub token: Token,
    pub message: String,
    pub context: &'static str,
}

impl RuntimeError {
    pub fn new(
        code: ErrorCode,
        token: Token,
        message: String,
        context: &'static str,
    ) -> RuntimeError {
        RuntimeError {
            code,
            token,
            message,
            context,
        }
    }
}

/// Non-local control flow during evaluation. An `Error` unwinds the whole
/// program; a `Return` carries the result of `sazonar` and is caught at the
/// nearest call boundary.
#[derive(Debug)]
pub enum RuntimeEvent {
    Error(RuntimeError),
    Return(Rc<Value>),
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Value {
        match literal {
            Literal::Boolean(value) => Value::Boolean(*value),
            Literal::Nil => Value::Nil,
            Literal::Number(value) => Value::Number(*value),
            Literal::String(value) => Value::String(value.to_owned()),
        }
    }
}

pub trait Stringifyable {
    fn stringify(&self) -> String;
}

impl Value {
    /// nulo and falso are false, everything else (0 and "" included) is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(value) => *value,
            Value::Nil => false,
            _ => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(l), Value::String(r)) => l == r,
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::Boolean(l), Value::Boolean(r)) => l == r,
            (Value::Nil, Value::Nil) => true,
            (Value::Callable(l), Value::Callable(r)) => l == r,
            _ => false,
        }
    }
}

impl Stringifyable for Value {
    fn stringify(&self) -> String {
        match self {
            Value::Nil => String::from("nulo"),
            Value::Boolean(value) => value.to_string(),
            Value::Number(value) => value.to_string(),
            Value::String(value) => value.clone(),
            Value::Callable(value) => value.stringify(),
        }
    }
}

/// The process-wide knobs, fixed at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    /// Echo the value of every top-level expression statement as `<| v |>`.
    pub print_expressions: bool,
}

pub struct Interpreter {
    environment: Rc<RefCell<Environment>>,
    config: Config,
}

impl Interpreter {
    pub fn new(config: Config) -> Interpreter {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals
            .borrow_mut()
            .define(String::from("pi"), Rc::new(Value::Number(3.141592653589793)));
        globals
            .borrow_mut()
            .define(String::from("e"), Rc::new(Value::Number(2.718281828459045)));

        Interpreter {
            environment: globals,
            config,
        }
    }

    pub fn interpret(&mut self, statements: Vec<Stmt>) {
        for statement in statements {
            let result = match &statement {
                Stmt::Expression { expr } if self.config.print_expressions => expr
                    .evaluate(self.environment.clone())
                    .map(|value| println!("<| {} |>", value.stringify())),
                _ => statement.evaluate(self.environment.clone()),
            };

            match result {
                Ok(()) => {}
                Err(RuntimeEvent::Error(err)) => {
                    error::runtime_error(err);
                    return;
                }
                Err(RuntimeEvent::Return(_)) => {
                    error::raise(
                        ErrorCode::RuntimeError,
                        "No se puede sazonar fuera de una función.",
                        0,
                        "[Ejecución]",
                        true,
                    );
                    return;
                }
            }
        }
    }
}

pub trait Evaluatable<T> {
    fn evaluate(&self, environment: Rc<RefCell<Environment>>) -> Result<T, RuntimeEvent>;
}

impl Evaluatable<()> for Stmt {
    fn evaluate(&self, environment: Rc<RefCell<Environment>>) -> Result<(), RuntimeEvent> {
        match self {
            Stmt::Expression { expr } => {
                expr.evaluate(environment)?;
                Ok(())
            }
            Stmt::Print { expr } => {
                let value = expr.evaluate(environment)?;
                println!("{}", value.stringify());
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let mut value = Rc::new(Value::Nil);

                if let Some(expr) = initializer {
                    value = expr.evaluate(environment.clone())?;
                }

                environment.borrow_mut().define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Block { statements } => {
                // The child scope dies with this frame on every exit path,
                // normal or unwinding, restoring the previous scope.
                statements.evaluate(Rc::new(RefCell::new(Environment::new_enclosing(
                    environment,
                ))))
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if condition.evaluate(environment.clone())?.is_truthy() {
                    then_branch.evaluate(environment)?;
                } else if let Some(else_statement) = else_branch {
                    else_statement.evaluate(environment)?;
                }

                Ok(())
            }
            Stmt::While { condition, body } => {
                while condition.evaluate(environment.clone())?.is_truthy() {
                    body.evaluate(environment.clone())?;
                }

                Ok(())
            }
            Stmt::Function { name, params, body } => {
                // Definition-time capture: the scope current right now is the
                // one the callable closes over.
                let function = Function::new(
                    name.clone(),
                    params.clone(),
                    body.clone(),
                    environment.clone(),
                );

                environment
                    .borrow_mut()
                    .define(name.lexeme.clone(), Rc::new(Value::Callable(function)));
                Ok(())
            }
            Stmt::Return { value } => {
                let result = match value {
                    Some(expr) => expr.evaluate(environment)?,
                    None => Rc::new(Value::Nil),
                };

                Err(RuntimeEvent::Return(result))
            }
        }
    }
}

impl Evaluatable<()> for Vec<Stmt> {
    fn evaluate(&self, environment: Rc<RefCell<Environment>>) -> Result<(), RuntimeEvent> {
        for statement in self {
            statement.evaluate(environment.clone())?;
        }

        Ok(())
    }
}

impl Evaluatable<Rc<Value>> for Expr {
    fn evaluate(&self, environment: Rc<RefCell<Environment>>) -> Result<Rc<Value>, RuntimeEvent> {
        match self {
            Expr::Literal { value } => Ok(Rc::new(Value::from(value))),
            Expr::Grouping { expression } => expression.evaluate(environment),
            Expr::Unary { operator, right } => {
                let right = right.evaluate(environment)?;

                match operator.token_type {
                    TokenType::Minus => match right.as_ref() {
                        Value::Number(num) => Ok(Rc::new(Value::Number(-num))),
                        value => Err(RuntimeEvent::Error(RuntimeError::new(
                            ErrorCode::RuntimeError,
                            operator.clone(),
                            format!(
                                "Se esperaba un número para '{}', se obtuvo {}.",
                                operator.lexeme,
                                value.stringify()
                            ),
                            "[Unaria]",
                        ))),
                    },
                    TokenType::Bang => Ok(Rc::new(Value::Boolean(!right.is_truthy()))),
                    _ => unreachable!("el analizador solo produce '!' y '-' unarios"),
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = left.evaluate(environment.clone())?;
                let right = right.evaluate(environment)?;

                binary_value(operator, left.as_ref(), right.as_ref()).map(Rc::new)
            }
            Expr::Variable { name } => environment.borrow().get(name),
            Expr::Assign { name, value } => {
                let value = value.evaluate(environment.clone())?;
                environment.borrow_mut().assign(name, value.clone())?;
                Ok(value)
            }
            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = left.evaluate(environment.clone())?;

                // Short circuit by handing back the deciding operand itself.
                match operator.token_type {
                    TokenType::Or => {
                        if left.is_truthy() {
                            return Ok(left);
                        }
                    }
                    TokenType::And => {
                        if !left.is_truthy() {
                            return Ok(left);
                        }
                    }
                    _ => unreachable!("el analizador solo produce 'y' y 'o' lógicos"),
                }

                right.evaluate(environment)
            }
            Expr::Call {
                callee,
                closing_paren,
                arguments,
            } => {
                let callee = callee.evaluate(environment.clone())?;

                let mut evaluated_args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    evaluated_args.push(arg.evaluate(environment.clone())?);
                }

                match callee.as_ref() {
                    Value::Callable(function) => function.call(evaluated_args, closing_paren),
                    _ => Err(RuntimeEvent::Error(RuntimeError::new(
                        ErrorCode::RuntimeError,
                        closing_paren.clone(),
                        String::from("Se intentó llamar algo que no es una función."),
                        "Función",
                    ))),
                }
            }
        }
    }
}

fn binary_value(operator: &Token, left: &Value, right: &Value) -> Result<Value, RuntimeEvent> {
    match operator.token_type {
        TokenType::Minus => {
            let (l, r) = check_number_operands(operator, left, right)?;
            Ok(Value::Number(l - r))
        }
        TokenType::Star => {
            let (l, r) = check_number_operands(operator, left, right)?;
            Ok(Value::Number(l * r))
        }
        // IEEE division: dividing by zero yields inf/NaN, not an error.
        TokenType::Slash => {
            let (l, r) = check_number_operands(operator, left, right)?;
            Ok(Value::Number(l / r))
        }
        // Both sides truncate to integers, then C-style remainder. On a
        // zero divisor the f64 remainder yields NaN instead of trapping.
        TokenType::Percent => {
            let (l, r) = check_number_operands(operator, left, right)?;
            Ok(Value::Number(l.trunc() % r.trunc()))
        }
        TokenType::Caret => {
            let (l, r) = check_number_operands(operator, left, right)?;
            Ok(Value::Number(l.powf(r)))
        }
        TokenType::Plus => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),

            // With a string on either side the other operand is rendered
            // and concatenated.
            (Value::String(l), right) => Ok(Value::String(format!("{}{}", l, right.stringify()))),
            (left, Value::String(r)) => Ok(Value::String(format!("{}{}", left.stringify(), r))),

            _ => Err(RuntimeEvent::Error(RuntimeError::new(
                ErrorCode::RuntimeError,
                operator.clone(),
                format!("Se esperaba números o cadenas para '{}'.", operator.lexeme),
                "[Suma]",
            ))),
        },
        TokenType::Greater => {
            let (l, r) = check_number_operands(operator, left, right)?;
            Ok(Value::Boolean(l > r))
        }
        TokenType::GreaterEqual => {
            let (l, r) = check_number_operands(operator, left, right)?;
            Ok(Value::Boolean(l >= r))
        }
        TokenType::Less => {
            let (l, r) = check_number_operands(operator, left, right)?;
            Ok(Value::Boolean(l < r))
        }
        TokenType::LessEqual => {
            let (l, r) = check_number_operands(operator, left, right)?;
            Ok(Value::Boolean(l <= r))
        }
        TokenType::BangEqual => Ok(Value::Boolean(left != right)),
        TokenType::EqualEqual => Ok(Value::Boolean(left == right)),
        _ => unreachable!("operador binario desconocido en el AST"),
    }
}

fn check_number_operands(
    operator: &Token,
    left: &Value,
    right: &Value,
) -> Result<(f64, f64), RuntimeEvent> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
        _ => Err(RuntimeEvent::Error(RuntimeError::new(
            ErrorCode::RuntimeError,
            operator.clone(),
            format!(
                "Se esperaban números para '{}', se obtuvo {} y {}.",
                operator.lexeme,
                left.stringify(),
                right.stringify()
            ),
            "[Binaria]",
        ))),
    }
}
