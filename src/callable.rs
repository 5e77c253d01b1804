use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    environment::Environment,
    error::ErrorCode,
    interpreter::{Evaluatable, RuntimeError, RuntimeEvent, Stringifyable, Value},
    stmt::Stmt,
    token::Token,
};

/// A user-defined function: parameter list, shared body, and the scope that
/// was current when its declaration executed.
#[derive(Clone)]
pub struct Function {
    name: Token,
    params: Vec<Token>,
    body: Rc<Vec<Stmt>>,
    closure: Rc<RefCell<Environment>>,
}

impl Function {
    pub fn new(
        name: Token,
        params: Vec<Token>,
        body: Rc<Vec<Stmt>>,
        closure: Rc<RefCell<Environment>>,
    ) -> Function {
        Function {
            name,
            params,
            body,
            closure,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The call protocol: check arity, bind parameters in a fresh scope
    /// enclosing the captured one, run the body. A normal completion yields
    /// nil; a return event is caught right here and carries the result.
    pub fn call(
        &self,
        arguments: Vec<Rc<Value>>,
        closing_paren: &Token,
    ) -> Result<Rc<Value>, RuntimeEvent> {
        if arguments.len() != self.arity() {
            return Err(RuntimeEvent::Error(RuntimeError::new(
                ErrorCode::RuntimeError,
                closing_paren.clone(),
                format!(
                    "Se esperaban {} argumentos pero se recibieron {}.",
                    self.arity(),
                    arguments.len()
                ),
                "Función",
            )));
        }

        let local = Rc::new(RefCell::new(Environment::new_enclosing(self.closure.clone())));
        for (param, argument) in self.params.iter().zip(arguments) {
            local.borrow_mut().define(param.lexeme.clone(), argument);
        }

        match self.body.evaluate(local) {
            Ok(()) => Ok(Rc::new(Value::Nil)),
            Err(RuntimeEvent::Return(value)) => Ok(value),
            Err(err) => Err(err),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        // Same declaration closed over the same scope.
        Rc::ptr_eq(&self.body, &other.body) && Rc::ptr_eq(&self.closure, &other.closure)
    }
}

impl Stringifyable for Function {
    fn stringify(&self) -> String {
        format!("<fn {}>", self.name.lexeme)
    }
}

// The closure is omitted: a function bound in the scope it captures would
// otherwise send the derived formatter into a cycle.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}/{}>", self.name.lexeme, self.arity())
    }
}
