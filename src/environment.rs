use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    error::ErrorCode,
    interpreter::{RuntimeError, RuntimeEvent, Value},
    token::Token,
};

/// One scope: a name→value map plus a link to the enclosing scope. Scopes
/// form a chain rooted at the globals; the interpreter threads the current
/// scope handle through evaluation instead of keeping a mutable global.
#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Rc<Value>>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn new_enclosing(enclosing: Rc<RefCell<Environment>>) -> Environment {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Binds a name in this scope, shadowing any enclosing binding.
    pub fn define(&mut self, name: String, value: Rc<Value>) {
        self.values.insert(name, value);
    }

    /// Resolves a name, innermost scope first.
    pub fn get(&self, name: &Token) -> Result<Rc<Value>, RuntimeEvent> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(enclosing) = self.enclosing.as_ref() {
            return enclosing.borrow().get(name);
        }

        Err(undefined_variable(name))
    }

    /// Overwrites the innermost binding of the name. Never creates one.
    pub fn assign(&mut self, name: &Token, value: Rc<Value>) -> Result<(), RuntimeEvent> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }

        if let Some(enclosing) = self.enclosing.as_ref() {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(undefined_variable(name))
    }
}

fn undefined_variable(name: &Token) -> RuntimeEvent {
    RuntimeEvent::Error(RuntimeError::new(
        ErrorCode::UndefinedVariable,
        name.clone(),
        format!("Variable no definida '{}'.", name.lexeme),
        "[Ejecución]",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_type::TokenType;

    fn name(lexeme: &str) -> Token {
        Token::new(TokenType::Identifier, lexeme.to_string(), 1)
    }

    #[test]
    fn test_define_then_get() {
        let mut env = Environment::new();
        env.define(String::from("x"), Rc::new(Value::Number(1.0)));

        let value = env.get(&name("x")).unwrap();
        assert_eq!(*value, Value::Number(1.0));
    }

    #[test]
    fn test_get_walks_the_enclosing_chain() {
        let globals = Rc::new(RefCell::new(Environment::new()));
        globals
            .borrow_mut()
            .define(String::from("x"), Rc::new(Value::Number(1.0)));

        let inner = Environment::new_enclosing(globals);
        let value = inner.get(&name("x")).unwrap();
        assert_eq!(*value, Value::Number(1.0));
    }

    #[test]
    fn test_define_shadows_without_touching_the_outer_binding() {
        let globals = Rc::new(RefCell::new(Environment::new()));
        globals
            .borrow_mut()
            .define(String::from("x"), Rc::new(Value::Number(1.0)));

        let mut inner = Environment::new_enclosing(globals.clone());
        inner.define(String::from("x"), Rc::new(Value::Number(2.0)));

        assert_eq!(*inner.get(&name("x")).unwrap(), Value::Number(2.0));
        assert_eq!(
            *globals.borrow().get(&name("x")).unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn test_assign_mutates_the_innermost_binding_scope() {
        let globals = Rc::new(RefCell::new(Environment::new()));
        globals
            .borrow_mut()
            .define(String::from("x"), Rc::new(Value::Number(1.0)));

        let mut inner = Environment::new_enclosing(globals.clone());
        inner.assign(&name("x"), Rc::new(Value::Number(5.0))).unwrap();

        assert_eq!(
            *globals.borrow().get(&name("x")).unwrap(),
            Value::Number(5.0)
        );
    }

    #[test]
    fn test_assign_never_creates_a_binding() {
        let mut env = Environment::new();

        let result = env.assign(&name("fantasma"), Rc::new(Value::Nil));
        assert!(matches!(result, Err(RuntimeEvent::Error(_))));
    }

    #[test]
    fn test_get_unknown_name_is_an_undefined_variable_error() {
        let env = Environment::new();

        match env.get(&name("fantasma")) {
            Err(RuntimeEvent::Error(error)) => {
                assert_eq!(error.code, ErrorCode::UndefinedVariable);
            }
            other => panic!("expected an undefined variable error, got {:?}", other),
        }
    }
}
