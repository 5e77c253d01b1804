use crate::{interpreter::RuntimeError, token::Token, token_type::TokenType};

/// Exit codes of the interpreter. The hex value doubles as the process
/// exit status and as the code printed in the halt banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    AllGood = 0x00,
    SyntaxError = 0x01,
    TooManyArguments = 0x02,
    RuntimeError = 0x03,
    UnexpectedEof = 0x04,
    UndefinedVariable = 0x05,
}

static mut HAD_ERROR: bool = false;
static mut IGNORE_FATALS: bool = false;

pub fn had_error() -> bool {
    unsafe { HAD_ERROR }
}

pub fn set_had_error(had_error: bool) {
    unsafe { HAD_ERROR = had_error };
}

pub fn ignore_fatals() -> bool {
    unsafe { IGNORE_FATALS }
}

/// Set once at startup: the prompt loop must survive fatal errors.
pub fn set_ignore_fatals(ignore: bool) {
    unsafe { IGNORE_FATALS = ignore };
}

/// Reports an error through the sink. A fatal error halts the process with
/// the given code unless the sink is in ignore mode; otherwise the error is
/// printed and only the had-error flag is recorded.
pub fn raise(code: ErrorCode, message: &str, line: usize, context: &str, fatal: bool) {
    if fatal && !ignore_fatals() {
        halt(code, message, line, context);
    }

    eprintln!("[{}] Error {}: {}", line, context, message);
    set_had_error(true);
}

fn halt(code: ErrorCode, message: &str, line: usize, context: &str) -> ! {
    eprintln!("\nLa cazuela se vació con el código: {:X}", code as i32);
    eprintln!("\t[{}] Error {}: {}", line, context, message);
    std::process::exit(code as i32);
}

/// Reports an error identified only by its code, with the inferred message.
pub fn raise_with_code(code: ErrorCode) {
    raise(code, description(code), 0, "", false);
}

pub fn exit_with_code(code: ErrorCode) -> ! {
    std::process::exit(code as i32);
}

fn description(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::AllGood => "Ejecución normal",
        ErrorCode::SyntaxError => "Error de sintaxis",
        ErrorCode::TooManyArguments => "Demasiados argumentos durante inicialización",
        ErrorCode::RuntimeError => "Error en tiempo de ejecución",
        ErrorCode::UnexpectedEof => "Fin inesperado del archivo",
        ErrorCode::UndefinedVariable => "Variable no definida",
    }
}

pub fn syntax_error(line: usize, message: &str) {
    raise(ErrorCode::SyntaxError, message, line, "[Preparado]", true);
}

pub fn unexpected_eof(line: usize, message: &str) {
    raise(ErrorCode::UnexpectedEof, message, line, "[Preparado]", true);
}

pub fn error_token(token: &Token, message: &str) {
    match token.token_type {
        TokenType::Eof => raise(ErrorCode::SyntaxError, message, token.line, "al final", true),
        _ => raise(
            ErrorCode::SyntaxError,
            message,
            token.line,
            format!("en '{}'", token.lexeme).as_str(),
            true,
        ),
    }
}

pub fn runtime_error(error: RuntimeError) {
    raise(
        error.code,
        &error.message,
        error.token.line,
        error.context,
        true,
    );
}
