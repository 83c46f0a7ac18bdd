#![allow(dead_code)]

use monkey::interpreter::{parse_and_run, Interpreter};
use monkey::Object;

/// Value of a program that is expected to parse, expand and produce a value.
pub fn run(source: &str) -> Object {
    parse_and_run(source)
        .expect("Program should parse and expand")
        .expect("Program should produce a value")
}

pub fn run_inspect(source: &str) -> String {
    run(source).inspect()
}

pub fn run_error(source: &str) -> String {
    match run(source) {
        Object::Error(message) => message,
        other => panic!("Expected an error from {:?}, got {}", source, other.inspect()),
    }
}

pub fn integer(source: &str) -> i64 {
    match run(source) {
        Object::Integer(value) => value,
        other => panic!("Expected an integer from {:?}, got {}", source, other.inspect()),
    }
}

/// Feeds `lines` to one interpreter, as the REPL does, and returns the
/// inspect form of the last value.
pub fn run_session(lines: &[&str]) -> Option<String> {
    let mut interpreter = Interpreter::new();
    let mut last = None;
    for line in lines {
        if let Some(value) = interpreter.run(line).expect("Line should parse and expand") {
            last = Some(value.inspect());
        }
    }
    last
}
