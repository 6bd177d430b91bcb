use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::value::Value;
use crate::Interpreter;

/// Check if the input has unbalanced brackets, suggesting more input is needed.
fn is_incomplete(input: &str) -> bool {
    let mut depth_brace = 0i32;
    let mut depth_paren = 0i32;
    let mut depth_bracket = 0i32;
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut prev = '\0';

    for ch in input.chars() {
        if in_single_quote {
            if ch == '\'' && prev != '\\' {
                in_single_quote = false;
            }
            prev = ch;
            continue;
        }
        if in_double_quote {
            if ch == '"' && prev != '\\' {
                in_double_quote = false;
            }
            prev = ch;
            continue;
        }
        match ch {
            '\'' => in_single_quote = true,
            '"' => in_double_quote = true,
            '{' => depth_brace += 1,
            '}' => depth_brace -= 1,
            '(' => depth_paren += 1,
            ')' => depth_paren -= 1,
            '[' => depth_bracket += 1,
            ']' => depth_bracket -= 1,
            _ => {}
        }
        prev = ch;
    }

    depth_brace > 0 || depth_paren > 0 || depth_bracket > 0
}

pub fn run_repl() {
    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("Failed to initialize line editor: {}", err);
            std::process::exit(1);
        }
    };

    let mut interpreter = Interpreter::new();
    interpreter.set_program_path("<repl>");
    let mut accumulated = String::new();

    loop {
        let prompt = if accumulated.is_empty() { "> " } else { "* " };

        match rl.readline(prompt) {
            Ok(line) => {
                if accumulated.is_empty() {
                    accumulated = line;
                } else {
                    accumulated.push('\n');
                    accumulated.push_str(&line);
                }

                if is_incomplete(&accumulated) {
                    continue;
                }

                let _ = rl.add_history_entry(&accumulated);
                let source = std::mem::take(&mut accumulated);
                if source == "quit" {
                    return;
                }

                let output_before = interpreter.output().len();
                match interpreter.run_source(&source) {
                    Ok(result) => {
                        let new_output = interpreter.output()[output_before..].to_string();
                        if !new_output.is_empty() {
                            print!("{}", new_output);
                        } else if !matches!(result, Value::Null) {
                            match interpreter.repr_value(&result, 0) {
                                Ok(rendered) => println!("{}", rendered),
                                Err(_) => {}
                            }
                        }
                    }
                    Err(err) => {
                        eprintln!("{}", err.render_report(&source, "<repl>"));
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                return;
            }
            Err(err) => {
                eprintln!("Readline error: {}", err);
                return;
            }
        }
    }
}
