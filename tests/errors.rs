use safulate::{ErrorKind, Interpreter};

#[test]
fn catch_handles_raised_values() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "try { raise \"boom\"; } catch e { print(e); }\n\
             print(\"after\");",
        )
        .unwrap();
    assert_eq!(interp.output(), "boom\nafter\n");
}

#[test]
fn any_value_can_be_raised() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "try { raise [1, 2]; } catch e { assert(e[1] == 2); }\n\
             try { raise 5; } catch e { assert(e == 5); }",
        )
        .unwrap();
}

#[test]
fn else_runs_only_on_success() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "try { print(\"body\"); } catch { print(\"catch\"); } else { print(\"else\"); }\n\
             try { raise \"x\"; } catch { print(\"caught\"); } else { print(\"skipped\"); }",
        )
        .unwrap();
    assert_eq!(interp.output(), "body\nelse\ncaught\n");
}

#[test]
fn uncaught_raises_reach_the_embedder() {
    let mut interp = Interpreter::new();
    let err = interp.run_source("raise \"unhandled\";").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Raised);

    let mut interp = Interpreter::new();
    let err = interp.run_source("try { raise 5; }").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Raised);
}

#[test]
fn native_failures_bind_error_objects() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "req types;\n\
             try { missing_name; } catch e {\n\
                 assert(types.NameError.check(e) == 1);\n\
                 assert(e.msg contains \"missing_name\");\n\
             }",
        )
        .unwrap();
}

#[test]
fn raises_inside_catch_propagate() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("try { raise 1; } catch { raise 2; }")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Raised);
    assert_eq!(err.message, "2");
}

#[test]
fn assert_failures_carry_the_message() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("assert(1 == 2, \"numbers drifted\");")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Assertion);
    assert_eq!(err.message, "numbers drifted");
}

#[test]
fn assert_failures_are_catchable() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "req types;\n\
             try { assert(0); } catch e { assert(types.AssertionError.check(e) == 1); }",
        )
        .unwrap();
}

#[test]
fn runaway_recursion_is_caught_as_stack_overflow() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("func spin() { return spin(); } spin();")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::StackOverflow);

    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func spin() { return spin(); }\n\
             try { spin(); } catch { print(\"caught\"); }",
        )
        .unwrap();
    assert_eq!(interp.output(), "caught\n");
}

#[test]
fn lexical_errors_surface_before_execution() {
    let mut interp = Interpreter::new();
    let err = interp.run_source("print(\"fine\"); ?").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
    assert_eq!(interp.output(), "");
}

#[test]
fn syntax_errors_surface_before_execution() {
    let mut interp = Interpreter::new();
    let err = interp.run_source("print(\"fine\"); var = 5;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(interp.output(), "");
}

#[test]
fn reports_point_at_the_failing_line() {
    let mut interp = Interpreter::new();
    let source = "var x = 1;\nboom;\n";
    let err = interp.run_source(source).unwrap_err();
    let report = err.render_report(source, "demo.saf");
    assert!(report.contains("line 2"));
    assert!(report.contains("NameError"));
    assert!(report.contains("boom"));
}
