use safulate::Interpreter;

#[test]
fn continue_two_falls_through_past_the_next_case() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "switch \"best\" {\n\
                 case \"best\" { print(\"a\"); continue 2; }\n\
                 case \"test\" { print(\"b\"); }\n\
                 case \"foo\" { print(\"c\"); }\n\
             }",
        )
        .unwrap();
    assert_eq!(interp.output(), "a\nc\n");
}

#[test]
fn matching_case_runs_without_fall_through() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "switch 2 {\n\
                 case 1 { print(\"one\"); }\n\
                 case 2 { print(\"two\"); }\n\
                 case 3 { print(\"three\"); }\n\
             }",
        )
        .unwrap();
    assert_eq!(interp.output(), "two\n");
}

#[test]
fn continue_one_runs_the_next_case_unconditionally() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "switch 1 {\n\
                 case 1 { print(\"one\"); continue; }\n\
                 case 99 { print(\"ninety-nine\"); }\n\
             }",
        )
        .unwrap();
    assert_eq!(interp.output(), "one\nninety-nine\n");
}

#[test]
fn fall_through_past_the_last_case_exits_silently() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "switch 1 {\n\
                 case 1 { print(\"one\"); continue 7; }\n\
                 case 2 { print(\"two\"); }\n\
             }\n\
             print(\"after\");",
        )
        .unwrap();
    assert_eq!(interp.output(), "one\nafter\n");
}

#[test]
fn unmatched_switch_is_a_no_op() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "switch 9 {\n\
                 case 1 { print(\"one\"); }\n\
             }\n\
             print(\"after\");",
        )
        .unwrap();
    assert_eq!(interp.output(), "after\n");
}

#[test]
fn plain_case_acts_as_default() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "switch 9 {\n\
                 case 1 { print(\"one\"); }\n\
                 case { print(\"fallback\"); }\n\
             }",
        )
        .unwrap();
    assert_eq!(interp.output(), "fallback\n");
}

#[test]
fn break_exits_the_switch_as_one_construct() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "while 1 {\n\
                 switch 1 {\n\
                     case 1 { break 2; }\n\
                 }\n\
                 print(\"unreached\");\n\
             }\n\
             print(\"after\");",
        )
        .unwrap();
    assert_eq!(interp.output(), "after\n");
}

#[test]
fn loop_continues_pass_through_the_switch_untouched() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "for i in [1, 2, 3] {\n\
                 switch i {\n\
                     case 1 {\n\
                         for j in [10] { continue 2; }\n\
                         print(\"after inner\");\n\
                     }\n\
                     case 2 { print(\"two\"); }\n\
                 }\n\
                 print(f\"tail {i}\");\n\
             }",
        )
        .unwrap();
    assert_eq!(interp.output(), "two\ntail 2\ntail 3\n");
}

#[test]
fn switch_compares_with_the_eq_spec() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var box = object();\n\
             box ~ {\n\
                 priv tag = \"boxed\";\n\
                 spec eq(other) { return tag == other; }\n\
             };\n\
             switch box {\n\
                 case \"boxed\" { print(\"matched\"); }\n\
                 case \"other\" { print(\"wrong\"); }\n\
             }",
        )
        .unwrap();
    assert_eq!(interp.output(), "matched\n");
}
