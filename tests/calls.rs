use safulate::{ErrorKind, Interpreter};

#[test]
fn positional_spread_splices_in_order() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func test(a1, a2, a3, a4, a5) {\n\
                 assert(a1 == 1);\n\
                 assert(a2 == 2);\n\
                 assert(a3 == 3);\n\
                 assert(a4 == 4);\n\
                 assert(a5 == 5);\n\
                 return a1 + a2 + a3 + a4 + a5;\n\
             }\n\
             assert(test(1, ..[2, 3, 4], 5) == 15);",
        )
        .unwrap();
}

#[test]
fn partial_application_prepends_positionals() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func add3(a, b, c) { return a + b + c; }\n\
             assert(add3[1, 2](3) == add3(1, 2, 3));\n\
             assert(add3[..[1]](..[2, 3]) == 6);\n\
             var part = add3[1, 2];\n\
             assert(part.partial_args.len == 2);\n\
             assert(part.without_partials()(7, 8, 9) == 24);",
        )
        .unwrap();
}

#[test]
fn defaults_are_evaluated_in_the_captured_environment() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var base = 10;\n\
             func bump(n = base + 1) { return n; }\n\
             assert(bump() == 11);\n\
             base = 20;\n\
             assert(bump() == 21);\n\
             assert(bump(1) == 1);",
        )
        .unwrap();
}

#[test]
fn block_defaults_yield_their_last_value() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func pick(n = { var t = 2; t * 3 }) { return n; }\n\
             assert(pick() == 6);",
        )
        .unwrap();
}

#[test]
fn keyword_arguments_bind_by_name() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func greet(name, greeting = \"hi\") { return f\"{greeting} {name}\"; }\n\
             assert(greet(\"bo\") == \"hi bo\");\n\
             assert(greet(\"bo\", greeting = \"yo\") == \"yo bo\");\n\
             assert(greet(name = \"ann\") == \"hi ann\");",
        )
        .unwrap();
}

#[test]
fn varargs_and_varkwargs_collect_leftovers() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func gather(first, ..rest, ...extra) {\n\
                 return [first, rest.len, extra.len];\n\
             }\n\
             var got = gather(1, 2, 3, flag = 4);\n\
             assert(got[0] == 1);\n\
             assert(got[1] == 2);\n\
             assert(got[2] == 1);",
        )
        .unwrap();
}

#[test]
fn keyword_spread_unpacks_dictionaries() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func combo(a, b) { return a * 10 + b; }\n\
             assert(combo(...dict(a = 1, b = 2)) == 12);",
        )
        .unwrap();
}

#[test]
fn dynamic_keyword_names_are_applied_last() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func probe(alpha = 0) { return alpha; }\n\
             assert(probe({: \"al\" + \"pha\" } = 5) == 5);",
        )
        .unwrap();
}

#[test]
fn missing_required_argument_fails() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("func f(a, b) { return a; } f(1);")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Argument);
}

#[test]
fn extra_positional_argument_fails() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("func f(a) { return a; } f(1, 2);")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Argument);
}

#[test]
fn unexpected_keyword_fails() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("func f(a) { return a; } f(1, zap = 2);")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Argument);
}

#[test]
fn duplicate_keyword_fails() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("func f(a) { return a; } f(a = 1, {: \"a\" } = 2);")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Argument);
}

#[test]
fn calling_a_non_callable_fails() {
    let mut interp = Interpreter::new();
    let err = interp.run_source("var n = 5; n();").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn call_spec_makes_objects_callable() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var machine = object();\n\
             machine ~ { spec call(x) { return x * 2; } };\n\
             assert(machine(21) == 42);",
        )
        .unwrap();
}

#[test]
fn functions_without_return_yield_null() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func quiet() { var x = 1; }\n\
             assert(quiet() == null);",
        )
        .unwrap();
}
