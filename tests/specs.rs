use safulate::{ErrorKind, Interpreter};

#[test]
fn add_spec_drives_the_plus_operator() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var x = object();\n\
             x ~ { spec add(o) { return 5; } };\n\
             print(x + \"test\");",
        )
        .unwrap();
    assert_eq!(interp.output(), "5\n");
}

#[test]
fn missing_spec_is_a_type_error() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("var x = object(); x + 1;")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn objects_without_eq_compare_by_identity() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var a = object();\n\
             var b = object();\n\
             assert(a == a);\n\
             assert(!(a == b));\n\
             assert(a != b);",
        )
        .unwrap();
}

#[test]
fn identity_operator_distinguishes_lists() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var a = [1];\n\
             var b = [1];\n\
             assert(a === a);\n\
             assert(!(a === b));\n\
             assert(1 === 1);",
        )
        .unwrap();
}

#[test]
fn containment_dispatches_to_the_container() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "assert(2 in [1, 2, 3]);\n\
             assert(!(5 in [1, 2, 3]));\n\
             assert([1, 2] contains 2);\n\
             assert(\"ell\" in \"hello\");\n\
             var d = dict(k = 1);\n\
             assert(\"k\" in d);",
        )
        .unwrap();
}

#[test]
fn contains_spec_can_be_user_defined() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var bag = object();\n\
             bag ~ { spec contains(item) { return item == 42; } };\n\
             assert(42 in bag);\n\
             assert(!(7 in bag));",
        )
        .unwrap();
}

#[test]
fn pipe_and_amp_default_to_logical_choice() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "assert((0 | 5) == 5);\n\
             assert((2 | 5) == 2);\n\
             assert((2 & 5) == 5);\n\
             assert((0 & 5) == 0);",
        )
        .unwrap();
}

#[test]
fn or_spec_overrides_the_pipe_operator() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var v = object();\n\
             v ~ { spec or(o) { return \"either\"; } };\n\
             assert((v | 1) == \"either\");",
        )
        .unwrap();
}

#[test]
fn unary_specs_dispatch() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var n = object();\n\
             n ~ {\n\
                 spec neg() { return \"negated\"; }\n\
                 spec bool() { return false; }\n\
             };\n\
             assert(-n == \"negated\");\n\
             assert(!n);",
        )
        .unwrap();
}

#[test]
fn repr_spec_controls_printing() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var p = object();\n\
             p ~ { spec repr() { return \"<custom>\"; } };\n\
             print(p:r);",
        )
        .unwrap();
    assert_eq!(interp.output(), "<custom>\n");
}

#[test]
fn format_postfix_reaches_repr_str_and_hash() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "assert(5:r == \"5\");\n\
             assert(\"hi\":r == \"'hi'\");\n\
             assert(\"hi\":s == \"hi\");\n\
             assert(5:h == 5:h);",
        )
        .unwrap();
}

#[test]
fn short_circuit_forms_keep_their_own_semantics() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "assert((0 || 7) == 7);\n\
             assert((3 || 7) == 3);\n\
             assert((3 && 7) == true);\n\
             assert((0 && 7) == false);\n\
             var hits = [];\n\
             func note() { hits.append(1); return 1; }\n\
             var ignored = 1 || note();\n\
             assert(hits.len == 0);",
        )
        .unwrap();
}

#[test]
fn compound_assignment_uses_the_same_dispatch() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var t = 2;\n\
             t **= 3;\n\
             assert(t == 8);\n\
             var acc = object();\n\
             acc ~ { spec add(o) { return 99; } };\n\
             acc += 1;\n\
             assert(acc == 99);",
        )
        .unwrap();
}

#[test]
fn spec_snapshot_lists_defined_specs() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var s = object();\n\
             s ~ {\n\
                 spec add(o) { return 1; }\n\
                 pub names = $get_specs().keys();\n\
             };\n\
             assert(s.names contains \"add\");",
        )
        .unwrap();
}

#[test]
fn unknown_spec_names_are_rejected() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("var s = object(); s ~ { spec zap(o) { return 1; } };")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Value);
}

#[test]
fn custom_iteration_protocol_feeds_for_loops() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var counter = object();\n\
             counter ~ {\n\
                 priv n = 0;\n\
                 spec iter() { return $$; }\n\
                 spec next() {\n\
                     n = n + 1;\n\
                     if n > 3 { break; }\n\
                     return n;\n\
                 }\n\
             };\n\
             var seen = [];\n\
             for v in counter { seen.append(v); }\n\
             assert(seen.len == 3);\n\
             assert(seen[0] == 1);\n\
             assert(seen[2] == 3);",
        )
        .unwrap();
}
