use safulate::{ErrorKind, Interpreter};

#[test]
fn block_declarations_shadow_outer_bindings() {
    let mut interp = Interpreter::new();
    interp
        .run_source("var x = 5; { var x = 10; print(x); } print(x);")
        .unwrap();
    assert_eq!(interp.output(), "10\n5\n");
}

#[test]
fn plain_assignment_mutates_the_outer_binding() {
    let mut interp = Interpreter::new();
    interp
        .run_source("var x = 5; { x = 10; } print(x);")
        .unwrap();
    assert_eq!(interp.output(), "10\n");
}

#[test]
fn block_locals_do_not_escape() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("{ var z = 10; } print(z);")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Name);
}

#[test]
fn assignment_requires_an_existing_binding() {
    let mut interp = Interpreter::new();
    let err = interp.run_source("ghost = 1;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Name);
}

#[test]
fn let_behaves_like_var() {
    let mut interp = Interpreter::new();
    interp
        .run_source("let a = 1; { let a = 2; print(a); } print(a);")
        .unwrap();
    assert_eq!(interp.output(), "2\n1\n");
}

#[test]
fn del_removes_the_owning_binding() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("var x = 1; del x; print(x);")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Name);

    let mut interp = Interpreter::new();
    let err = interp.run_source("del nothing;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Name);
}

#[test]
fn functions_capture_their_defining_environment() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var base = 10;\n\
             func make_adder(n) {\n\
                 func adder(x) { return base + n + x; }\n\
                 return adder;\n\
             }\n\
             var add5 = make_adder(5);\n\
             print(add5(1));\n\
             base = 100;\n\
             print(add5(1));",
        )
        .unwrap();
    assert_eq!(interp.output(), "16\n106\n");
}

#[test]
fn dynamic_names_declare_and_read() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var key = \"count\";\n\
             pub {: key } = 3;\n\
             print(count);\n\
             print({: \"cou\" + \"nt\" });",
        )
        .unwrap();
    assert_eq!(interp.output(), "3\n3\n");
}
