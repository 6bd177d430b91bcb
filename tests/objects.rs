use safulate::{ErrorKind, Interpreter};

#[test]
fn edit_blocks_declare_public_and_private_attributes() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var jar = object();\n\
             jar ~ {\n\
                 priv seal = \"wax\";\n\
                 pub label = \"honey\";\n\
                 pub peek = \\seal;\n\
             };\n\
             assert(jar.label == \"honey\");\n\
             assert(jar.peek == \"wax\");",
        )
        .unwrap();
}

#[test]
fn private_attributes_are_invisible_from_outside() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source(
            "var jar = object();\n\
             jar ~ { priv seal = \"wax\"; };\n\
             jar.seal;",
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Attribute);
}

#[test]
fn attribute_writes_require_an_edit_block() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source("var o = object(); o.x = 1;")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
}

#[test]
fn frame_locals_in_edit_blocks_stay_off_the_object() {
    let mut interp = Interpreter::new();
    let err = interp
        .run_source(
            "var o = object();\n\
             o ~ { var scratch = 1; pub kept = scratch + 1; };\n\
             assert(o.kept == 2);\n\
             o.scratch;",
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Attribute);
}

#[test]
fn methods_see_private_state_by_bare_name() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var cell = object();\n\
             cell ~ {\n\
                 priv stored = 1;\n\
                 func get() { return stored; }\n\
                 func put(v) { stored = v; }\n\
             };\n\
             assert(cell.get() == 1);\n\
             cell.put(9);\n\
             assert(cell.get() == 9);",
        )
        .unwrap();
}

#[test]
fn method_parent_binds_to_the_object_it_was_read_from() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var a = object();\n\
             var b = object();\n\
             a ~ {\n\
                 priv secret = \"from a\";\n\
                 func reveal() { return secret; }\n\
             };\n\
             b ~ { priv secret = \"from b\"; };\n\
             b ~ { pub reveal = a.reveal; };\n\
             assert(a.reveal() == \"from a\");\n\
             assert(b.reveal() == \"from b\");",
        )
        .unwrap();
}

#[test]
fn edit_blocks_reach_enclosing_scopes_for_unknown_names() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var outer = 5;\n\
             var o = object();\n\
             o ~ { pub grabbed = outer; outer = 6; };\n\
             assert(o.grabbed == 5);\n\
             assert(outer == 6);",
        )
        .unwrap();
}

#[test]
fn scope_reference_exposes_the_edit_target() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var holder = object();\n\
             holder ~ { pub me = $; };\n\
             assert(holder.me === holder);",
        )
        .unwrap();
}

#[test]
fn property_reads_invoke_the_getter() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "struct Counter() {\n\
                 priv count = 0;\n\
                 func val() [property] {\n\
                     return count;\n\
                 }\n\
                 func inc() {\n\
                     count = count + 1;\n\
                 }\n\
             }\n\
             var c = Counter();\n\
             print(c.val);\n\
             c.inc();\n\
             print(c.val);",
        )
        .unwrap();
    assert_eq!(interp.output(), "0\n1\n");
}

#[test]
fn property_writes_use_the_setter_when_present() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var store = object();\n\
             store ~ {\n\
                 priv raw = 0;\n\
                 func read() { return raw; }\n\
                 func write(v) { raw = v * 2; }\n\
                 pub doubled = property(read, write);\n\
             };\n\
             assert(store.doubled == 0);\n\
             store ~ { doubled = 21; };\n\
             assert(store.doubled == 42);",
        )
        .unwrap();
}

#[test]
fn prop_statements_declare_properties() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var clock = object();\n\
             clock ~ {\n\
                 priv ticks = 7;\n\
                 prop now { return ticks; }\n\
             };\n\
             assert(clock.now == 7);",
        )
        .unwrap();
}

#[test]
fn decorators_chain_left_to_right() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func double(f) {\n\
                 func wrapped(x) { return f(x) * 2; }\n\
                 return wrapped;\n\
             }\n\
             func add_one(f) {\n\
                 func wrapped(x) { return f(x) + 1; }\n\
                 return wrapped;\n\
             }\n\
             func base(x) [double, add_one] { return x; }\n\
             assert(base(5) == 11);",
        )
        .unwrap();
}

#[test]
fn decorator_partials_pass_configuration() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func scaled(f, factor) {\n\
                 func wrapped(x) { return f(x) * factor; }\n\
                 return wrapped;\n\
             }\n\
             func base(x) [scaled[10]] { return x + 1; }\n\
             assert(base(4) == 50);",
        )
        .unwrap();
}

#[test]
fn decorator_results_replace_the_binding_verbatim() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "func five(f) { return 5; }\n\
             func shout() [five] { return 1; }\n\
             assert(shout == 5);",
        )
        .unwrap();
}

#[test]
fn get_attr_spec_overrides_attribute_access() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var proxy = object();\n\
             proxy ~ { spec get_attr(name) { return \"got \" + name; } };\n\
             assert(proxy.anything == \"got anything\");",
        )
        .unwrap();
}

#[test]
fn dir_lists_public_attributes() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var o = object();\n\
             o ~ { pub a = 1; pub b = 2; };\n\
             var names = dir(o);\n\
             assert(names contains \"a\");\n\
             assert(names contains \"b\");\n\
             assert(names.len == 2);",
        )
        .unwrap();
}
