use safulate::Interpreter;

#[test]
fn fstrings_interpolate_expressions() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var name = \"saf\";\n\
             assert(f\"hi {name}!\" == \"hi saf!\");\n\
             assert(f\"{1 + 2}\" == \"3\");\n\
             assert(f\"{name}{name}\" == \"safsaf\");\n\
             var xs = [1, 2];\n\
             assert(f\"len {xs.len}\" == \"len 2\");",
        )
        .unwrap();
}

#[test]
fn fstring_interpolation_matches_add_spec_concatenation() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var n = 7;\n\
             assert(f\"n={n}\" == \"n=\" + n);",
        )
        .unwrap();
}

#[test]
fn escapes_resolve_in_string_literals() {
    let mut interp = Interpreter::new();
    interp
        .run_source("print(\"a\\tb\"); print(\"line1\\nline2\"); print(\"q\\\"q\");")
        .unwrap();
    assert_eq!(interp.output(), "a\tb\nline1\nline2\nq\"q\n");
}

#[test]
fn iteration_and_length_use_grapheme_clusters() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "assert(\"h\u{e9}llo\".len == 5);\n\
             var chars = [];\n\
             for c in \"h\u{e9}llo\" { chars.append(c); }\n\
             assert(chars.len == 5);\n\
             assert(chars[1] == \"\u{e9}\");",
        )
        .unwrap();
}

#[test]
fn format_substitutes_placeholders_in_order() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "assert(\"x={}, y={}\".format(1, 2) == \"x=1, y=2\");\n\
             assert(\"{} again {}\".format(\"one\") == \"one again {}\");",
        )
        .unwrap();
}

#[test]
fn case_and_query_methods() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "assert(\"abc\".upper() == \"ABC\");\n\
             assert(\"AbC\".lower() == \"abc\");\n\
             assert(\"hello world\".title() == \"Hello World\");\n\
             assert(\"hello\".capitalize() == \"Hello\");\n\
             assert(\"123\".is_digit());\n\
             assert(!\"12a\".is_digit());\n\
             assert(\"abc\".is_alpha());\n\
             assert(\"hello\".startswith(\"he\"));\n\
             assert(\"hello\".endswith(\"lo\"));",
        )
        .unwrap();
}

#[test]
fn slicing_helpers() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "assert(\"hello\".index(\"ll\") == 2);\n\
             assert(\"a-b-c\".split(\"-\")[1] == \"b\");\n\
             assert(\"xxyxx\".replace(\"x\", \"z\", 2) == \"zzyxx\");\n\
             assert(\"  pad  \".strip(\" \") == \"pad\");\n\
             assert(\"prefix_rest\".remove_prefix(\"prefix_\") == \"rest\");\n\
             assert(\"ababab\".count(\"ab\") == 3);",
        )
        .unwrap();
}

#[test]
fn subscripting_supports_negative_indexes() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "assert(\"hello\"[0] == \"h\");\n\
             assert(\"hello\"[0 - 1] == \"o\");\n\
             var xs = [1, 2, 3];\n\
             assert(xs[0 - 1] == 3);",
        )
        .unwrap();
}

#[test]
fn string_multiplication_repeats() {
    let mut interp = Interpreter::new();
    interp
        .run_source("assert(\"ab\" * 3 == \"ababab\");")
        .unwrap();
}

#[test]
fn raw_strings_build_patterns() {
    let mut interp = Interpreter::new();
    interp
        .run_source(
            "var pat = r\"[0-9]+\";\n\
             assert(pat.test(\"abc123\"));\n\
             assert(!pat.test(\"abc\"));\n\
             assert(pat.find(\"abc123\") == \"123\");\n\
             assert(pat.find(\"abc\") == null);\n\
             assert(pat.find_all(\"1a2b3\").len == 3);\n\
             assert(pat.replace(\"a1b22\", \"#\") == \"a#b#\");\n\
             assert(pat.source == \"[0-9]+\");",
        )
        .unwrap();
}

#[test]
fn numbers_print_without_trailing_fraction() {
    let mut interp = Interpreter::new();
    interp
        .run_source("print(5); print(2.5); print(10 / 4); print(1e3);")
        .unwrap();
    assert_eq!(interp.output(), "5\n2.5\n2.5\n1000\n");
}
