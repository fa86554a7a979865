use jackc::{compile_str, JackError, SymbolError};

fn compile(source: &str) -> String {
    match compile_str(source) {
        Ok(vm_text) => vm_text,
        Err(err) => panic!("{}", err),
    }
}

/// True when the needle lines appear consecutively in the output.
fn contains_lines(haystack: &str, needle: &[&str]) -> bool {
    let lines: Vec<&str> = haystack.lines().collect();
    if needle.is_empty() {
        return true;
    }
    lines
        .windows(needle.len())
        .any(|window| window == needle)
}

#[test]
fn test_literal_constant_return() {
    let vm_text = compile("class Main { function void main() { return 0; } }");

    assert_eq!(
        vm_text,
        "function Main.main 0\npush constant 0\nreturn\n"
    );
}

#[test]
fn test_empty_class_emits_nothing() {
    assert_eq!(compile("class C {}"), "");
}

#[test]
fn test_class_var_decs_emit_no_instructions() {
    let vm_text = compile("class C { static int a; field int b, c; }");
    assert_eq!(vm_text, "");
}

#[test]
fn test_keyword_constants() {
    let vm_text = compile(
        "class Main { function boolean main() { return true; } }",
    );
    assert!(contains_lines(
        &vm_text,
        &["push constant 0", "not", "return"]
    ));

    let vm_text = compile(
        "class Main { function boolean main() { return false; } }",
    );
    assert!(contains_lines(&vm_text, &["push constant 0", "return"]));

    let vm_text = compile(
        "class Main { function Main main() { return null; } }",
    );
    assert!(contains_lines(&vm_text, &["push constant 0", "return"]));
}

#[test]
fn test_string_constant() {
    let vm_text = compile(
        "class Main { function void main() { do Output.printString(\"Hi\"); return; } }",
    );

    assert!(contains_lines(
        &vm_text,
        &[
            "push constant 2",
            "call String.new 1",
            "push constant 72",
            "call String.appendChar 2",
            "push constant 105",
            "call String.appendChar 2",
            "call Output.printString 1",
            "pop temp 0",
        ]
    ));
}

#[test]
fn test_method_call_on_self() {
    let vm_text = compile(
        "class C { method void foo() { do bar(); return; } }",
    );

    // Method prologue binds the receiver argument to `this`.
    assert!(contains_lines(
        &vm_text,
        &["function C.foo 0", "push argument 0", "pop pointer 0"]
    ));
    // An unprefixed call pushes the current object as receiver.
    assert!(contains_lines(
        &vm_text,
        &["push pointer 0", "call C.bar 1", "pop temp 0"]
    ));
}

#[test]
fn test_method_call_on_object_pushes_receiver_before_args() {
    let vm_text = compile(
        "class Main {
            function void main() {
                var Square s;
                do s.move(1, 2);
                return;
            }
        }",
    );

    assert!(contains_lines(
        &vm_text,
        &[
            "push local 0",
            "push constant 1",
            "push constant 2",
            "call Square.move 3",
            "pop temp 0",
        ]
    ));
}

#[test]
fn test_function_call_with_class_prefix() {
    let vm_text = compile(
        "class Main { function void main() { do Output.println(); return; } }",
    );

    assert!(contains_lines(
        &vm_text,
        &["call Output.println 0", "pop temp 0"]
    ));
}

#[test]
fn test_constructor_allocates_fields() {
    let vm_text = compile(
        "class Point {
            field int x, y;
            static int count;

            constructor Point new() {
                return this;
            }
        }",
    );

    // Two fields to allocate; the static does not count.
    assert!(contains_lines(
        &vm_text,
        &[
            "function Point.new 0",
            "push constant 2",
            "call Memory.alloc 1",
            "pop pointer 0",
            "push pointer 0",
            "return",
        ]
    ));
}

#[test]
fn test_array_assignment() {
    let vm_text = compile(
        "class Main {
            function void main() {
                var Array a;
                var int i, j;
                let a[i] = j;
                return;
            }
        }",
    );

    assert!(contains_lines(
        &vm_text,
        &[
            "push local 0",
            "push local 1",
            "add",
            "push local 2",
            "pop temp 0",
            "pop pointer 1",
            "push temp 0",
            "pop that 0",
        ]
    ));
}

#[test]
fn test_array_read() {
    let vm_text = compile(
        "class Main {
            function int main() {
                var Array a;
                var int i;
                return a[i + 1];
            }
        }",
    );

    assert!(contains_lines(
        &vm_text,
        &[
            "push local 0",
            "push local 1",
            "push constant 1",
            "add",
            "add",
            "pop pointer 1",
            "push that 0",
            "return",
        ]
    ));
}

#[test]
fn test_if_else_labels() {
    let vm_text = compile(
        "class C {
            function void f() {
                if (false) {
                    return;
                } else {
                    return;
                }
            }
        }",
    );

    // Condition is negated before the branch.
    assert!(contains_lines(
        &vm_text,
        &["push constant 0", "not", "if-goto C.f$ELSE_0"]
    ));

    let else_pos = vm_text.find("label C.f$ELSE_0").unwrap();
    let end_pos = vm_text.find("label C.f$IF_END_0").unwrap();
    assert!(else_pos < end_pos);
    assert!(vm_text.contains("goto C.f$IF_END_0"));
}

#[test]
fn test_if_without_else_uses_end_label() {
    let vm_text = compile(
        "class C { function void f() { if (false) { return; } return; } }",
    );

    assert!(contains_lines(&vm_text, &["not", "if-goto C.f$IF_END_0"]));
    assert!(!vm_text.contains("ELSE"));
}

#[test]
fn test_while_labels() {
    let vm_text = compile(
        "class C { function void f() { while (true) {} return; } }",
    );

    assert!(contains_lines(
        &vm_text,
        &[
            "label C.f$WHILE_BEGIN_0",
            "push constant 0",
            "not",
            "not",
            "if-goto C.f$WHILE_END_0",
            "goto C.f$WHILE_BEGIN_0",
            "label C.f$WHILE_END_0",
        ]
    ));
}

#[test]
fn test_nested_control_flow_labels_are_distinct() {
    let vm_text = compile(
        "class C {
            function void f() {
                while (true) {
                    while (false) {
                        if (true) {}
                    }
                    if (false) {}
                }
                return;
            }
        }",
    );

    for label in [
        "C.f$WHILE_BEGIN_0",
        "C.f$WHILE_END_0",
        "C.f$WHILE_BEGIN_1",
        "C.f$WHILE_END_1",
        "C.f$IF_END_0",
        "C.f$IF_END_1",
    ] {
        let full = format!("label {}", label);
        assert_eq!(
            vm_text.matches(full.as_str()).count(),
            1,
            "{label} should be defined exactly once",
        );
    }
}

#[test]
fn test_label_counters_reset_per_subroutine() {
    let vm_text = compile(
        "class C {
            function void f() { if (true) {} return; }
            function void g() { if (true) {} return; }
        }",
    );

    assert!(vm_text.contains("label C.f$IF_END_0"));
    assert!(vm_text.contains("label C.g$IF_END_0"));
    assert!(!vm_text.contains("IF_END_1"));
}

#[test]
fn test_operators_lower_left_to_right() {
    let vm_text = compile(
        "class Main { function int main() { return 1 + 2 * 3; } }",
    );

    // No precedence: (1 + 2) * 3 in evaluation order.
    assert!(contains_lines(
        &vm_text,
        &[
            "push constant 1",
            "push constant 2",
            "add",
            "push constant 3",
            "call Math.multiply 2",
            "return",
        ]
    ));
}

#[test]
fn test_comparison_and_logic_operators() {
    let vm_text = compile(
        "class Main {
            function boolean main(int a, int b) {
                return (a < b) & (a > b) | (a = b);
            }
        }",
    );

    for instr in ["lt", "gt", "and", "or", "eq"] {
        assert!(
            contains_lines(&vm_text, &[instr]),
            "missing {instr} in:\n{vm_text}"
        );
    }
}

#[test]
fn test_division_calls_runtime() {
    let vm_text = compile(
        "class Main { function int main() { return 6 / 3; } }",
    );
    assert!(contains_lines(&vm_text, &["call Math.divide 2"]));
}

#[test]
fn test_unary_operators() {
    let vm_text = compile(
        "class Main { function int main() { return -(~5); } }",
    );
    assert!(contains_lines(
        &vm_text,
        &["push constant 5", "not", "neg"]
    ));
}

#[test]
fn test_void_return_pushes_zero() {
    let vm_text = compile(
        "class Main { function void main() { return; } }",
    );
    assert!(contains_lines(&vm_text, &["push constant 0", "return"]));
}

#[test]
fn test_locals_count_spans_all_var_decs() {
    let vm_text = compile(
        "class Main {
            function void main() {
                var int a, b;
                var boolean c;
                return;
            }
        }",
    );
    assert!(vm_text.starts_with("function Main.main 3\n"));
}

#[test]
fn test_method_params_offset_by_receiver() {
    let vm_text = compile(
        "class C {
            method int f(int a) {
                return a;
            }
        }",
    );

    // The declared parameter lands at argument 1, after `this`.
    assert!(contains_lines(&vm_text, &["push argument 1", "return"]));
}

#[test]
fn test_undeclared_variable_fails() {
    let result = compile_str(
        "class Main { function void main() { let x = 1; return; } }",
    );

    match result {
        Err(JackError::Symbol(SymbolError::Undeclared { name })) => {
            assert_eq!(name, "x");
        }
        other => panic!("expected an undeclared-variable error, got {other:?}"),
    }
}

#[test]
fn test_duplicate_local_fails() {
    let result = compile_str(
        "class Main {
            function void main() {
                var int a;
                var boolean a;
                return;
            }
        }",
    );
    assert!(matches!(
        result,
        Err(JackError::Symbol(SymbolError::DuplicateName { .. }))
    ));
}

#[test]
fn test_duplicate_field_fails() {
    let result = compile_str("class C { field int a; static char a; }");
    assert!(matches!(
        result,
        Err(JackError::Symbol(SymbolError::DuplicateName { .. }))
    ));
}

#[test]
fn test_local_shadows_field() {
    let vm_text = compile(
        "class C {
            field int x;
            method int f() {
                var int x;
                let x = 1;
                return x;
            }
        }",
    );

    // The local declaration wins over the field.
    assert!(contains_lines(&vm_text, &["push constant 1", "pop local 0"]));
    assert!(contains_lines(&vm_text, &["push local 0", "return"]));
}
