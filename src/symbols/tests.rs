//! Unit tests for the symbol model and the symbol-tree builder.

use super::{
    builder::{build, SymbolTreeBuilder},
    scope::{lookup, Scope, ScopeId, ScopeKind},
    symbols::{SymbolProgram, Variable},
};
use crate::{ast::types::Type, errors::diagnostics::Diagnostics, parse_source, PassState, Position};

fn build_source(source: &str) -> (SymbolProgram, Diagnostics) {
    let program = parse_source(source, "test.knight").unwrap();
    build(&program)
}

fn messages(diagnostics: &Diagnostics) -> Vec<String> {
    diagnostics.iter().map(|d| d.message.clone()).collect()
}

#[test]
fn test_builtins_are_registered() {
    let symbols = SymbolProgram::new();

    let print = symbols.get_function("print").unwrap();
    assert!(print.is_builtin);
    assert_eq!(print.return_type(), &Type::Void);
    assert_eq!(print.signature.parameter_types(), vec![&Type::Str]);

    let random = symbols.get_function("random").unwrap();
    assert_eq!(random.signature.parameters.len(), 2);
    assert_eq!(random.return_type(), &Type::Int);
}

#[test]
fn test_collects_declarations() {
    let source = r#"
        int counter = 0;
        interface Shape { fn area(): int; }
        class Square use Shape {
            int side;
            fn area(): int { ret side * side; }
        }
        fn main(): void { print("hi"); }
    "#;
    let (symbols, diagnostics) = build_source(source);

    assert!(diagnostics.is_empty());
    assert_eq!(symbols.get_variable("counter").unwrap().ty, Type::Int);
    assert!(symbols.get_interface("Shape").unwrap().functions.contains_key("area"));

    let square = symbols.get_class("Square").unwrap();
    assert!(square.fields.contains_key("side"));
    assert!(square.functions.contains_key("area"));
    assert!(square.implemented_interfaces.contains("Shape"));
    assert!(!symbols.get_function("main").unwrap().is_builtin);
}

#[test]
fn test_duplicate_class_keeps_first() {
    let source = "class A { int x; }\nclass A { string y; }";
    let (symbols, diagnostics) = build_source(source);

    assert_eq!(messages(&diagnostics), vec!["Class 'A' is already defined"]);
    let diagnostic = diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.line(), 2);
    assert_eq!(diagnostic.col(), 7);

    let class = symbols.get_class("A").unwrap();
    assert!(class.fields.contains_key("x"));
    assert!(!class.fields.contains_key("y"));
}

#[test]
fn test_duplicate_function_and_builtin() {
    let source = r#"
        fn f(): void { }
        fn f(): int { ret 1; }
        fn print(string s): void { }
    "#;
    let (symbols, diagnostics) = build_source(source);

    assert_eq!(
        messages(&diagnostics),
        vec![
            "Function 'f' is already defined",
            "Function 'print' is already defined"
        ]
    );
    assert_eq!(symbols.get_function("f").unwrap().return_type(), &Type::Void);
    assert!(symbols.get_function("print").unwrap().is_builtin);
}

#[test]
fn test_duplicate_members() {
    let source = r#"
        class C {
            int x;
            string x;
            fn m(): void { }
            fn m(): void { }
        }
    "#;
    let (_, diagnostics) = build_source(source);

    assert_eq!(
        messages(&diagnostics),
        vec![
            "Field 'x' is already defined in class 'C'",
            "Method 'm' is already defined in class 'C'"
        ]
    );
}

#[test]
fn test_duplicate_parameters_and_locals() {
    let source = r#"
        fn f(int a, string a): void {
            int b = 1;
            int b = 2;
            int a = 3;
        }
    "#;
    let (_, diagnostics) = build_source(source);

    assert_eq!(
        messages(&diagnostics),
        vec![
            "Parameter 'a' is already defined in function 'f'",
            "Variable 'b' is already defined in function 'f'",
            "Variable 'a' is already defined in function 'f'"
        ]
    );
}

#[test]
fn test_shadowing_in_nested_blocks_is_allowed() {
    let source = r#"
        fn f(int n): void {
            int x = 0;
            { int x = 1; }
            while (n > 0) { int y = 2; n = n - 1; }
            for (int i = 0; i < n; i = i + 1) { int x = i; }
        }
    "#;
    let (_, diagnostics) = build_source(source);

    assert!(diagnostics.is_empty(), "{}", diagnostics);
}

#[test]
fn test_local_slots_follow_declaration_order() {
    let source = "fn f(int a, int b): int { int c = a; { int d = b; } ret c; }";
    let (symbols, _) = build_source(source);

    let function = symbols.get_function("f").unwrap();
    let slot = |name: &str| function.locals.get(name).unwrap().lv_index;
    assert_eq!(slot("a"), Some(0));
    assert_eq!(slot("b"), Some(1));
    assert_eq!(slot("c"), Some(2));
    assert_eq!(slot("d"), Some(3));
}

#[test]
fn test_method_names_are_qualified_in_messages() {
    let source = "class C { fn m(int a, int a): void { } }";
    let (_, diagnostics) = build_source(source);

    assert_eq!(
        messages(&diagnostics),
        vec!["Parameter 'a' is already defined in function 'C.m'"]
    );
}

#[test]
fn test_enum_members_are_global_ints() {
    let source = "enum Color { Red, Green }\nenum Light { Red }";
    let (symbols, diagnostics) = build_source(source);

    assert_eq!(symbols.get_variable("Green").unwrap().ty, Type::Int);
    assert_eq!(
        messages(&diagnostics),
        vec!["Enum member 'Red' of 'Light' is already defined"]
    );
}

#[test]
fn test_cyclic_inheritance() {
    let source = "class A ext B { }\nclass B ext A { }\nclass C ext A { }";
    let (_, diagnostics) = build_source(source);

    assert_eq!(
        messages(&diagnostics),
        vec![
            "Cyclic inheritance involving class 'A'",
            "Cyclic inheritance involving class 'B'"
        ]
    );
}

#[test]
fn test_cyclic_interface_extension() {
    let source = "interface I ext J { }\ninterface J ext I { }\ninterface K ext K { }";
    let (_, diagnostics) = build_source(source);

    assert_eq!(
        messages(&diagnostics),
        vec![
            "Cyclic extension involving interface 'I'",
            "Cyclic extension involving interface 'J'",
            "Cyclic extension involving interface 'K'"
        ]
    );
}

#[test]
fn test_inherited_lookup() {
    let source = r#"
        class Base { int x; fn get(): int { ret x; } }
        class Derived ext Base { int y; }
    "#;
    let (symbols, _) = build_source(source);

    let (owner, method) = symbols.find_method("Derived", "get").unwrap();
    assert_eq!(owner.name, "Base");
    assert_eq!(method.return_type(), &Type::Int);

    let (owner, _) = symbols.find_field("Derived", "x").unwrap();
    assert_eq!(owner.name, "Base");
    assert!(symbols.find_field("Base", "y").is_none());

    let chain: Vec<&str> = symbols
        .class_chain("Derived")
        .iter()
        .map(|class| class.name.as_str())
        .collect();
    assert_eq!(chain, vec!["Derived", "Base"]);
}

#[test]
fn test_assignability() {
    let source = r#"
        interface Named { fn name(): string; }
        interface Shape ext Named { fn area(): int; }
        class Base { }
        class Derived ext Base use Shape { }
    "#;
    let (symbols, _) = build_source(source);
    let named = |name: &str| Type::Named(name.to_string());

    assert!(symbols.is_assignable(&named("Base"), &named("Derived")));
    assert!(!symbols.is_assignable(&named("Derived"), &named("Base")));
    assert!(symbols.is_assignable(&named("Shape"), &named("Shape")));
    assert!(!symbols.is_assignable(&named("Shape"), &named("Derived")));
    assert!(!symbols.is_assignable(&named("Named"), &named("Shape")));
    assert!(!symbols.is_assignable(&Type::Int, &Type::Str));
    assert!(symbols.is_assignable(&Type::Int, &Type::Error));
    assert!(symbols.is_assignable(&Type::Error, &named("Base")));
    assert!(symbols.is_assignable(&Type::IntArray, &Type::IntArray));
}

#[test]
fn test_interface_method_lookup_follows_extension() {
    let source = "interface Named { fn name(): string; }\ninterface Shape ext Named { }";
    let (symbols, _) = build_source(source);

    let (owner, _) = symbols.find_interface_method("Shape", "name").unwrap();
    assert_eq!(owner.name, "Named");
    assert!(symbols.find_interface_method("Named", "area").is_none());
}

#[test]
fn test_builder_merges_files() {
    let first = parse_source("class A { }", "a.knight").unwrap();
    let second = parse_source("class B ext A { }\nclass A { }", "b.knight").unwrap();

    let mut builder = SymbolTreeBuilder::new();
    assert_eq!(builder.state(), PassState::NotStarted);
    builder.build(&first);
    assert_eq!(builder.state(), PassState::Traversing);
    builder.build(&second);
    let (symbols, diagnostics) = builder.finish();

    assert_eq!(builder.state(), PassState::CompletedWithDiagnostics);
    assert!(symbols.is_subclass("B", "A"));
    let diagnostic = diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.position.file.as_str(), "b.knight");
    assert_eq!(diagnostic.line(), 2);
}

#[test]
fn test_scope_lookup_walks_parents() {
    let file = std::rc::Rc::new(String::from("test.knight"));
    let mut scopes = vec![
        Scope::new(None, ScopeKind::Parameters),
        Scope::new(Some(ScopeId(0)), ScopeKind::Block),
    ];
    assert!(scopes[0].declare(Variable::new("a", Type::Int, Position::new(1, 1, file.clone()))));
    assert!(scopes[1].declare(Variable::new("b", Type::Str, Position::new(2, 1, file.clone()))));
    assert!(!scopes[1].declare(Variable::new("b", Type::Int, Position::new(3, 1, file))));

    let (found, kind) = lookup(&scopes, ScopeId(1), "a").unwrap();
    assert_eq!(found.ty, Type::Int);
    assert_eq!(kind, ScopeKind::Parameters);

    let (found, kind) = lookup(&scopes, ScopeId(1), "b").unwrap();
    assert_eq!(found.ty, Type::Str);
    assert_eq!(kind, ScopeKind::Block);

    assert!(lookup(&scopes, ScopeId(0), "b").is_none());
}
