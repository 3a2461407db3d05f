//! Integration tests for the whole front end.
//!
//! These drive the public API from source text through tokenization,
//! parsing, symbol-tree construction, name resolution and type checking.

use knightc::{
    ast::{
        ast::{FunctionDecl, Item, Program},
        expressions::{BinaryOp, Expr, ExprKind, Identifier},
        printer::print_program,
        statements::{Stmt, StmtKind, VarDecl},
        types::Type,
    },
    compile_source, compile_sources,
    errors::diagnostics::Severity,
    parse_source, Compilation, Options,
};
use regex::Regex;

fn compile(source: &str) -> Compilation {
    compile_source(source, "main.knight", &Options::default()).unwrap()
}

fn messages(compilation: &Compilation) -> Vec<String> {
    compilation
        .diagnostics
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

const SCENARIO: &str = "class P { fn get(): int { ret 1; } } fn main(): void { P p = new P(); int v = p.get(); }";

#[test]
fn test_end_to_end_scenario() {
    let compilation = compile(SCENARIO);

    assert!(compilation.diagnostics.is_empty(), "{}", compilation.diagnostics);
    assert!(compilation.is_ready_for_codegen());

    let main = compilation.programs[0].functions().next().unwrap();
    let StmtKind::VarDecl(v) = &main.body[1].kind else {
        panic!("expected a declaration");
    };
    assert_eq!(v.name, "v");
    assert_eq!(v.ty, Type::Int);
    assert_eq!(v.init.as_ref().unwrap().resolved_type, Some(Type::Int));
}

#[test]
fn test_end_to_end_return_mismatch() {
    let source = SCENARIO.replace("ret 1;", "ret \"x\";");
    let compilation = compile(&source);

    assert_eq!(compilation.diagnostics.len(), 1);
    let diagnostic = compilation.diagnostics.iter().next().unwrap();
    assert!(diagnostic.is_error());
    assert!(diagnostic.message.contains("Return type mismatch"));
    assert_eq!((diagnostic.line(), diagnostic.col()), (1, 27));
    assert!(!compilation.is_ready_for_codegen());
}

#[test]
fn test_precedence() {
    let program = parse_source("int x = 1 + 2 * 3; bool y = a or b and c; int z = new Foo().bar(1);", "main.knight").unwrap();
    let inits: Vec<&ExprKind> = program
        .items
        .iter()
        .map(|item| match item {
            Item::Variable(var) => &var.init.as_ref().unwrap().kind,
            _ => panic!("expected variables"),
        })
        .collect();

    let ExprKind::Binary { op, lhs, rhs } = inits[0] else {
        panic!("expected a binary expression");
    };
    assert_eq!(*op, BinaryOp::Plus);
    assert!(matches!(lhs.kind, ExprKind::IntLiteral(1)));
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Times, .. }));

    let ExprKind::Binary { op, rhs, .. } = inits[1] else {
        panic!("expected a binary expression");
    };
    assert_eq!(*op, BinaryOp::Or);
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::And, .. }));

    let ExprKind::Call(call) = inits[2] else {
        panic!("expected a call");
    };
    assert_eq!(call.name.name, "bar");
    assert!(matches!(
        &call.receiver.as_ref().unwrap().kind,
        ExprKind::NewInstance { class } if class.name == "Foo"
    ));
}

const SHOWCASE: &str = r#"
    include <io>
    enum Color { Red, Green }
    interface Shape ext Named { fn area(): int; }
    interface Named { fn name(): string; }
    class Square use Shape {
        int side = 2;
        string label = "sq\n";
        fn area(): int { ret side * side; }
        fn name(): string { ret label + "!"; }
    }
    int[] values = [1, 2, 3];
    fn main(): void {
        Square s = new Square();
        int total = 0;
        for (int i = 0; i < 3; i = i + 1) {
            total = total + values[i] % 2 - (1 - i);
        }
        while (total > 10 and total != 11 or false) total = total - 1;
        s.side = total;
        int width = s.side;
        if (s.area() >= width) print(s.name()); else { values[0] = total; }
        string[] names = new string[2];
    }
"#;

/// Debug rendering of a tree without node ids and source spans.
fn structure(program: &Program) -> String {
    let spans = Regex::new(r"Span \{ start: Position \{ [^}]* \}, end: Position \{ [^}]* \} \}").unwrap();
    let ids = Regex::new(r"NodeId\(\d+\)").unwrap();

    let text = format!("{:?}", program.items);
    let text = spans.replace_all(&text, "Span");
    ids.replace_all(&text, "NodeId").into_owned()
}

#[test]
fn test_round_trip() {
    let program = parse_source(SHOWCASE, "main.knight").unwrap();
    let printed = print_program(&program);
    let reparsed = parse_source(&printed, "main.knight").unwrap();

    assert_eq!(print_program(&reparsed), printed);
    assert_eq!(structure(&reparsed), structure(&program));
}

fn annotate_identifier(identifier: &Identifier, missing: &mut Vec<String>) {
    if identifier.binding.is_none() {
        missing.push(format!(
            "binding of '{}' at {}:{}",
            identifier.name, identifier.span.start.line, identifier.span.start.col
        ));
    }
}

fn annotate_expr(expr: &Expr, missing: &mut Vec<String>) {
    if expr.resolved_type.is_none() {
        missing.push(format!(
            "type at {}:{}",
            expr.span.start.line, expr.span.start.col
        ));
    }

    match &expr.kind {
        ExprKind::IntLiteral(_) | ExprKind::StringLiteral(_) | ExprKind::BoolLiteral(_) => {}
        ExprKind::Identifier(identifier) => annotate_identifier(identifier, missing),
        ExprKind::Binary { lhs, rhs, .. } => {
            annotate_expr(lhs, missing);
            annotate_expr(rhs, missing);
        }
        ExprKind::Call(call) => {
            if let Some(receiver) = &call.receiver {
                annotate_expr(receiver, missing);
            }
            annotate_identifier(&call.name, missing);
            for arg in call.args.iter() {
                annotate_expr(arg, missing);
            }
        }
        ExprKind::FieldAccess { receiver, field } => {
            annotate_expr(receiver, missing);
            annotate_identifier(field, missing);
        }
        ExprKind::NewInstance { class } => annotate_identifier(class, missing),
        ExprKind::NewArray { length, .. } => annotate_expr(length, missing),
        ExprKind::Index { array, index } => {
            annotate_expr(array, missing);
            annotate_expr(index, missing);
        }
        ExprKind::ArrayLiteral(elements) => {
            for element in elements.iter() {
                annotate_expr(element, missing);
            }
        }
    }
}

fn annotate_var(var: &VarDecl, missing: &mut Vec<String>) {
    if let Some(init) = &var.init {
        annotate_expr(init, missing);
    }
}

fn annotate_stmt(stmt: &Stmt, missing: &mut Vec<String>) {
    match &stmt.kind {
        StmtKind::VarDecl(var) => annotate_var(var, missing),
        StmtKind::Assign { target, value } => {
            annotate_identifier(target, missing);
            annotate_expr(value, missing);
        }
        StmtKind::ArrayAssign {
            target,
            index,
            value,
        } => {
            annotate_identifier(target, missing);
            annotate_expr(index, missing);
            annotate_expr(value, missing);
        }
        StmtKind::FieldAssign {
            receiver,
            field,
            value,
        } => {
            annotate_expr(receiver, missing);
            annotate_identifier(field, missing);
            annotate_expr(value, missing);
        }
        StmtKind::Expression(expr) => annotate_expr(expr, missing),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            annotate_expr(condition, missing);
            annotate_stmt(then_branch, missing);
            if let Some(else_branch) = else_branch {
                annotate_stmt(else_branch, missing);
            }
        }
        StmtKind::While { condition, body } => {
            annotate_expr(condition, missing);
            annotate_stmt(body, missing);
        }
        StmtKind::For(for_loop) => {
            annotate_var(&for_loop.init, missing);
            annotate_expr(&for_loop.condition, missing);
            annotate_stmt(&for_loop.update, missing);
            annotate_stmt(&for_loop.body, missing);
        }
        StmtKind::Return(ret) => {
            if let Some(value) = &ret.value {
                annotate_expr(value, missing);
            }
        }
        StmtKind::Block(block) => {
            for stmt in block.stmts.iter() {
                annotate_stmt(stmt, missing);
            }
        }
    }
}

fn annotate_function(function: &FunctionDecl, missing: &mut Vec<String>) {
    for stmt in function.body.iter() {
        annotate_stmt(stmt, missing);
    }
    if let Some(value) = function.ret.as_ref().and_then(|ret| ret.value.as_ref()) {
        annotate_expr(value, missing);
    }
}

#[test]
fn test_clean_run_annotates_every_node() {
    let compilation = compile(SHOWCASE);
    assert!(compilation.diagnostics.is_empty(), "{}", compilation.diagnostics);

    let mut missing = vec![];
    for item in compilation.programs[0].items.iter() {
        match item {
            Item::Include(_) | Item::Enum(_) => {}
            Item::Interface(decl) => {
                for extended in decl.extends.iter() {
                    annotate_identifier(extended, &mut missing);
                }
            }
            Item::Class(decl) => {
                if let Some(parent) = &decl.parent {
                    annotate_identifier(parent, &mut missing);
                }
                for interface in decl.interfaces.iter() {
                    annotate_identifier(interface, &mut missing);
                }
                for field in decl.fields.iter() {
                    annotate_var(field, &mut missing);
                }
                for method in decl.methods.iter() {
                    annotate_function(method, &mut missing);
                }
            }
            Item::Function(function) => annotate_function(function, &mut missing),
            Item::Variable(var) => annotate_var(var, &mut missing),
        }
    }

    assert!(missing.is_empty(), "unannotated: {:?}", missing);
}

#[test]
fn test_duplicate_field_keeps_first() {
    let compilation = compile("class C { int x; string x; fn f(): int { ret x; } }");

    assert_eq!(messages(&compilation), vec!["Field 'x' is already defined in class 'C'"]);
    let class = compilation.symbols.get_class("C").unwrap();
    assert_eq!(class.fields.get("x").unwrap().ty, Type::Int);
}

#[test]
fn test_field_lookup_follows_ancestors_only() {
    let source = r#"
        class B { }
        class A ext B { int f; }
        fn main(): void {
            A a = new A();
            B b = new B();
            int x = a.f;
            int y = b.f;
        }
    "#;
    let compilation = compile(source);

    assert_eq!(messages(&compilation), vec!["Undefined field 'f' in class 'B'"]);
    assert_eq!(compilation.diagnostics.iter().next().unwrap().line(), 8);
}

#[test]
fn test_type_mismatch_surfaces_once() {
    let compilation = compile("int x = \"s\";\nint y = x + 1;");

    assert_eq!(compilation.diagnostics.len(), 1);
    assert!(compilation.symbols.get_variable("x").unwrap().ty == Type::Int);
    assert_eq!(compilation.diagnostics.iter().next().unwrap().line(), 1);
}

#[test]
fn test_assignability_between_classes() {
    let compilation = compile("class B { }\nclass A ext B { }");
    let symbols = &compilation.symbols;
    let named = |name: &str| Type::Named(name.to_string());

    assert!(symbols.is_assignable(&named("B"), &named("A")));
    assert!(!symbols.is_assignable(&named("A"), &named("B")));
    assert!(symbols.is_assignable(&named("A"), &named("A")));
}

#[test]
fn test_diagnostics_are_sorted_by_position() {
    let source = r#"
        fn main(): void {
            int a = "one";
            bool b = 1;
            c = 2;
        }
        class D { int x; int x; }
    "#;
    let compilation = compile(source);

    let lines: Vec<u32> = compilation.diagnostics.iter().map(|d| d.line()).collect();
    assert_eq!(lines, vec![3, 4, 5, 7]);
    assert_eq!(compilation.diagnostics.error_count(), 4);
}

#[test]
fn test_syntax_error_stops_compilation() {
    let error = compile_source("fn main(): void { int x = ; }", "main.knight", &Options::default()).unwrap_err();

    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
    assert_eq!(error.get_position().col, 27);
}

#[test]
fn test_lex_error_stops_compilation() {
    let error = compile_source("int x = 1 # 2;", "main.knight", &Options::default()).unwrap_err();
    assert_eq!(error.get_error_name(), "UnrecognisedToken");
}

#[test]
fn test_empty_source() {
    let compilation = compile("");
    assert!(compilation.programs[0].items.is_empty());
    assert!(compilation.diagnostics.is_empty());
}

#[test]
fn test_multiple_files_share_declarations() {
    let sources = vec![
        (
            String::from("shapes.knight"),
            String::from("class Circle { int r; fn area(): int { ret 3 * r * r; } }"),
        ),
        (
            String::from("main.knight"),
            String::from("fn main(): void {\n  Circle c = new Circle();\n  string s = c.area();\n}"),
        ),
    ];
    let compilation = compile_sources(&sources, &Options::default()).unwrap();

    assert_eq!(compilation.programs.len(), 2);
    assert_eq!(compilation.diagnostics.len(), 1);
    let diagnostic = compilation.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.position.file.as_str(), "main.knight");
    assert_eq!(diagnostic.line(), 3);
}

#[test]
fn test_warnings_option() {
    let source = "string s = \"n\" + 1;";

    let with_warnings = compile(source);
    assert_eq!(with_warnings.diagnostics.len(), 1);
    assert_eq!(
        with_warnings.diagnostics.iter().next().unwrap().severity,
        Severity::Warning
    );
    assert!(with_warnings.is_ready_for_codegen());

    let options = Options {
        warnings: false,
        ..Options::default()
    };
    let without = compile_source(source, "main.knight", &options).unwrap();
    assert!(without.diagnostics.is_empty());
}

#[test]
fn test_stop_after_errors_option() {
    let source = "class C { int x; int x; }\nint y = \"s\";";

    let full = compile(source);
    assert_eq!(full.diagnostics.len(), 2);

    let options = Options {
        continue_after_errors: false,
        ..Options::default()
    };
    let stopped = compile_source(source, "main.knight", &options).unwrap();
    assert_eq!(stopped.diagnostics.len(), 1);
    assert!(stopped.diagnostics.iter().next().unwrap().message.contains("already defined"));
}

#[test]
fn test_builtins_type_check() {
    let source = r#"
        fn main(): void {
            string line = read_line();
            int n = to_int(line);
            int r = random(0, n);
            print(to_string(r));
        }
    "#;
    let compilation = compile(source);
    assert!(compilation.diagnostics.is_empty(), "{}", compilation.diagnostics);
}
