//! Unit tests for the name resolver.

use super::resolver::{resolve, NameResolver};
use crate::{
    ast::{
        ast::{FunctionDecl, Item, Program},
        expressions::{Expr, ExprKind},
        statements::StmtKind,
    },
    errors::diagnostics::Diagnostics,
    parse_source,
    symbols::{binding::Binding, builder::build, scope::ScopeKind},
    PassState,
};

fn resolve_source(source: &str) -> (Program, Diagnostics) {
    let mut program = parse_source(source, "test.knight").unwrap();
    let (symbols, _) = build(&program);
    let diagnostics = resolve(&mut program, &symbols);
    (program, diagnostics)
}

fn messages(diagnostics: &Diagnostics) -> Vec<String> {
    diagnostics.iter().map(|d| d.message.clone()).collect()
}

/// A free function or a method, by name.
fn function<'a>(program: &'a Program, name: &str) -> &'a FunctionDecl {
    program
        .items
        .iter()
        .find_map(|item| match item {
            Item::Function(function) if function.name == name => Some(function),
            Item::Class(class) => class.methods.iter().find(|method| method.name == name),
            _ => None,
        })
        .unwrap()
}

fn init_of(function: &FunctionDecl, index: usize) -> &Expr {
    match &function.body[index].kind {
        StmtKind::VarDecl(var) => var.init.as_ref().unwrap(),
        other => panic!("expected a declaration, got {:?}", other),
    }
}

fn binding_of(expr: &Expr) -> &Binding {
    match &expr.kind {
        ExprKind::Identifier(identifier) => identifier.binding.as_ref().unwrap(),
        other => panic!("expected an identifier, got {:?}", other),
    }
}

#[test]
fn test_binds_each_kind_of_name() {
    let source = r#"
        int g = 1;
        class P {
            int x;
            fn get(int d): int {
                int y = d;
                ret x + y + g;
            }
        }
    "#;
    let (program, diagnostics) = resolve_source(source);
    assert!(diagnostics.is_empty(), "{}", diagnostics);

    let get = function(&program, "get");
    assert!(matches!(binding_of(init_of(get, 0)), Binding::Parameter(v) if v.name == "d"));

    let value = get.ret.as_ref().unwrap().value.as_ref().unwrap();
    let ExprKind::Binary { lhs, rhs, .. } = &value.kind else {
        panic!("expected a binary expression");
    };
    assert!(matches!(binding_of(rhs), Binding::Global(v) if v.name == "g"));

    let ExprKind::Binary { lhs: x, rhs: y, .. } = &lhs.kind else {
        panic!("expected a binary expression");
    };
    assert!(matches!(binding_of(x), Binding::Field { class, .. } if class == "P"));
    assert!(matches!(binding_of(y), Binding::Local(v) if v.lv_index == Some(1)));
}

#[test]
fn test_undefined_variable() {
    let (_, diagnostics) = resolve_source("fn f(): void {\n  int a = b;\n}");

    assert_eq!(messages(&diagnostics), vec!["Undefined variable 'b'"]);
    let diagnostic = diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.line(), 2);
    assert_eq!(diagnostic.col(), 11);
}

#[test]
fn test_initializer_cannot_see_its_own_variable() {
    let (_, diagnostics) = resolve_source("fn f(): void { int a = a; }");
    assert_eq!(messages(&diagnostics), vec!["Undefined variable 'a'"]);
}

#[test]
fn test_undefined_members_and_functions() {
    let source = r#"
        class P { int x; fn get(): int { ret x; } }
        fn main(): void {
            P p = new P();
            int a = p.nope();
            int b = p.y;
            foo();
        }
    "#;
    let (_, diagnostics) = resolve_source(source);

    assert_eq!(
        messages(&diagnostics),
        vec![
            "Undefined method 'nope' in class 'P'",
            "Undefined field 'y' in class 'P'",
            "Undefined function 'foo'"
        ]
    );
}

#[test]
fn test_inherited_method_binding() {
    let source = r#"
        class Base { fn get(): int { ret 1; } }
        class Derived ext Base { }
        fn main(): void {
            Derived d = new Derived();
            int v = d.get();
        }
    "#;
    let (program, diagnostics) = resolve_source(source);
    assert!(diagnostics.is_empty(), "{}", diagnostics);

    let main = function(&program, "main");
    let ExprKind::Call(call) = &init_of(main, 1).kind else {
        panic!("expected a call");
    };
    assert!(matches!(
        call.name.binding.as_ref().unwrap(),
        Binding::Function { class: Some(class), .. } if class == "Base"
    ));
}

#[test]
fn test_interface_method_binding() {
    let source = r#"
        interface Shape { fn area(): int; }
        class Square use Shape { fn area(): int { ret 4; } }
        fn measure(Shape s): int { ret s.area(); }
    "#;
    let (program, diagnostics) = resolve_source(source);
    assert!(diagnostics.is_empty(), "{}", diagnostics);

    let measure = function(&program, "measure");
    let value = measure.ret.as_ref().unwrap().value.as_ref().unwrap();
    let ExprKind::Call(call) = &value.kind else {
        panic!("expected a call");
    };
    assert!(matches!(
        call.name.binding.as_ref().unwrap(),
        Binding::Function { class: Some(owner), .. } if owner == "Shape"
    ));
}

#[test]
fn test_unknown_types_and_parents() {
    let source = "Foo f;\nclass A ext Nope use Missing { }";
    let (_, diagnostics) = resolve_source(source);

    assert_eq!(
        messages(&diagnostics),
        vec![
            "Unknown type 'Foo'",
            "Undefined class 'Nope'",
            "Undefined interface 'Missing'"
        ]
    );
}

#[test]
fn test_instantiation_errors() {
    let source = r#"
        interface Shape { }
        fn main(): void {
            Shape s = new Shape();
            Shape t = new Ghost();
        }
    "#;
    let (_, diagnostics) = resolve_source(source);

    assert_eq!(
        messages(&diagnostics),
        vec![
            "Cannot instantiate interface 'Shape'",
            "Cannot instantiate undefined class 'Ghost'"
        ]
    );
}

#[test]
fn test_method_call_on_primitive() {
    let (_, diagnostics) = resolve_source("fn f(): void { int n = 1; n.foo(); }");
    assert_eq!(
        messages(&diagnostics),
        vec!["Cannot call method 'foo' on a value of type int"]
    );
}

#[test]
fn test_unresolved_receiver_reports_once() {
    let (_, diagnostics) = resolve_source("fn f(): void { x.get(); }");
    assert_eq!(messages(&diagnostics), vec!["Undefined variable 'x'"]);
}

#[test]
fn test_loop_variable_is_scoped_to_the_loop() {
    let source = r#"
        fn f(): void {
            for (int i = 0; i < 3; i = i + 1) { print(to_string(i)); }
            int j = i;
        }
    "#;
    let (_, diagnostics) = resolve_source(source);
    assert_eq!(messages(&diagnostics), vec!["Undefined variable 'i'"]);
}

#[test]
fn test_scope_arena_is_recorded() {
    let source = "fn f(int a): void { int b = a; { int b = 2; int c = b; } }";
    let (program, diagnostics) = resolve_source(source);
    assert!(diagnostics.is_empty(), "{}", diagnostics);

    let f = function(&program, "f");
    let params = f.scope.unwrap();
    let body = f.body_scope.unwrap();
    assert_eq!(program.scope(params).kind, ScopeKind::Parameters);
    assert!(program.scope(params).variables.contains_key("a"));
    assert_eq!(program.scope(body).parent, Some(params));
    assert!(program.scope(body).variables.contains_key("b"));

    let StmtKind::Block(block) = &f.body[1].kind else {
        panic!("expected a block");
    };
    let inner = block.scope.unwrap();
    assert_eq!(program.scope(inner).parent, Some(body));

    let StmtKind::VarDecl(c) = &block.stmts[1].kind else {
        panic!("expected a declaration");
    };
    let Binding::Local(shadow) = binding_of(c.init.as_ref().unwrap()) else {
        panic!("expected a local");
    };
    assert_eq!(shadow.lv_index, Some(2));
}

#[test]
fn test_resolver_state() {
    let mut program = parse_source("fn f(): void { g(); }", "test.knight").unwrap();
    let (symbols, _) = build(&program);

    let mut resolver = NameResolver::new(&symbols);
    assert_eq!(resolver.state(), PassState::NotStarted);
    let diagnostics = resolver.resolve_program(&mut program);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(resolver.state(), PassState::CompletedWithDiagnostics);
}

#[test]
fn test_field_assignment_binds_the_field() {
    let source = r#"
        class Base { int x; }
        class P ext Base { }
        fn main(): void {
            P p = new P();
            p.x = 1;
            p.y = 2;
        }
    "#;
    let (program, diagnostics) = resolve_source(source);

    assert_eq!(messages(&diagnostics), vec!["Undefined field 'y' in class 'P'"]);

    let StmtKind::FieldAssign { field, .. } = &function(&program, "main").body[1].kind else {
        panic!("expected a field assignment");
    };
    assert!(matches!(
        field.binding.as_ref().unwrap(),
        Binding::Field { class, .. } if class == "Base"
    ));
}
