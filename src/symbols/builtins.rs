use lazy_static::lazy_static;

use crate::ast::types::Type;

/// A function every program can call without declaring it.
pub struct Builtin {
    pub name: &'static str,
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

lazy_static! {
    pub static ref BUILTINS: Vec<Builtin> = vec![
        Builtin { name: "print", parameters: vec![Type::Str], return_type: Type::Void },
        Builtin { name: "read_line", parameters: vec![], return_type: Type::Str },
        Builtin { name: "random", parameters: vec![Type::Int, Type::Int], return_type: Type::Int },
        Builtin { name: "to_int", parameters: vec![Type::Str], return_type: Type::Int },
        Builtin { name: "to_string", parameters: vec![Type::Int], return_type: Type::Str },
    ];
}
