use std::collections::HashMap;

use crate::ast::Type;

/// A stack of lexical frames mapping names to resolved types. Simpler
/// than a full environment with mutability tracking since every
/// binding here is checked once, in source order, against an AST that
/// already carries its own type annotation slots.
#[derive(Debug, Default)]
pub struct Scope {
    frames: Vec<HashMap<String, Type>>,
}

impl Scope {
    pub fn new() -> Self {
        Scope {
            frames: vec![HashMap::new()],
        }
    }

    pub fn enter(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn exit(&mut self) {
        self.frames.pop();
    }

    pub fn bind(&mut self, name: impl Into<String>, ty: Type) {
        self.frames
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.into(), ty);
    }

    pub fn lookup(&self, name: &str) -> Option<Type> {
        self.frames.iter().rev().find_map(|f| f.get(name).cloned())
    }
}
