use crate::runtime::object::Object;
use std::collections::HashMap;
use std::sync::OnceLock;

pub type BuiltinHandler = fn(&[Object]) -> Object;

static REGISTRY: OnceLock<BuiltinRegistry> = OnceLock::new();

pub fn get_registry() -> &'static BuiltinRegistry {
    REGISTRY.get_or_init(BuiltinRegistry::new)
}

/// A host function callable from the language
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub description: &'static str,
    pub signature: &'static str, // e.g. "push(array, value) -> ARRAY"
    pub handler: BuiltinHandler,
}

impl Builtin {
    pub fn call(&self, args: &[Object]) -> Object {
        (self.handler)(args)
    }
}

pub struct DocItem {
    pub name: &'static str,
    pub description: &'static str,
    pub signature: &'static str,
}

pub struct BuiltinRegistry {
    functions: HashMap<&'static str, Builtin>,
}

impl BuiltinRegistry {
    fn new() -> Self {
        let mut registry = BuiltinRegistry {
            functions: HashMap::new(),
        };
        registry.register_all();
        registry
    }

    fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        signature: &'static str,
        handler: BuiltinHandler,
    ) {
        self.functions.insert(
            name,
            Builtin {
                name,
                description,
                signature,
                handler,
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&Builtin> {
        self.functions.get(name)
    }

    pub fn get_documentation(&self) -> Vec<DocItem> {
        let mut docs: Vec<DocItem> = self
            .functions
            .values()
            .map(|f| DocItem {
                name: f.name,
                description: f.description,
                signature: f.signature,
            })
            .collect();

        docs.sort_by(|a, b| a.name.cmp(b.name));
        docs
    }

    fn register_all(&mut self) {
        self.register(
            "len",
            "Returns the number of characters in a string or elements in an array.",
            "len(value: STRING | ARRAY) -> INTEGER",
            |args| {
                if let Some(err) = check_arity(args, 1) {
                    return err;
                }
                match &args[0] {
                    Object::String(s) => Object::Integer(s.chars().count() as i64),
                    Object::Array(elements) => Object::Integer(elements.len() as i64),
                    other => Object::Error(format!(
                        "argument to `len` not supported, got {}",
                        other.type_name()
                    )),
                }
            },
        );

        self.register(
            "first",
            "Returns the first element of an array, or null when it is empty.",
            "first(array: ARRAY) -> VALUE",
            |args| {
                if let Some(err) = check_arity(args, 1) {
                    return err;
                }
                match &args[0] {
                    Object::Array(elements) => elements.first().cloned().unwrap_or(Object::NULL),
                    other => must_be_array("first", other),
                }
            },
        );

        self.register(
            "last",
            "Returns the last element of an array, or null when it is empty.",
            "last(array: ARRAY) -> VALUE",
            |args| {
                if let Some(err) = check_arity(args, 1) {
                    return err;
                }
                match &args[0] {
                    Object::Array(elements) => elements.last().cloned().unwrap_or(Object::NULL),
                    other => must_be_array("last", other),
                }
            },
        );

        self.register(
            "rest",
            "Returns a new array without the first element, or null when it is empty.",
            "rest(array: ARRAY) -> ARRAY",
            |args| {
                if let Some(err) = check_arity(args, 1) {
                    return err;
                }
                match &args[0] {
                    Object::Array(elements) if elements.is_empty() => Object::NULL,
                    Object::Array(elements) => Object::Array(elements[1..].to_vec()),
                    other => must_be_array("rest", other),
                }
            },
        );

        self.register(
            "push",
            "Returns a new array with the value appended. The original is unchanged.",
            "push(array: ARRAY, value) -> ARRAY",
            |args| {
                if let Some(err) = check_arity(args, 2) {
                    return err;
                }
                match &args[0] {
                    Object::Array(elements) => {
                        let mut pushed = Vec::with_capacity(elements.len() + 1);
                        pushed.extend_from_slice(elements);
                        pushed.push(args[1].clone());
                        Object::Array(pushed)
                    }
                    other => must_be_array("push", other),
                }
            },
        );
    }
}

fn check_arity(args: &[Object], want: usize) -> Option<Object> {
    if args.len() == want {
        None
    } else {
        Some(Object::Error(format!(
            "wrong number of arguments. got={}, want={}",
            args.len(),
            want
        )))
    }
}

fn must_be_array(name: &str, got: &Object) -> Object {
    Object::Error(format!(
        "argument to `{}` must be ARRAY, got {}",
        name,
        got.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Object>) -> Object {
        match get_registry().lookup(name) {
            Some(builtin) => builtin.call(&args),
            None => panic!("builtin {} not registered", name),
        }
    }

    fn ints(values: &[i64]) -> Object {
        Object::Array(values.iter().map(|v| Object::Integer(*v)).collect())
    }

    #[test]
    fn test_len() {
        assert_eq!(call("len", vec![Object::String("four".into())]), Object::Integer(4));
        assert_eq!(call("len", vec![Object::String(String::new())]), Object::Integer(0));
        assert_eq!(call("len", vec![ints(&[1, 2, 3])]), Object::Integer(3));
        assert_eq!(
            call("len", vec![Object::Integer(1)]),
            Object::Error("argument to `len` not supported, got INTEGER".into())
        );
        assert_eq!(
            call("len", vec![Object::String("a".into()), Object::String("b".into())]),
            Object::Error("wrong number of arguments. got=2, want=1".into())
        );
    }

    #[test]
    fn test_array_accessors() {
        assert_eq!(call("first", vec![ints(&[1, 2, 3])]), Object::Integer(1));
        assert_eq!(call("last", vec![ints(&[1, 2, 3])]), Object::Integer(3));
        assert_eq!(call("rest", vec![ints(&[1, 2, 3])]), ints(&[2, 3]));
        assert_eq!(call("first", vec![ints(&[])]), Object::NULL);
        assert_eq!(call("last", vec![ints(&[])]), Object::NULL);
        assert_eq!(call("rest", vec![ints(&[])]), Object::NULL);
        assert_eq!(
            call("first", vec![Object::TRUE]),
            Object::Error("argument to `first` must be ARRAY, got BOOLEAN".into())
        );
    }

    #[test]
    fn test_push_leaves_original() {
        let original = ints(&[1]);
        let pushed = call("push", vec![original.clone(), Object::Integer(2)]);

        assert_eq!(pushed, ints(&[1, 2]));
        assert_eq!(original, ints(&[1]));
        assert_eq!(
            call("push", vec![Object::Integer(1), Object::Integer(2)]),
            Object::Error("argument to `push` must be ARRAY, got INTEGER".into())
        );
    }

    #[test]
    fn test_documentation_is_sorted() {
        let names: Vec<&str> = get_registry()
            .get_documentation()
            .iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["first", "last", "len", "push", "rest"]);
    }

    #[test]
    fn test_no_io_builtins() {
        assert!(get_registry().lookup("puts").is_none());
    }
}
