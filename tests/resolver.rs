#[cfg(test)]
mod resolver_tests {
    use rox_interpreter as lox;

    use lox::ast::ExprId;
    use lox::error::LoxError;
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;

    fn resolve_with(interpreter: &mut Interpreter<Vec<u8>>, source: &str) -> Result<(), Vec<LoxError>> {
        let (tokens, lex_errors) = Scanner::new(source).scan_all();
        assert!(lex_errors.is_empty());

        let mut parser = Parser::new(tokens);
        let statements = parser.parse();
        assert!(parser.errors().is_empty(), "parse errors: {:?}", parser.errors());

        Resolver::new(interpreter).resolve(&statements)
    }

    fn resolve(source: &str) -> Result<(), Vec<LoxError>> {
        let mut interpreter = Interpreter::with_output(Vec::new());
        resolve_with(&mut interpreter, source)
    }

    fn static_errors(source: &str) -> Vec<String> {
        match resolve(source) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Distance recorded for the single variable-like node in `source`.
    fn depth_of_first(source: &str) -> Option<usize> {
        let mut interpreter = Interpreter::with_output(Vec::new());
        resolve_with(&mut interpreter, source).expect("resolves cleanly");
        interpreter.resolved_depth(ExprId(0))
    }

    #[test]
    fn test_duplicate_local_declaration() {
        assert_eq!(
            static_errors("{ var x = 1; var x = 2; }"),
            vec!["[line 1] Error at 'x': Already a variable with this name in this scope."]
        );
        assert_eq!(
            static_errors("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_global_redeclaration_and_shadowing_are_allowed() {
        assert!(resolve("var x = 1; var x = 2;").is_ok());
        assert!(resolve("var x = 1; { var x = 2; { var x = 3; } }").is_ok());
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            static_errors("{ var a = 1; { var a = a; } }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
        // globals are looked up at run time
        assert!(resolve("var a = a;").is_ok());
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        assert_eq!(
            static_errors("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_return_rules() {
        assert_eq!(
            static_errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
        assert_eq!(
            static_errors("class C { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
        assert!(resolve("class C { init() { return; } m() { return 1; } }").is_ok());
        assert!(resolve("fun f() { return 1; }").is_ok());
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            static_errors("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            static_errors("fun f() { return this; }"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_super_rules() {
        assert_eq!(
            static_errors("print super.x;"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
        assert_eq!(
            static_errors("class A { f() { super.f(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
        assert!(resolve("class A { f() {} } class B < A { f() { super.f(); } }").is_ok());
    }

    #[test]
    fn test_errors_accumulate() {
        let errors = static_errors("return;\n{ var a; var a; }\nprint this;");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at 'return': Can't return from top-level code.",
                "[line 2] Error at 'a': Already a variable with this name in this scope.",
                "[line 3] Error at 'this': Can't use 'this' outside of a class.",
            ]
        );
    }

    #[test]
    fn test_recorded_distances() {
        assert_eq!(depth_of_first("var g; print g;"), None);
        assert_eq!(depth_of_first("{ var a = 1; { print a; } }"), Some(1));
        assert_eq!(depth_of_first("fun f(x) { return x; }"), Some(0));
        assert_eq!(depth_of_first("fun outer() { var x; fun inner() { return x; } }"), Some(1));
        // params scope, then the `this` scope
        assert_eq!(depth_of_first("class A { m() { return this; } }"), Some(1));
    }

    #[test]
    fn test_super_distance() {
        let mut interpreter = Interpreter::with_output(Vec::new());
        resolve_with(
            &mut interpreter,
            "class A {} class B < A { m() { return super.m; } }",
        )
        .expect("resolves cleanly");

        // ExprId(0) is the global superclass reference, ExprId(1) the `super`
        assert_eq!(interpreter.resolved_depth(ExprId(0)), None);
        assert_eq!(interpreter.resolved_depth(ExprId(1)), Some(2));
    }
}
