#[cfg(test)]
mod parser_tests {
    use rox_interpreter as lox;

    use lox::ast::{Expr, Stmt};
    use lox::ast_printer::AstPrinter;
    use lox::error::LoxError;
    use lox::parser::Parser;
    use lox::scanner::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let (tokens, lex_errors) = Scanner::new(source).scan_all();
        assert!(lex_errors.is_empty(), "unexpected lex errors: {:?}", lex_errors);

        let mut parser = Parser::new(tokens);
        let statements = parser.parse();

        (statements, parser.take_errors())
    }

    fn printed(source: &str) -> Vec<String> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);

        let printer = AstPrinter;
        statements.iter().map(|s| printer.print_stmt(s)).collect()
    }

    fn messages(errors: &[LoxError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            printed("1 + 2 * 3 - -4;"),
            vec!["(; (- (+ 1.0 (* 2.0 3.0)) (- 4.0)))"]
        );
        assert_eq!(printed("8 % 3 * 2;"), vec!["(; (* (% 8.0 3.0) 2.0))"]);
        assert_eq!(
            printed("1 < 2 == 3 >= 4;"),
            vec!["(; (== (< 1.0 2.0) (>= 3.0 4.0)))"]
        );
    }

    #[test]
    fn test_logical_and_grouping() {
        assert_eq!(
            printed("!(a or b) and c == 1;"),
            vec!["(; (and (! (group (or a b))) (== c 1.0)))"]
        );
        assert_eq!(printed("a or b and c;"), vec!["(; (or a (and b c)))"]);
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(printed("a = b = \"x\";"), vec!["(; (= a (= b x)))"]);
        assert_eq!(printed("a.b.c = 1;"), vec!["(; (= (. (. a b) c) 1.0))"]);
    }

    #[test]
    fn test_statements() {
        assert_eq!(
            printed("var a; var b = nil; { print a; } if (a) print 1; else print 2; while (false) b;"),
            vec![
                "(var a)",
                "(var b = nil)",
                "(block (print a))",
                "(if-else a (print 1.0) (print 2.0))",
                "(while false (; b))",
            ]
        );
    }

    #[test]
    fn test_for_desugars_to_while() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["(block (var i = 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
        );
        assert_eq!(printed("for (;;) print 1;"), vec!["(while true (print 1.0))"]);
    }

    #[test]
    fn test_functions_and_classes() {
        assert_eq!(
            printed("fun add(a, b) { return a + b; } fun nop() { return; }"),
            vec!["(fun add(a b) (return (+ a b)))", "(fun nop() (return))"]
        );

        assert_eq!(
            printed("class B < A { init(x) { this.x = x; } get() { return super.get(); } }"),
            vec!["(class B < A (method init(x) (; (= (. this x) x))) (method get() (return (call (super get)))))"]
        );

        assert_eq!(printed("f(1)(2, 3).g;"), vec!["(; (. (call (call f 1.0) 2.0 3.0) g))"]);
    }

    #[test]
    fn test_invalid_assignment_target_is_not_fatal() {
        let (statements, errors) = parse("1 = 2; print 3;");

        assert_eq!(statements.len(), 2);
        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_synchronize_reports_every_error() {
        let (statements, errors) = parse("var = 1; print 2; fun (; print 3;");

        assert_eq!(
            messages(&errors),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 1] Error at '(': Expect function name.",
            ]
        );

        // only the good declarations survive
        let printer = AstPrinter;
        let printed: Vec<String> = statements.iter().map(|s| printer.print_stmt(s)).collect();
        assert_eq!(printed, vec!["(print 2.0)", "(print 3.0)"]);
    }

    #[test]
    fn test_error_locations() {
        let (_, errors) = parse("print 1;\nprint ;");
        assert_eq!(messages(&errors), vec!["[line 2] Error at ';': Expect expression."]);

        let (_, errors) = parse("print 1");
        assert_eq!(messages(&errors), vec!["[line 1] Error at end: Expect ';' after value."]);

        let (_, errors) = parse("class { }");
        assert_eq!(messages(&errors), vec!["[line 1] Error at '{': Expect class name."]);
    }

    #[test]
    fn test_arity_cap() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let (statements, errors) = parse(&format!("fun f({}) {{}}", params.join(", ")));

        assert_eq!(statements.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Can't have more than 255 parameters.");

        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let (statements, errors) = parse(&format!("f({});", args.join(", ")));

        assert_eq!(statements.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Can't have more than 255 arguments.");

        let args: Vec<String> = (0..255).map(|i| i.to_string()).collect();
        let (_, errors) = parse(&format!("f({});", args.join(", ")));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_expression_ids_are_unique() {
        let (tokens, _) = Scanner::new("a = b;").scan_all();
        let mut parser = Parser::with_first_id(tokens, 10);
        let statements = parser.parse();

        let Stmt::Expression(Expr::Assign { id, value, .. }) = &statements[0] else {
            panic!("expected an assignment, got {:?}", statements[0]);
        };
        let Expr::Variable { id: value_id, .. } = value.as_ref() else {
            panic!("expected a variable, got {:?}", value);
        };

        assert_ne!(id, value_id);
        assert!(id.0 >= 10 && value_id.0 >= 10);
        assert_eq!(parser.next_id(), 13);
    }

    #[test]
    fn test_parse_one_declaration() {
        let (tokens, _) = Scanner::new("var a = 1; print a;").scan_all();
        let mut parser = Parser::new(tokens);

        assert!(matches!(parser.parse_one_declaration(), Some(Stmt::Var { .. })));
        assert!(matches!(parser.parse_one_declaration(), Some(Stmt::Print(_))));
        assert!(parser.is_at_end());
        assert!(parser.parse_one_declaration().is_none());
    }

    #[test]
    fn test_missing_eof_is_supplied() {
        let mut parser = Parser::new(Vec::new());

        assert!(parser.parse().is_empty());
        assert!(parser.errors().is_empty());
    }
}
