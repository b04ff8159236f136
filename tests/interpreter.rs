#[cfg(test)]
mod interpreter_tests {
    use rox_interpreter as lox;

    use lox::ast::Stmt;
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        let (tokens, lex_errors) = Scanner::new(source).scan_all();
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

        let mut parser = Parser::new(tokens);
        let statements = parser.parse();
        assert!(parser.errors().is_empty(), "parse errors: {:?}", parser.errors());

        statements
    }

    /// Runs `source`, returning everything printed and the runtime error
    /// message (with its line), if any.
    fn run(source: &str) -> (String, Option<String>) {
        let statements = parse(source);
        let mut interpreter = Interpreter::with_output(Vec::new());

        Resolver::new(&mut interpreter)
            .resolve(&statements)
            .expect("resolves cleanly");

        let error = interpreter.interpret(&statements).err().map(|e| e.to_string());
        let output = String::from_utf8(interpreter.into_output()).expect("utf-8 output");

        (output, error)
    }

    fn output_of(source: &str) -> String {
        let (output, error) = run(source);
        assert_eq!(error, None, "unexpected runtime error, output so far: {}", output);
        output
    }

    fn error_of(source: &str) -> String {
        let (_, error) = run(source);
        error.expect("expected a runtime error")
    }

    #[test]
    fn test_shadowing() {
        assert_eq!(output_of("var a = 1; { var a = 2; print a; } print a;"), "2\n1\n");
    }

    #[test]
    fn test_closures_keep_independent_state() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    return i;
                }
                return count;
            }

            var c1 = makeCounter();
            var c2 = makeCounter();
            print c1();
            print c1();
            print c2();
            print c1();
        "#;

        assert_eq!(output_of(source), "1\n2\n1\n3\n");
    }

    #[test]
    fn test_closure_binds_to_scope_seen_at_declaration() {
        let source = r#"
            var a = "global";
            {
                fun show() {
                    print a;
                }
                show();
                var a = "block";
                show();
            }
        "#;

        assert_eq!(output_of(source), "global\nglobal\n");
    }

    #[test]
    fn test_closures_share_their_scope() {
        let source = r#"
            var get;
            var set;
            {
                var v = "before";
                fun g() { return v; }
                fun s(n) { v = n; }
                get = g;
                set = s;
            }
            set("after");
            print get();
        "#;

        assert_eq!(output_of(source), "after\n");
    }

    #[test]
    fn test_inheritance_and_super() {
        let source = r#"
            class A {
                method() { return "A " + this.name; }
                other() { return "only in A"; }
            }

            class B < A {
                method() { return "B then " + super.method(); }
            }

            var b = B();
            b.name = "bee";
            print b.method();
            print b.other();
        "#;

        assert_eq!(output_of(source), "B then A bee\nonly in A\n");
    }

    #[test]
    fn test_super_skips_the_dynamic_class() {
        let source = r#"
            class A { say() { return "A"; } }
            class B < A { say() { return "B"; } test() { return super.say(); } }
            class C < B { say() { return "C"; } }
            print C().test();
        "#;

        assert_eq!(output_of(source), "A\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class C { m() { return "method"; } }
            var c = C();
            print c.m();
            c.m = "field";
            print c.m;
        "#;

        assert_eq!(output_of(source), "method\nfield\n");
    }

    #[test]
    fn test_bound_method_keeps_this() {
        let source = r#"
            class P {
                init(n) { this.n = n; }
                get() { return this.n; }
            }
            var m = P(7).get;
            print m();
        "#;

        assert_eq!(output_of(source), "7\n");
    }

    #[test]
    fn test_initializer_always_yields_instance() {
        let source = r#"
            class C {
                init() {
                    this.x = 1;
                    return;
                }
            }
            var c = C();
            print c.x;
            print c.init();
            print c;
        "#;

        assert_eq!(output_of(source), "1\nC instance\nC instance\n");
    }

    #[test]
    fn test_class_arity_comes_from_inherited_init() {
        let source = r#"
            class A { init(a, b) { this.s = a + b; } }
            class B < A {}
            print B(1, 2).s;
            B(1);
        "#;

        let (output, error) = run(source);
        assert_eq!(output, "3\n");
        assert_eq!(error.as_deref(), Some("Expected 2 arguments but got 1.\n[line 5]"));
    }

    #[test]
    fn test_methods_can_name_their_class() {
        let source = r#"
            class Node { make() { return Node(); } }
            print Node().make();
            {
                class Base { hi() { return "hi"; } }
                class Derived < Base {}
                print Derived().hi();
            }
        "#;

        assert_eq!(output_of(source), "Node instance\nhi\n");
    }

    #[test]
    fn test_arity_mismatch_runs_no_body() {
        let (output, error) = run("fun f(a, b) { print \"body\"; }\nf(1);");

        assert_eq!(output, "");
        assert_eq!(error.as_deref(), Some("Expected 2 arguments but got 1.\n[line 2]"));
    }

    #[test]
    fn test_concatenation_typing() {
        assert_eq!(
            output_of("print \"a\" + 1; print 1 + \"a\"; print 1 + 2; print 2.5 + \"\"; print \"x\" + \"y\";"),
            "a1\n1a\n3\n2.5\nxy\n"
        );
        assert_eq!(
            error_of("print true + 1;"),
            "Operands must be number or string.\n[line 1]"
        );
    }

    #[test]
    fn test_arithmetic_and_number_display() {
        assert_eq!(
            output_of("print 10 % 3; print 7 / 2; print -0; print 1 / 0; print 0.1 + 0.2; print (1 + 2) * 3;"),
            "1\n3.5\n0\nInfinity\n0.30000000000000004\n9\n"
        );
    }

    #[test]
    fn test_number_display_edges() {
        let source = r#"
            print -1 / 0;
            print 0 / 0;
            print 100000000000000000000000;
            print -100000000000000000000000;
            print 100000000000000000000;
            print 0.0000001;
            print 0.000001;
            print "n=" + -0;
        "#;

        assert_eq!(
            output_of(source),
            "-Infinity\nNaN\n1e+23\n-1e+23\n100000000000000000000\n1e-7\n0.000001\nn=0\n"
        );
    }

    #[test]
    fn test_truthiness_and_short_circuit() {
        assert_eq!(
            output_of("print nil or \"x\"; print 0 and \"y\"; print !\"\"; print false and boom; print true or boom;"),
            "x\ny\nfalse\nfalse\ntrue\n"
        );
    }

    #[test]
    fn test_equality() {
        let source = r#"
            class K {}
            var k = K();
            print nil == nil;
            print nil == false;
            print "a" == "a";
            print 1 == "1";
            print K() == K();
            print k == k;
            print clock == clock;
            print 1 != 2;
        "#;

        assert_eq!(
            output_of(source),
            "true\nfalse\ntrue\nfalse\nfalse\ntrue\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_callable_display() {
        assert_eq!(
            output_of("fun f() {} class K {} print f; print K; print K(); print clock; print f();"),
            "<fn f>\nK\nK instance\n<native fn clock>\nnil\n"
        );
    }

    #[test]
    fn test_natives() {
        assert_eq!(output_of("print reverse(\"abc\"); var t = clock(); print t >= 0 and t < 1;"), "cba\ntrue\n");
        assert_eq!(error_of("reverse(1);"), "Argument must be a string.\n[line 1]");
        assert_eq!(error_of("clock(1);"), "Expected 0 arguments but got 1.\n[line 1]");
    }

    #[test]
    fn test_control_flow() {
        let source = r#"
            var sum = 0;
            for (var i = 1; i <= 4; i = i + 1) sum = sum + i;
            print sum;

            var n = 3;
            while (n > 0) n = n - 1;
            print n;

            fun find() {
                for (var i = 0; i < 10; i = i + 1) {
                    if (i == 3) return i;
                }
                return -1;
            }
            print find();

            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(10);

            if (nil) print "no"; else print "yes";
        "#;

        assert_eq!(output_of(source), "10\n0\n3\n55\nyes\n");
    }

    #[test]
    fn test_assignment_yields_value() {
        assert_eq!(output_of("var a; var b; a = b = 3; print a; print b;"), "3\n3\n");
    }

    #[test]
    fn test_runtime_errors() {
        assert_eq!(error_of("print -\"a\";"), "Operand must be a number.\n[line 1]");
        assert_eq!(error_of("print 1 < \"a\";"), "Operands must be numbers.\n[line 1]");
        assert_eq!(error_of("print 4 % nil;"), "Operands must be numbers.\n[line 1]");
        assert_eq!(
            error_of("print undefinedVar;"),
            "Undefined variable 'undefinedVar'.\n[line 1]"
        );
        assert_eq!(error_of("missing = 1;"), "Undefined variable 'missing'.\n[line 1]");
        assert_eq!(
            error_of("\"str\"();"),
            "Can only call functions and classes.\n[line 1]"
        );
        assert_eq!(
            error_of("var x = 1; print x.y;"),
            "Only instances have properties.\n[line 1]"
        );
        assert_eq!(
            error_of("var x = 1; x.y = 2;"),
            "Only instances have fields.\n[line 1]"
        );
        assert_eq!(
            error_of("class K {} print K().nope;"),
            "Undefined property 'nope'.\n[line 1]"
        );
        assert_eq!(
            error_of("var NotClass = 1; class K < NotClass {}"),
            "Superclass must be a class.\n[line 1]"
        );
    }

    #[test]
    fn test_runtime_error_halts_program() {
        let (output, error) = run("print 1;\nprint nil + 1;\nprint 2;");

        assert_eq!(output, "1\n");
        assert_eq!(error.as_deref(), Some("Operands must be number or string.\n[line 2]"));
    }

    #[test]
    fn test_repl_execute_echoes_expressions() {
        let mut interpreter = Interpreter::with_output(Vec::<u8>::new());

        for stmt in parse("var a = 2; a * 3; print \"x\"; a;") {
            Resolver::new(&mut interpreter)
                .resolve(std::slice::from_ref(&stmt))
                .expect("resolves cleanly");
            interpreter.repl_execute(&stmt).expect("runs");
        }

        assert_eq!(interpreter.output().as_slice(), b"6\nx\n2\n");
    }
}
