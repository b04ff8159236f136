#[cfg(test)]
mod session_tests {
    use rox_interpreter as lox;

    use lox::session::{Session, EXIT_RUNTIME_ERROR, EXIT_STATIC_ERROR};

    fn session() -> Session<Vec<u8>> {
        Session::with_output(Vec::new())
    }

    fn printed(session: &Session<Vec<u8>>) -> String {
        String::from_utf8_lossy(session.output()).into_owned()
    }

    #[test]
    fn test_clean_run_exits_zero() {
        let mut session = session();
        let report = session.run("print 1 + 2;");

        assert!(report.is_ok());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(printed(&session), "3\n");
    }

    #[test]
    fn test_syntax_error_prevents_execution() {
        let mut session = session();
        let report = session.run("print \"before\";\nprint ;");

        assert!(report.had_error());
        assert!(!report.had_runtime_error());
        assert_eq!(report.exit_code(), EXIT_STATIC_ERROR);
        assert_eq!(printed(&session), "");
    }

    #[test]
    fn test_lex_error_is_static() {
        let mut session = session();
        let report = session.run("print 1; @");

        assert_eq!(report.exit_code(), EXIT_STATIC_ERROR);
        assert_eq!(
            report.static_errors[0].to_string(),
            "[line 1] Error: Unexpected character: @"
        );
        assert_eq!(printed(&session), "");
    }

    #[test]
    fn test_resolution_errors_prevent_execution() {
        let mut session = session();
        let report = session.run("print \"side effect\"; class A < A {}");

        assert_eq!(report.exit_code(), EXIT_STATIC_ERROR);
        assert_eq!(printed(&session), "");

        let report = session.run("print \"side effect\"; { var x = 1; var x = 2; }");

        assert_eq!(report.exit_code(), EXIT_STATIC_ERROR);
        assert_eq!(printed(&session), "");
    }

    #[test]
    fn test_runtime_error_exit_code() {
        let mut session = session();
        let report = session.run("print \"ok\";\nprint -nil;\nprint \"never\";");

        assert!(!report.had_error());
        assert!(report.had_runtime_error());
        assert_eq!(report.exit_code(), EXIT_RUNTIME_ERROR);
        assert_eq!(printed(&session), "ok\n");

        let messages: Vec<String> = report.errors().map(|e| e.to_string()).collect();
        assert_eq!(messages, vec!["Operand must be a number.\n[line 2]"]);
    }

    #[test]
    fn test_repl_echoes_and_persists() {
        let mut session = session();

        assert!(session.run_repl_line("var a = 40;").is_ok());
        assert!(session.run_repl_line("fun inc(x) { return x + 1; }").is_ok());
        assert!(session.run_repl_line("inc(a) + 1;").is_ok());
        assert!(session.run_repl_line("print a; a = 1;").is_ok());

        assert_eq!(printed(&session), "42\n40\n1\n");
    }

    #[test]
    fn test_repl_closures_survive_their_line() {
        let mut session = session();

        session.run_repl_line("fun make() { var n = 0; fun next() { n = n + 1; return n; } return next; }");
        session.run_repl_line("var counter = make();");
        session.run_repl_line("counter();");
        session.run_repl_line("counter();");

        assert_eq!(printed(&session), "1\n2\n");
    }

    #[test]
    fn test_repl_errors_do_not_end_session() {
        let mut session = session();

        let report = session.run_repl_line("var x = 1; print nope; var y = 2;");
        assert_eq!(report.exit_code(), EXIT_RUNTIME_ERROR);

        let report = session.run_repl_line("print ;");
        assert_eq!(report.exit_code(), EXIT_STATIC_ERROR);

        let report = session.run_repl_line("return 1;");
        assert_eq!(report.exit_code(), EXIT_STATIC_ERROR);

        // declarations before the failure stuck, the one after never ran
        let report = session.run_repl_line("print x;");
        assert!(report.is_ok());
        let report = session.run_repl_line("print y;");
        assert_eq!(report.exit_code(), EXIT_RUNTIME_ERROR);

        assert_eq!(printed(&session), "1\n");
    }

    #[test]
    fn test_runs_share_globals() {
        let mut session = session();

        assert!(session.run("class Greeter { hi() { return \"hi\"; } }").is_ok());
        assert!(session.run("var g = Greeter(); print g.hi();").is_ok());

        assert_eq!(printed(&session), "hi\n");
    }
}
